use bitflags::bitflags;

bitflags! {
    /// Normalization options. Canonicalize before use; compatibility mode
    /// overrides the other flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Options: u8 {
        /// Emit output palatable to older consumers: no reference-error
        /// guards, no unified returns, unfolded two-armed ifs, padded
        /// empty blocks, and hoisted functions keep their names.
        const BACKWARDS_COMPATIBLE = 1 << 0;
        /// Guard reads of undeclared globals with an `in` test and throw a
        /// `ReferenceError` when the name is absent.
        const REFERENCE_ERRORS = 1 << 1;
        /// Collapse all returns into a single labeled break plus one final
        /// return from one variable.
        const UNIFY_RET = 1 << 2;
        /// Split every two-armed `if` with non-empty arms into two
        /// one-armed `if`s sharing a captured test value.
        const UNFOLD_IFS = 1 << 3;
    }
}

impl Options {
    /// Apply the compatibility-mode overrides. Unknown bits pass through.
    pub fn canonicalize(self) -> Options {
        if self.contains(Options::BACKWARDS_COMPATIBLE) {
            (self | Options::UNFOLD_IFS) - Options::REFERENCE_ERRORS - Options::UNIFY_RET
        } else {
            self
        }
    }

    pub fn backwards_compatible(&self) -> bool {
        self.contains(Options::BACKWARDS_COMPATIBLE)
    }

    pub fn reference_errors(&self) -> bool {
        self.contains(Options::REFERENCE_ERRORS)
    }

    pub fn unify_ret(&self) -> bool {
        self.contains(Options::UNIFY_RET)
    }

    pub fn unfold_ifs(&self) -> bool {
        self.contains(Options::UNFOLD_IFS)
    }
}
