//! Rewrites ESTree-shaped syntax trees into a flat normal form: every
//! expression is at most one operation deep, side-effecting subexpressions
//! are named by fresh temporaries, loops are unified to `while`, `switch`
//! becomes chained `if`s, `with` bodies become `in`-test cascades, and every
//! global access goes through the reserved `__global` binding introduced by
//! the program wrapper.
//!
//! The output is still a tree in the same surface grammar, so it can be
//! printed and reparsed; it is more verbose than the input but much easier
//! for downstream analyses to reason about.

pub mod ast;
pub mod builder;
pub mod cflow;
pub mod error;
pub mod hoist;
pub mod normalize;
pub mod options;
pub mod printer;
pub mod scope;

pub use error::{NormalizeError, NormalizeResult};
pub use normalize::{is_tmp, normalize_function, normalize_program, GLOBAL};
pub use options::Options;
pub use printer::{print_function, print_program, print_statements};
