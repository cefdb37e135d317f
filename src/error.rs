use std::error::Error;
use std::fmt;

#[derive(Debug, PartialEq)]
pub enum NormalizeError {
    DeleteOperand,
    AssignmentTarget,
    CompoundAssignmentTarget,
    ForInTarget,
    GuardedCatchHandler,
    ReferenceErrorShadowed,
    ExposedFunction,
    ReturnOutsideFunction,
    UnlabeledBreak,
    UnlabeledContinue,
    UnknownLabel(String),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NormalizeError::DeleteOperand => {
                write!(f, "Cannot delete a non-identifier, non-member operand")
            }
            NormalizeError::AssignmentTarget => {
                write!(f, "Invalid left hand side of assignment")
            }
            NormalizeError::CompoundAssignmentTarget => {
                write!(f, "Invalid left hand side of compound assignment")
            }
            NormalizeError::ForInTarget => {
                write!(f, "Left hand side of for-in must be an identifier or declaration")
            }
            NormalizeError::GuardedCatchHandler => {
                write!(f, "Guarded catch handlers are not supported")
            }
            NormalizeError::ReferenceErrorShadowed => {
                write!(f, "ReferenceError is shadowed by a local binding")
            }
            NormalizeError::ExposedFunction => {
                write!(f, "Cannot normalize a function whose binding escapes to a nested function")
            }
            NormalizeError::ReturnOutsideFunction => {
                write!(f, "Return must be inside a function")
            }
            NormalizeError::UnlabeledBreak => {
                write!(f, "Break must be inside a loop or switch")
            }
            NormalizeError::UnlabeledContinue => {
                write!(f, "Continue must be inside a loop")
            }
            NormalizeError::UnknownLabel(label) => {
                write!(f, "Continue target {} does not label an enclosing loop", label)
            }
        }
    }
}

impl Error for NormalizeError {}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
