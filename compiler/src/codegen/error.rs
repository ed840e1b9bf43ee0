/**
Error types for code generation
*/
use crate::typechecker::TypeError;
use std::fmt;

/// Errors that can occur during code generation
#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// Grammar error found while materializing a declaration
    Type(Box<TypeError>),

    /// A combinator was handed a different number of values than its effect consumes
    InputCountMismatch {
        unit: String,
        required: usize,
        supplied: usize,
    },

    /// Block closed that was never opened
    UnbalancedBlock,

    /// Header configuration could not be read or parsed
    Config { message: String },

    /// Internal compiler error
    InternalError(String),
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::Type(err) => write!(f, "Grammar error: {}", err),
            CodegenError::InputCountMismatch {
                unit,
                required,
                supplied,
            } => {
                write!(
                    f,
                    "'{}' takes {} input value(s), but {} supplied",
                    unit, required, supplied
                )
            }
            CodegenError::UnbalancedBlock => write!(f, "Closed a block that was never opened"),
            CodegenError::Config { message } => write!(f, "Configuration error: {}", message),
            CodegenError::InternalError(msg) => {
                write!(f, "Internal compiler error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<Box<TypeError>> for CodegenError {
    fn from(err: Box<TypeError>) -> Self {
        CodegenError::Type(err)
    }
}

/// Result type for code generation operations
pub type CodegenResult<T> = Result<T, CodegenError>;
