use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    EmptyIdentifier(&'static str),
    InvalidWeight(f64),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::EmptyIdentifier(kind) => {
                write!(f, "{kind} must not be empty")
            }
            ModelError::InvalidWeight(value) => {
                write!(f, "invalid weight value: {value}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
