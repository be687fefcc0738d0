use std::fmt::{self, Display};

/// Errors produced by model parsing routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownRole(String),
    UnknownStatus(String),
    UnknownMembershipType(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownRole(raw) => write!(f, "unknown role: {raw}"),
            ModelError::UnknownStatus(raw) => {
                write!(f, "unknown status: {raw}")
            }
            ModelError::UnknownMembershipType(raw) => {
                write!(f, "unknown membership type: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
