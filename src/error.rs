//! Error types for the cache facade
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache facade and its drivers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// An argument had the wrong runtime type (non-string key, unusable TTL)
    #[error("Argument {position} passed to {method} must be of the type {expected}, {given} given")]
    TypeMismatch {
        position: u8,
        method: &'static str,
        expected: &'static str,
        given: &'static str,
    },

    /// General cache failure, raised by drivers
    #[error("Cache failure: {0}")]
    Failure(String),

    /// Illegal key or non-iterable batch argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    /// Builds a type mismatch for argument `position` of `method`.
    pub fn type_mismatch(
        position: u8,
        method: &'static str,
        expected: &'static str,
        given: &'static str,
    ) -> Self {
        CacheError::TypeMismatch {
            position,
            method,
            expected,
            given,
        }
    }

    // == Classification ==
    /// True for every cache failure, including invalid arguments.
    pub fn is_failure(&self) -> bool {
        matches!(self, CacheError::Failure(_) | CacheError::InvalidArgument(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CacheError::InvalidArgument(_))
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CacheError::TypeMismatch { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache facade.
pub type Result<T> = std::result::Result<T, CacheError>;
