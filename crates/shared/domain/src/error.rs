//! Domain-level errors.
//!
//! These errors represent business rule violations and domain logic failures.
//! They are independent of infrastructure concerns (HTTP, database).

use std::collections::BTreeMap;

use thiserror::Error;

use crate::constants::DEFAULT_LOCALE;

/// Kind of a domain error, used by boundaries to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AgeBelow,
    CpfInvalid,
    AlreadyExists,
    NotFound,
    InvalidFilterField,
    InvalidPatch,
}

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Candidate is younger than the minimum registration age
    #[error("Registration is only allowed to users aged 18 and above.")]
    AgeBelow,

    /// CPF fails the length, repetition or check digit rules
    #[error("CPF is invalid.")]
    CpfInvalid,

    /// Another user already holds the CPF or email
    #[error("User already exists.")]
    AlreadyExists,

    /// No user with the given id
    #[error("User {0} not found.")]
    NotFound(String),

    /// Search key outside the searchable field registry
    #[error("Filter field {0} does not exist.")]
    InvalidFilterField(String),

    /// Patch document could not be applied
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        DomainError::NotFound(id.into())
    }

    /// Create an invalid filter field error
    pub fn invalid_filter_field(field: impl Into<String>) -> Self {
        DomainError::InvalidFilterField(field.into())
    }

    /// Create an invalid patch error
    pub fn invalid_patch(reason: impl Into<String>) -> Self {
        DomainError::InvalidPatch(reason.into())
    }

    /// Error kind tag
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::AgeBelow => ErrorKind::AgeBelow,
            DomainError::CpfInvalid => ErrorKind::CpfInvalid,
            DomainError::AlreadyExists => ErrorKind::AlreadyExists,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::InvalidFilterField(_) => ErrorKind::InvalidFilterField,
            DomainError::InvalidPatch(_) => ErrorKind::InvalidPatch,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::AgeBelow => "AGE_BELOW_X",
            ErrorKind::CpfInvalid => "INVALID_CPF",
            ErrorKind::AlreadyExists => "USER_ALREADY_EXISTS",
            ErrorKind::NotFound => "USER_NOT_FOUND",
            ErrorKind::InvalidFilterField => "INVALID_FILTER_FIELD",
            ErrorKind::InvalidPatch => "INVALID_PATCH",
        }
    }

    /// Messages keyed by locale. Only `en` is populated.
    pub fn localized_message(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(DEFAULT_LOCALE.to_string(), self.to_string())])
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
