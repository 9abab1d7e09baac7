//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! the CPF validator, the user entity, search filters and the query builder,
//! and patch reconciliation.

pub mod constants;
pub mod cpf;
pub mod error;
pub mod filter;
pub mod patch;
pub mod query;
pub mod user;

pub use constants::*;
pub use cpf::Cpf;
pub use error::{DomainError, DomainResult, ErrorKind};
pub use filter::{FilterField, LogicalOperator, SearchField, UserFilter, SEARCHABLE_FIELDS};
pub use patch::{apply_patch, PatchOperation, PatchPath};
pub use query::{Query, QueryBuilder};
pub use user::{birth_date_format, parse_birth_date, User, UserChanges, UserResponse};
