//! Service layer - registration, update and search use cases.

mod user_service;

pub use user_service::{UserManager, UserService};
