//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the authenticated user and error types
//! shared by the billing domain and its adapters.

mod auth;
mod errors;
mod ids;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::UserId;
