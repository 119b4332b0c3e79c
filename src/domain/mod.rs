//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors, authenticated users)
//! - `billing` - Price maps, subscription classification and webhook interpretation

pub mod billing;
pub mod foundation;
