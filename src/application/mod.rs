//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates the billing domain and coordinates between ports.

pub mod handlers;

pub use handlers::billing;
