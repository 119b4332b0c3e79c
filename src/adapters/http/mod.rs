//! HTTP adapters - REST API implementations.
//!
//! - `billing` - Checkout, subscription, portal and webhook endpoints
//! - `middleware` - Bearer token authentication

pub mod billing;
pub mod middleware;

pub use billing::{billing_router, BillingAppState};
