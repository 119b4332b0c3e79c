//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Supabase session validation
//! - `http` - Axum routes and middleware
//! - `memory` - In-memory repositories for tests and local runs
//! - `postgres` - SQLx repositories
//! - `stripe` - Stripe REST client

pub mod auth;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use auth::{MockSessionValidator, SupabaseAuthConfig, SupabaseSessionValidator};
pub use memory::{InMemorySubscriberRepository, InMemoryWebhookEventRepository};
pub use postgres::{PostgresSubscriberRepository, PostgresWebhookEventRepository};
pub use stripe::{MockPaymentProvider, StripeClientFactory, StripeConfig, StripePaymentAdapter};
