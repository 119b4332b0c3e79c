//! Authentication adapters.
//!
//! - `SupabaseSessionValidator` - HS256 Supabase access tokens
//! - `MockSessionValidator` - Token table for tests

mod mock;
mod supabase;

pub use mock::MockSessionValidator;
pub use supabase::{SupabaseAuthConfig, SupabaseSessionValidator, DEFAULT_SUPABASE_AUDIENCE};
