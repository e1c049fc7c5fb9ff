//! Where the map layers come from.
//!
//! - [`AppConfig`]: TOML configuration with environment overrides
//! - [`PostgrestSource`]: rows from the Supabase REST endpoint
//! - [`AuthClient`]: password sign-in and sign-out
//! - [`FixtureSource`]: rows from local JSON files

pub mod auth;
pub mod config;
pub mod error;
pub mod fixtures;
mod http;
pub mod postgrest;

pub use auth::{AuthClient, AuthSession};
pub use config::{AppConfig, MapConfig, SupabaseConfig};
pub use error::{Result, SourceError};
pub use fixtures::FixtureSource;
pub use postgrest::PostgrestSource;
