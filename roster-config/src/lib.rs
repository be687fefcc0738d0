//! Configuration library for Roster.
//!
//! Loads an optional `roster.toml`, overlays environment variables (and a
//! `.env` file), resolves secrets supplied through `*_FILE` variables and
//! applies the guard rails that keep a production deployment from starting
//! with an unusable identity setup.

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::{
    Config, ConfigMetadata, CorsConfig, DatabaseConfig, IdentityConfig, ServerConfig,
    TokenKey,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
