//! # cinedex-config
//!
//! Configuration schema, validation, and loading for the cinedex backend.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    BackendConfig, CURRENT_CONFIG_VERSION, CatalogConfig, ConfigSchemaError, CoreConfig,
    LoggingConfig, OpenAiConfig, PORTRAIT_NAME_PLACEHOLDER, PortraitConfig, ProvidersConfig,
    SpotifyConfig, StoreConfig, StoreProvider, TmdbConfig, ValidatedBackendConfig, WarmConfig,
    parse_backend_config_json, parse_backend_config_toml,
};

pub use env::{BackendEnv, EnvParseError, apply_env_overrides};
pub use load::{
    load_backend_config_from_path, load_backend_config_from_sources, load_backend_config_std_env,
    to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
