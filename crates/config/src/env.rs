//! Environment variable parsing and env-to-config merging.
//!
//! This module keeps env parsing:
//! - strict (invalid values fail fast)
//! - safe (secret values are redacted in error metadata)

use crate::schema::{BackendConfig, StoreProvider, ValidatedBackendConfig};
use cinedex_domain::Language;
use cinedex_shared::{ErrorCode, ErrorEnvelope, REDACTED, SecretString, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: store and catalog operation budget in milliseconds.
pub const ENV_CORE_TIMEOUT_MS: &str = "CINEDEX_CORE_TIMEOUT_MS";
/// Env var: language served when the caller does not pick one.
pub const ENV_DEFAULT_LANGUAGE: &str = "CINEDEX_DEFAULT_LANGUAGE";
/// Env var: bulk warmer worker bound.
pub const ENV_WARM_MAX_CONCURRENCY: &str = "CINEDEX_WARM_MAX_CONCURRENCY";
/// Env var: document store backend (`sqlite` or `memory`).
pub const ENV_STORE_PROVIDER: &str = "CINEDEX_STORE_PROVIDER";
/// Env var: `SQLite` database file.
pub const ENV_SQLITE_PATH: &str = "CINEDEX_SQLITE_PATH";
/// Env var: catalog JSON file.
pub const ENV_CATALOG_PATH: &str = "CINEDEX_CATALOG_PATH";
/// Env var: JSON logger minimum level.
pub const ENV_LOG_LEVEL: &str = "CINEDEX_LOG_LEVEL";
/// Env var: TMDB API key (secret).
pub const ENV_TMDB_API_KEY: &str = "CINEDEX_TMDB_API_KEY";
/// Env var: TMDB API root.
pub const ENV_TMDB_BASE_URL: &str = "CINEDEX_TMDB_BASE_URL";
/// Env var: `OpenAI` API key (secret).
pub const ENV_OPENAI_API_KEY: &str = "CINEDEX_OPENAI_API_KEY";
/// Env var: `OpenAI` API root.
pub const ENV_OPENAI_BASE_URL: &str = "CINEDEX_OPENAI_BASE_URL";
/// Env var: `OpenAI` chat model.
pub const ENV_OPENAI_MODEL: &str = "CINEDEX_OPENAI_MODEL";
/// Env var: Spotify client id.
pub const ENV_SPOTIFY_CLIENT_ID: &str = "CINEDEX_SPOTIFY_CLIENT_ID";
/// Env var: Spotify client secret (secret).
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "CINEDEX_SPOTIFY_CLIENT_SECRET";
/// Env var: enable or disable portrait lookups.
pub const ENV_PORTRAIT_ENABLED: &str = "CINEDEX_PORTRAIT_ENABLED";

const ALL_ENV_VARS: [&str; 15] = [
    ENV_CORE_TIMEOUT_MS,
    ENV_DEFAULT_LANGUAGE,
    ENV_WARM_MAX_CONCURRENCY,
    ENV_STORE_PROVIDER,
    ENV_SQLITE_PATH,
    ENV_CATALOG_PATH,
    ENV_LOG_LEVEL,
    ENV_TMDB_API_KEY,
    ENV_TMDB_BASE_URL,
    ENV_OPENAI_API_KEY,
    ENV_OPENAI_BASE_URL,
    ENV_OPENAI_MODEL,
    ENV_SPOTIFY_CLIENT_ID,
    ENV_SPOTIFY_CLIENT_SECRET,
    ENV_PORTRAIT_ENABLED,
];

/// Parsed environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendEnv {
    /// Override for `core.timeoutMs`.
    pub core_timeout_ms: Option<u64>,
    /// Override for `core.defaultLanguage`.
    pub default_language: Option<Language>,
    /// Override for `warm.maxConcurrency`.
    pub warm_max_concurrency: Option<u32>,
    /// Override for `store.provider`.
    pub store_provider: Option<StoreProvider>,
    /// Override for `store.sqlitePath`.
    pub sqlite_path: Option<Box<str>>,
    /// Override for `catalog.path`.
    pub catalog_path: Option<Box<str>>,
    /// Override for `logging.level`.
    pub log_level: Option<Box<str>>,
    /// Secret: TMDB API key.
    pub tmdb_api_key: Option<SecretString>,
    /// Override for `providers.tmdb.baseUrl`.
    pub tmdb_base_url: Option<Box<str>>,
    /// Secret: `OpenAI` API key.
    pub openai_api_key: Option<SecretString>,
    /// Override for `providers.openai.baseUrl`.
    pub openai_base_url: Option<Box<str>>,
    /// Override for `providers.openai.model`.
    pub openai_model: Option<Box<str>>,
    /// Override for `providers.spotify.clientId`.
    pub spotify_client_id: Option<Box<str>>,
    /// Secret: Spotify client secret.
    pub spotify_client_secret: Option<SecretString>,
    /// Override for `providers.portrait.enabled`.
    pub portrait_enabled: Option<bool>,
}

impl BackendEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            core_timeout_ms: parse_optional_u64(map, ENV_CORE_TIMEOUT_MS)?,
            default_language: parse_optional_language(map, ENV_DEFAULT_LANGUAGE)?,
            warm_max_concurrency: parse_optional_u32(map, ENV_WARM_MAX_CONCURRENCY)?,
            store_provider: parse_optional_store_provider(map, ENV_STORE_PROVIDER)?,
            sqlite_path: parse_optional_trimmed_string(map, ENV_SQLITE_PATH)?,
            catalog_path: parse_optional_trimmed_string(map, ENV_CATALOG_PATH)?,
            log_level: parse_optional_trimmed_string(map, ENV_LOG_LEVEL)?,
            tmdb_api_key: parse_optional_secret(map, ENV_TMDB_API_KEY)?,
            tmdb_base_url: parse_optional_url(map, ENV_TMDB_BASE_URL)?,
            openai_api_key: parse_optional_secret(map, ENV_OPENAI_API_KEY)?,
            openai_base_url: parse_optional_url(map, ENV_OPENAI_BASE_URL)?,
            openai_model: parse_optional_trimmed_string(map, ENV_OPENAI_MODEL)?,
            spotify_client_id: parse_optional_trimmed_string(map, ENV_SPOTIFY_CLIENT_ID)?,
            spotify_client_secret: parse_optional_secret(map, ENV_SPOTIFY_CLIENT_SECRET)?,
            portrait_enabled: parse_optional_bool(map, ENV_PORTRAIT_ENABLED)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: BackendConfig,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let mut config = base;
    apply_core_env_overrides(&mut config, env);
    apply_provider_env_overrides(&mut config, env);

    config.validate_and_normalize().map_err(Into::into)
}

fn apply_core_env_overrides(config: &mut BackendConfig, env: &BackendEnv) {
    set_copy(&mut config.core.timeout_ms, env.core_timeout_ms);
    set_copy(&mut config.core.default_language, env.default_language);
    set_copy(&mut config.warm.max_concurrency, env.warm_max_concurrency);
    set_copy(&mut config.store.provider, env.store_provider);
    set_clone(&mut config.store.sqlite_path, env.sqlite_path.as_ref());
    set_clone(&mut config.catalog.path, env.catalog_path.as_ref());
    set_clone(&mut config.logging.level, env.log_level.as_ref());
}

fn apply_provider_env_overrides(config: &mut BackendConfig, env: &BackendEnv) {
    let providers = &mut config.providers;
    set_secret(&mut providers.tmdb.api_key, env.tmdb_api_key.as_ref());
    set_clone(&mut providers.tmdb.base_url, env.tmdb_base_url.as_ref());
    set_secret(&mut providers.openai.api_key, env.openai_api_key.as_ref());
    set_clone(&mut providers.openai.base_url, env.openai_base_url.as_ref());
    set_clone(&mut providers.openai.model, env.openai_model.as_ref());
    if let Some(client_id) = env.spotify_client_id.as_ref() {
        providers.spotify.client_id = Some(client_id.clone());
    }
    set_secret(
        &mut providers.spotify.client_secret,
        env.spotify_client_secret.as_ref(),
    );
    set_copy(&mut providers.portrait.enabled, env.portrait_enabled);
}

fn set_copy<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn set_clone<T: Clone>(field: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

fn set_secret(field: &mut Option<SecretString>, value: Option<&SecretString>) {
    if let Some(value) = value {
        *field = Some(value.clone());
    }
}

/// Env parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidBool { .. } => ErrorCode::new("config", "invalid_env_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidBool { var, .. } => write!(formatter, "{var} must be a boolean"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be a valid URL"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

fn present<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<&'a str>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some(trimmed))
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    Ok(present(map, var)?.map(Into::into))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed)))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(trimmed) = present(map, var)? else {
        return Ok(None);
    };
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: trimmed.to_string(),
        })
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some(trimmed) = present(map, var)? else {
        return Ok(None);
    };
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: trimmed.to_string(),
        })
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some(trimmed) = present(map, var)? else {
        return Ok(None);
    };
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: trimmed.to_string(),
        }),
    }
}

fn parse_optional_url(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(trimmed) = present(map, var)? else {
        return Ok(None);
    };
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(trimmed.into())),
        _ => Err(EnvParseError::InvalidUrl {
            var,
            value: trimmed.to_string(),
        }),
    }
}

fn parse_optional_language(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Language>, EnvParseError> {
    let Some(trimmed) = present(map, var)? else {
        return Ok(None);
    };
    Language::parse(trimmed)
        .map(Some)
        .map_err(|_| EnvParseError::InvalidEnum {
            var,
            value: trimmed.to_string(),
        })
}

fn parse_optional_store_provider(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<StoreProvider>, EnvParseError> {
    let Some(trimmed) = present(map, var)? else {
        return Ok(None);
    };
    StoreProvider::parse(trimmed)
        .map(Some)
        .ok_or_else(|| EnvParseError::InvalidEnum {
            var,
            value: trimmed.to_string(),
        })
}
