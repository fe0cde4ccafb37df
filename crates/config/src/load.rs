//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{BackendConfig, BackendEnv, StoreProvider, ValidatedBackendConfig, apply_env_overrides};
use cinedex_domain::Language;
use cinedex_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the backend config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`BackendEnv`)
/// - overrides JSON (partial config, no secrets)
/// - config JSON (file content)
/// - defaults (`BackendConfig::default()`)
pub fn load_backend_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config = match config_json {
        None => BackendConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };
    merge_and_validate(config, overrides_json, env)
}

/// Load the backend config from an optional file path.
pub fn load_backend_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config = match config_path {
        None => BackendConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };
    merge_and_validate(config, overrides_json, env)
}

/// Load the backend config from std env and an optional file path.
pub fn load_backend_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let env = BackendEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_backend_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
///
/// Secrets render as `[REDACTED]`.
pub fn to_pretty_json(config: &BackendConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &BackendConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn merge_and_validate(
    mut config: BackendConfig,
    overrides_json: Option<&str>,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        apply_overrides(&mut config, &overrides);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<BackendConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<BackendConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct BackendConfigOverrides {
    version: Option<u32>,
    core: CoreConfigOverrides,
    warm: WarmConfigOverrides,
    store: StoreConfigOverrides,
    catalog: CatalogConfigOverrides,
    providers: ProvidersConfigOverrides,
    logging: LoggingConfigOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CoreConfigOverrides {
    timeout_ms: Option<u64>,
    default_language: Option<Language>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct WarmConfigOverrides {
    max_concurrency: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct StoreConfigOverrides {
    provider: Option<StoreProvider>,
    sqlite_path: Option<Box<str>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CatalogConfigOverrides {
    path: Option<Box<str>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ProvidersConfigOverrides {
    tmdb: TmdbOverrides,
    openai: OpenAiOverrides,
    spotify: SpotifyOverrides,
    portrait: PortraitOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct TmdbOverrides {
    base_url: Option<Box<str>>,
    image_base_url: Option<Box<str>>,
    language: Option<Box<str>>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct OpenAiOverrides {
    base_url: Option<Box<str>>,
    model: Option<Box<str>>,
    generation_timeout_ms: Option<u64>,
    translation_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct SpotifyOverrides {
    api_base_url: Option<Box<str>>,
    auth_url: Option<Box<str>>,
    timeout_ms: Option<u64>,
    client_id: Option<Box<str>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct PortraitOverrides {
    enabled: Option<bool>,
    page_url_template: Option<Box<str>>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct LoggingConfigOverrides {
    level: Option<Box<str>>,
}

fn apply_overrides(config: &mut BackendConfig, overrides: &BackendConfigOverrides) {
    OverrideMapper::set_copy(&mut config.version, overrides.version);

    let core = &overrides.core;
    OverrideMapper::set_copy(&mut config.core.timeout_ms, core.timeout_ms);
    OverrideMapper::set_copy(&mut config.core.default_language, core.default_language);
    OverrideMapper::set_copy(
        &mut config.warm.max_concurrency,
        overrides.warm.max_concurrency,
    );
    OverrideMapper::set_copy(&mut config.store.provider, overrides.store.provider);
    OverrideMapper::set_clone(
        &mut config.store.sqlite_path,
        overrides.store.sqlite_path.as_ref(),
    );
    OverrideMapper::set_clone(&mut config.catalog.path, overrides.catalog.path.as_ref());
    OverrideMapper::set_clone(&mut config.logging.level, overrides.logging.level.as_ref());

    apply_provider_overrides(config, &overrides.providers);
}

fn apply_provider_overrides(config: &mut BackendConfig, overrides: &ProvidersConfigOverrides) {
    let tmdb = &mut config.providers.tmdb;
    OverrideMapper::set_clone(&mut tmdb.base_url, overrides.tmdb.base_url.as_ref());
    OverrideMapper::set_clone(
        &mut tmdb.image_base_url,
        overrides.tmdb.image_base_url.as_ref(),
    );
    OverrideMapper::set_clone(&mut tmdb.language, overrides.tmdb.language.as_ref());
    OverrideMapper::set_copy(&mut tmdb.timeout_ms, overrides.tmdb.timeout_ms);

    let openai = &mut config.providers.openai;
    OverrideMapper::set_clone(&mut openai.base_url, overrides.openai.base_url.as_ref());
    OverrideMapper::set_clone(&mut openai.model, overrides.openai.model.as_ref());
    OverrideMapper::set_copy(
        &mut openai.generation_timeout_ms,
        overrides.openai.generation_timeout_ms,
    );
    OverrideMapper::set_copy(
        &mut openai.translation_timeout_ms,
        overrides.openai.translation_timeout_ms,
    );

    let spotify = &mut config.providers.spotify;
    OverrideMapper::set_clone(
        &mut spotify.api_base_url,
        overrides.spotify.api_base_url.as_ref(),
    );
    OverrideMapper::set_clone(&mut spotify.auth_url, overrides.spotify.auth_url.as_ref());
    OverrideMapper::set_copy(&mut spotify.timeout_ms, overrides.spotify.timeout_ms);
    OverrideMapper::set_opt_box_str(
        &mut spotify.client_id,
        overrides.spotify.client_id.as_deref(),
    );

    let portrait = &mut config.providers.portrait;
    OverrideMapper::set_copy(&mut portrait.enabled, overrides.portrait.enabled);
    OverrideMapper::set_clone(
        &mut portrait.page_url_template,
        overrides.portrait.page_url_template.as_ref(),
    );
    OverrideMapper::set_copy(&mut portrait.timeout_ms, overrides.portrait.timeout_ms);
}

struct OverrideMapper;

impl OverrideMapper {
    fn set_copy<T: Copy>(field: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *field = value;
        }
    }

    fn set_opt_box_str(field: &mut Option<Box<str>>, value: Option<&str>) {
        if let Some(value) = value {
            *field = Some(value.into());
        }
    }

    fn set_clone<T: Clone>(field: &mut T, value: Option<&T>) {
        if let Some(value) = value {
            *field = value.clone();
        }
    }
}
