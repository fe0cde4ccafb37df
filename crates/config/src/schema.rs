//! Backend configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims strings and lowercases enumerated settings.

use cinedex_domain::Language;
use cinedex_shared::{ErrorCode, ErrorEnvelope, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Sanitizes a URL for error messages by stripping credentials.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Placeholder a portrait page template must contain.
pub const PORTRAIT_NAME_PLACEHOLDER: &str = "{name}";

const CORE_TIMEOUT_MIN_MS: u64 = 1_000;
const CORE_TIMEOUT_MAX_MS: u64 = 600_000;
const PROVIDER_TIMEOUT_MIN_MS: u64 = 500;
const PROVIDER_TIMEOUT_MAX_MS: u64 = 120_000;
const WARM_MAX_CONCURRENCY_MIN: u32 = 1;
const WARM_MAX_CONCURRENCY_MAX: u32 = 32;

const LOG_LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];

/// Top-level backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BackendConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Core runtime settings.
    pub core: CoreConfig,
    /// Bulk warmer settings.
    pub warm: WarmConfig,
    /// Document store settings.
    pub store: StoreConfig,
    /// Catalog source settings.
    pub catalog: CatalogConfig,
    /// External enrichment providers.
    pub providers: ProvidersConfig,
    /// JSON-lines logger settings.
    pub logging: LoggingConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            core: CoreConfig::default(),
            warm: WarmConfig::default(),
            store: StoreConfig::default(),
            catalog: CatalogConfig::default(),
            providers: ProvidersConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedBackendConfig, ConfigSchemaError> {
        self.validate_version()?;

        self.core.validate()?;
        self.warm.validate()?;
        self.store.normalize();
        self.store.validate()?;
        self.catalog.normalize();
        self.catalog.validate()?;
        self.providers.normalize();
        self.providers.validate()?;
        self.logging.normalize();
        self.logging.validate()?;

        Ok(ValidatedBackendConfig { raw: self })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Validated config wrapper.
#[derive(Debug, Clone)]
pub struct ValidatedBackendConfig {
    raw: BackendConfig,
}

impl ValidatedBackendConfig {
    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &BackendConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> BackendConfig {
        self.raw
    }

    /// Budget applied to every store and catalog operation.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.raw.core.timeout_ms)
    }

    /// Worker bound for bulk warming.
    #[must_use]
    pub const fn warm_concurrency(&self) -> usize {
        self.raw.warm.max_concurrency as usize
    }
}

impl AsRef<BackendConfig> for ValidatedBackendConfig {
    fn as_ref(&self) -> &BackendConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedBackendConfig {
    type Target = BackendConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Parse and validate a backend config from JSON.
pub fn parse_backend_config_json(input: &str) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config: BackendConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(ErrorEnvelope::from)
}

/// Parse and validate a backend config from TOML.
pub fn parse_backend_config_toml(input: &str) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config: BackendConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;
    config.validate_and_normalize().map_err(ErrorEnvelope::from)
}

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CoreConfig {
    /// Budget for each store and catalog operation (ms).
    pub timeout_ms: u64,
    /// Language served when a caller does not pick one.
    pub default_language: Language,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            default_language: Language::PRODUCTION,
        }
    }
}

impl CoreConfig {
    const fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_timeout_ms(
            "core",
            "timeoutMs",
            self.timeout_ms,
            CORE_TIMEOUT_MIN_MS,
            CORE_TIMEOUT_MAX_MS,
        )
    }
}

/// Bulk warmer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct WarmConfig {
    /// Items warmed at once when the caller does not choose.
    pub max_concurrency: u32,
}

impl Default for WarmConfig {
    fn default() -> Self {
        Self { max_concurrency: 3 }
    }
}

impl WarmConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_limit_u32(
            "warm",
            "maxConcurrency",
            self.max_concurrency,
            WARM_MAX_CONCURRENCY_MIN,
            WARM_MAX_CONCURRENCY_MAX,
        )
    }
}

/// Document store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// Single-file `SQLite` database.
    #[default]
    Sqlite,
    /// Process-local map; contents vanish on exit.
    Memory,
}

impl StoreProvider {
    /// Return the canonical config string for this provider.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }

    /// Parse a provider from user or env input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "memory" | "in-memory" | "inmemory" => Some(Self::Memory),
            _ => None,
        }
    }
}

impl fmt::Display for StoreProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StoreConfig {
    /// Backend selection.
    pub provider: StoreProvider,
    /// Database file for the `sqlite` provider.
    pub sqlite_path: Box<str>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Sqlite,
            sqlite_path: ".cinedex/cinedex.db".into(),
        }
    }
}

impl StoreConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.sqlite_path);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.provider == StoreProvider::Sqlite && self.sqlite_path.is_empty() {
            return Err(ConfigSchemaError::EmptyPath {
                section: "store",
                field: "sqlitePath",
            });
        }
        Ok(())
    }
}

/// Catalog source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CatalogConfig {
    /// JSON file holding an array of catalog items.
    pub path: Box<str>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "catalog.json".into(),
        }
    }
}

impl CatalogConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.path);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.path.is_empty() {
            return Err(ConfigSchemaError::EmptyPath {
                section: "catalog",
                field: "path",
            });
        }
        Ok(())
    }
}

/// External enrichment providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ProvidersConfig {
    /// Structured director lookup.
    pub tmdb: TmdbConfig,
    /// Generative text and translation.
    pub openai: OpenAiConfig,
    /// Track matching.
    pub spotify: SpotifyConfig,
    /// Portrait page scrape.
    pub portrait: PortraitConfig,
}

impl ProvidersConfig {
    fn normalize(&mut self) {
        self.tmdb.normalize();
        self.openai.normalize();
        self.spotify.normalize();
        self.portrait.normalize();
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        self.tmdb.validate()?;
        self.openai.validate()?;
        self.spotify.validate()?;
        self.portrait.validate()
    }
}

/// TMDB person search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct TmdbConfig {
    /// API root.
    pub base_url: Box<str>,
    /// Prefix joined with a profile path to form a photo URL.
    pub image_base_url: Box<str>,
    /// Language tag sent with every request.
    pub language: Box<str>,
    /// Request timeout (ms).
    pub timeout_ms: u64,
    /// API key; the stage is skipped when absent.
    #[serde(
        default,
        with = "secret_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<SecretString>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".into(),
            image_base_url: "https://image.tmdb.org/t/p/w500".into(),
            language: "pt-BR".into(),
            timeout_ms: 10_000,
            api_key: None,
        }
    }
}

impl TmdbConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.base_url);
        normalize_boxed_str(&mut self.image_base_url);
        normalize_boxed_str(&mut self.language);
        normalize_secret(&mut self.api_key);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("providers.tmdb", "baseUrl", &self.base_url)?;
        validate_http_url("providers.tmdb", "imageBaseUrl", &self.image_base_url)?;
        validate_timeout_ms(
            "providers.tmdb",
            "timeoutMs",
            self.timeout_ms,
            PROVIDER_TIMEOUT_MIN_MS,
            PROVIDER_TIMEOUT_MAX_MS,
        )
    }
}

/// `OpenAI` chat completion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct OpenAiConfig {
    /// API root.
    pub base_url: Box<str>,
    /// Chat model.
    pub model: Box<str>,
    /// Timeout for biography and track generation (ms).
    pub generation_timeout_ms: u64,
    /// Timeout for translation (ms).
    pub translation_timeout_ms: u64,
    /// API key; generation and translation are disabled when absent.
    #[serde(
        default,
        with = "secret_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<SecretString>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-3.5-turbo".into(),
            generation_timeout_ms: 8_000,
            translation_timeout_ms: 3_000,
            api_key: None,
        }
    }
}

impl OpenAiConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.base_url);
        normalize_boxed_str(&mut self.model);
        normalize_secret(&mut self.api_key);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("providers.openai", "baseUrl", &self.base_url)?;
        if self.model.is_empty() {
            return Err(ConfigSchemaError::EmptyValue {
                section: "providers.openai",
                field: "model",
            });
        }
        validate_timeout_ms(
            "providers.openai",
            "generationTimeoutMs",
            self.generation_timeout_ms,
            PROVIDER_TIMEOUT_MIN_MS,
            PROVIDER_TIMEOUT_MAX_MS,
        )?;
        validate_timeout_ms(
            "providers.openai",
            "translationTimeoutMs",
            self.translation_timeout_ms,
            PROVIDER_TIMEOUT_MIN_MS,
            PROVIDER_TIMEOUT_MAX_MS,
        )
    }
}

/// Spotify client-credentials settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SpotifyConfig {
    /// Web API root.
    pub api_base_url: Box<str>,
    /// Token endpoint.
    pub auth_url: Box<str>,
    /// Request timeout (ms).
    pub timeout_ms: u64,
    /// Client id; matching is skipped unless both credentials are set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Box<str>>,
    /// Client secret.
    #[serde(
        default,
        with = "secret_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<SecretString>,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com/v1".into(),
            auth_url: "https://accounts.spotify.com/api/token".into(),
            timeout_ms: 10_000,
            client_id: None,
            client_secret: None,
        }
    }
}

impl SpotifyConfig {
    /// Whether both client credentials are present.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.api_base_url);
        normalize_boxed_str(&mut self.auth_url);
        normalize_optional_trimmed(&mut self.client_id);
        normalize_secret(&mut self.client_secret);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_http_url("providers.spotify", "apiBaseUrl", &self.api_base_url)?;
        validate_http_url("providers.spotify", "authUrl", &self.auth_url)?;
        validate_timeout_ms(
            "providers.spotify",
            "timeoutMs",
            self.timeout_ms,
            PROVIDER_TIMEOUT_MIN_MS,
            PROVIDER_TIMEOUT_MAX_MS,
        )
    }
}

/// Portrait page-scrape settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PortraitConfig {
    /// Whether portrait lookups run at all.
    pub enabled: bool,
    /// Page URL with a `{name}` placeholder.
    pub page_url_template: Box<str>,
    /// Request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for PortraitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_url_template: "https://en.wikipedia.org/wiki/{name}".into(),
            timeout_ms: 5_000,
        }
    }
}

impl PortraitConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.page_url_template);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if !self.page_url_template.contains(PORTRAIT_NAME_PLACEHOLDER) {
            return Err(ConfigSchemaError::InvalidTemplate {
                section: "providers.portrait",
                field: "pageUrlTemplate",
                template: self.page_url_template.to_string(),
            });
        }
        let sample = self.page_url_template.replace(PORTRAIT_NAME_PLACEHOLDER, "x");
        validate_http_url("providers.portrait", "pageUrlTemplate", &sample)?;
        validate_timeout_ms(
            "providers.portrait",
            "timeoutMs",
            self.timeout_ms,
            PROVIDER_TIMEOUT_MIN_MS,
            PROVIDER_TIMEOUT_MAX_MS,
        )
    }
}

/// JSON-lines logger settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Minimum level: `debug`, `info`, `warn`, or `error`.
    pub level: Box<str>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        self.level = self.level.trim().to_ascii_lowercase().into_boxed_str();
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if !LOG_LEVELS.contains(&&*self.level) {
            return Err(ConfigSchemaError::InvalidLogLevel {
                value: self.level.to_string(),
            });
        }
        Ok(())
    }
}

/// Validation errors for configuration schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// Configuration version is unsupported.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Supported version.
        supported: u32,
    },
    /// A timeout value is out of range.
    TimeoutOutOfRange {
        /// Schema section (e.g. `core`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Provided value in milliseconds.
        value_ms: u64,
        /// Minimum allowed value in milliseconds.
        min_ms: u64,
        /// Maximum allowed value in milliseconds.
        max_ms: u64,
    },
    /// A numeric limit is out of range.
    LimitOutOfRange {
        /// Schema section (e.g. `warm`).
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Provided value.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section (e.g. `providers.tmdb`).
        section: &'static str,
        /// Field name in the config file (e.g. `baseUrl`).
        field: &'static str,
        /// Invalid URL value.
        url: String,
    },
    /// A required path is empty.
    EmptyPath {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
    },
    /// A required value is empty.
    EmptyValue {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
    },
    /// A page template lacks the name placeholder.
    InvalidTemplate {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Offending template.
        template: String,
    },
    /// The logging level is not recognized.
    InvalidLogLevel {
        /// Offending value.
        value: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::EmptyPath { .. } => ErrorCode::new("config", "invalid_path"),
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_value"),
            Self::InvalidTemplate { .. } => ErrorCode::new("config", "invalid_template"),
            Self::InvalidLogLevel { .. } => ErrorCode::new("config", "invalid_log_level"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be between {min_ms} and {max_ms} ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be between {min} and {max} (got {value})"
            ),
            Self::InvalidUrl {
                section,
                field,
                url,
            } => write!(
                formatter,
                "{section}.{field} must be an http(s) URL (got {})",
                sanitize_url_for_error(url)
            ),
            Self::EmptyPath { section, field } => {
                write!(formatter, "{section}.{field} must be a non-empty path")
            },
            Self::EmptyValue { section, field } => {
                write!(formatter, "{section}.{field} must be non-empty")
            },
            Self::InvalidTemplate {
                section, field, ..
            } => write!(
                formatter,
                "{section}.{field} must contain {PORTRAIT_NAME_PLACEHOLDER}"
            ),
            Self::InvalidLogLevel { value } => write!(
                formatter,
                "logging.level must be one of debug, info, warn, error (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", sanitize_url_for_error(&url)),
            ConfigSchemaError::EmptyPath { section, field }
            | ConfigSchemaError::EmptyValue { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
            ConfigSchemaError::InvalidTemplate {
                section,
                field,
                template,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("template", template),
            ConfigSchemaError::InvalidLogLevel { value } => envelope
                .with_metadata("section", "logging")
                .with_metadata("field", "level")
                .with_metadata("value", value),
        }
    }
}

/// Serde bridge for optional secrets: values read verbatim, written redacted.
mod secret_field {
    use cinedex_shared::{REDACTED, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option, reason = "serde `with` passes a reference to the field")]
    pub fn serialize<S>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(_) => serializer.serialize_str(REDACTED),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map(SecretString::from))
    }
}

const fn validate_timeout_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigSchemaError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigSchemaError::TimeoutOutOfRange {
            section,
            field,
            value_ms,
            min_ms,
            max_ms,
        });
    }
    Ok(())
}

fn validate_limit_u32(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::LimitOutOfRange {
            section,
            field,
            value: u64::from(value),
            min: u64::from(min),
            max: u64::from(max),
        });
    }
    Ok(())
}

fn validate_http_url(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigSchemaError> {
    let parsed = Url::parse(value).map_err(|_| ConfigSchemaError::InvalidUrl {
        section,
        field,
        url: value.to_owned(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigSchemaError::InvalidUrl {
            section,
            field,
            url: value.to_owned(),
        });
    }

    Ok(())
}

fn normalize_optional_trimmed(value: &mut Option<Box<str>>) {
    if let Some(current) = value.take() {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            *value = Some(trimmed.into());
        }
    }
}

fn normalize_secret(value: &mut Option<SecretString>) {
    if let Some(current) = value.take() {
        let trimmed = current.expose().trim();
        if !trimmed.is_empty() {
            *value = Some(SecretString::new(trimmed));
        }
    }
}

fn normalize_boxed_str(value: &mut Box<str>) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.into();
    }
}
