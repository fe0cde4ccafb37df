//! Secret detection and redaction utilities.
//!
//! Provider credentials travel through config, logs, and error metadata.
//! These helpers keep their values out of anything printed.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use cinedex_shared::is_secret_key;
///
/// assert!(is_secret_key("CINEDEX_OPENAI_API_KEY"));
/// assert!(is_secret_key("clientSecret"));
/// assert!(!is_secret_key("CINEDEX_CATALOG_PATH"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key: String = key
        .chars()
        .filter(|ch| *ch != '_' && *ch != '-')
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    [
        "APIKEY",
        "TOKEN",
        "SECRET",
        "PASSWORD",
        "CREDENTIAL",
        "AUTHORIZATION",
        "BEARER",
    ]
    .iter()
    .any(|marker| key.contains(marker))
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use cinedex_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("apiKey", "sk-123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("language", "pt"), "pt");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_provider_credentials() {
        assert!(is_secret_key("CINEDEX_TMDB_API_KEY"));
        assert!(is_secret_key("CINEDEX_SPOTIFY_CLIENT_SECRET"));
        assert!(is_secret_key("access_token"));
        assert!(is_secret_key("Authorization"));
    }

    #[test]
    fn rejects_plain_settings() {
        assert!(!is_secret_key("CINEDEX_LOG_LEVEL"));
        assert!(!is_secret_key("maxConcurrency"));
        assert!(!is_secret_key("sqlitePath"));
        assert!(!is_secret_key("cacheKey"));
        assert!(!is_secret_key("soundtrackKey"));
    }

    #[test]
    fn secret_string_redacts_display_and_debug() {
        let secret = SecretString::new("sk-live");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "sk-live");
    }
}
