//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use cinedex_config::{
    BackendEnv, ValidatedBackendConfig, load_backend_config_from_path, to_pretty_json,
};
use cinedex_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config from an explicit env map.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<ValidatedBackendConfig> {
    let env = BackendEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_backend_config_from_path(config_path, overrides_json, &env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
///
/// Secrets render as `[REDACTED]`.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_json(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_secrets_never_reach_the_rendered_config() -> InfraResult<()> {
        let env = BTreeMap::from([(
            "CINEDEX_OPENAI_API_KEY".to_owned(),
            "sk-live-123".to_owned(),
        )]);
        let rendered = load_effective_config_json(&env, None, None)?;
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains("[REDACTED]"));
        Ok(())
    }

    #[test]
    fn overrides_apply_before_env() -> InfraResult<()> {
        let env = BTreeMap::from([("CINEDEX_DEFAULT_LANGUAGE".to_owned(), "fr".to_owned())]);
        let overrides = r#"{"core":{"defaultLanguage":"es"},"warm":{"maxConcurrency":7}}"#;
        let config = load_effective_config(&env, None, Some(overrides))?;
        assert_eq!(config.core.default_language.as_str(), "fr");
        assert_eq!(config.warm_concurrency(), 7);
        Ok(())
    }
}
