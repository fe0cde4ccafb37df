//! Integration tests for env parsing and env-to-config merging.

use cinedex_config::{
    BackendConfig, BackendEnv, EnvParseError, StoreProvider, apply_env_overrides, to_pretty_json,
};
use cinedex_domain::Language;
use cinedex_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn read_fixture(relative: &str) -> Result<String, Box<dyn Error>> {
    let path = workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join(relative);
    Ok(fs::read_to_string(path)?)
}

fn read_env_map(relative: &str) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let contents = read_fixture(relative)?;
    Ok(serde_json::from_str(&contents)?)
}

#[test]
fn env_fixtures_merge_into_effective_config() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/backend-env.valid.json")?;
    let env = BackendEnv::from_map(&env_map)?;

    let config = apply_env_overrides(BackendConfig::default(), &env)?;

    assert_eq!(config.core.timeout_ms, 45_000);
    assert_eq!(config.core.default_language, Language::Fr);
    assert_eq!(config.warm.max_concurrency, 8);
    assert_eq!(config.store.provider, StoreProvider::Memory);
    assert_eq!(config.catalog.path.as_ref(), "/srv/cinedex/catalog.json");
    assert_eq!(config.logging.level.as_ref(), "error");
    assert_eq!(
        config.providers.openai.base_url.as_ref(),
        "https://example.com/v1"
    );
    assert!(config.providers.openai.api_key.is_some());
    assert!(config.providers.spotify.has_credentials());

    Ok(())
}

#[test]
fn rendered_config_never_shows_env_secrets() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/backend-env.valid.json")?;
    let env = BackendEnv::from_map(&env_map)?;
    let config = apply_env_overrides(BackendConfig::default(), &env)?;

    let rendered = to_pretty_json(&config)?;
    assert!(!rendered.contains("sk-fixture"));
    assert!(!rendered.contains("spotify-secret"));
    assert!(rendered.contains("spotify-id"));
    Ok(())
}

#[test]
fn invalid_env_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/backend-env.invalid.json")?;
    let error = BackendEnv::from_map(&env_map).err();
    assert!(matches!(error, Some(EnvParseError::InvalidUrl { .. })));

    let envelope: ErrorEnvelope = error
        .ok_or_else(|| std::io::Error::other("expected invalid env error"))?
        .into();
    assert_eq!(envelope.code, ErrorCode::new("config", "invalid_env_url"));

    Ok(())
}
