//! # cinedex-infra
//!
//! Composition root: builds the store, catalog, providers, and logger from a
//! validated config and exposes the outward operations.
//! This crate depends on `app`, `adapters`, `api`, `config`, and `shared`.

/// Wired backend and outward operations.
pub mod backend;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Enrichment provider selection.
pub mod provider_factory;
/// Runtime helpers for synchronous callers.
pub mod runtime;
/// Store, catalog, and logger selection.
pub mod store_factory;

pub use backend::{Backend, call_budgets};
pub use config_check::{load_effective_config, load_effective_config_json};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use provider_factory::{ProviderSet, build_providers};
pub use runtime::{block_on_with_ctrl_c, spawn_ctrl_c_watcher};
pub use store_factory::{build_catalog, build_document_store, build_logger};

// Re-export redaction utilities for CLI boundary sanitization
pub use cinedex_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_adapters::adapters_crate_version;
    use cinedex_app::app_crate_version;
    use cinedex_config::config_crate_version;
    use cinedex_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;
        let mut in_dev_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                in_dev_deps = line == "[dev-dependencies]";
                continue;
            }
            if !(in_deps || in_dev_deps) {
                continue;
            }
            if line.starts_with("cinedex-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn infra_depends_on_app_adapters_api_config() {
        let deps = workspace_deps();
        let required = [
            "cinedex-app",
            "cinedex-adapters",
            "cinedex-api",
            "cinedex-config",
        ];

        for expected in required {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn infra_does_not_depend_on_the_cli() {
        assert!(!workspace_deps().iter().any(|dep| dep == "cinedex-cli"));
    }

    #[test]
    fn infra_can_use_app_adapters_config_shared() {
        assert!(!infra_crate_version().is_empty());
        assert!(!app_crate_version().is_empty());
        assert!(!adapters_crate_version().is_empty());
        assert!(!config_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
