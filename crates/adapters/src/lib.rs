//! # cinedex-adapters
//!
//! Adapter implementations for ports: document stores, the catalog file,
//! structured logging, and the HTTP enrichment providers.
//! This crate depends on `ports`, `shared`, `domain`, and `config`.

pub mod catalog;
pub mod clock;
pub mod log_sink;
pub mod logger;
pub mod providers;
pub mod store;

/// Crate version, used by smoke tests and diagnostics.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_ports::ports_crate_version;
    use cinedex_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("cinedex-") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let forbidden = ["cinedex-app", "cinedex-infra"];
        for dep in workspace_deps() {
            assert!(!forbidden.contains(&dep.as_str()), "forbidden dependency found: {dep}");
        }
    }

    #[test]
    fn adapters_can_use_ports_and_shared() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
