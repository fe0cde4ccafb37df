//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use cinedex_api::api_crate_version;
use cinedex_infra::infra_crate_version;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    infra_version: &'static str,
    api_version: &'static str,
    profile: &'static str,
}

impl BuildInfo {
    const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            infra_version: infra_crate_version(),
            api_version: api_crate_version(),
            profile: if cfg!(debug_assertions) { "debug" } else { "release" },
        }
    }
}

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let build = BuildInfo::current();

    let stdout = if mode.is_ndjson() {
        let payload = serde_json::json!({
            "type": "summary",
            "status": "ok",
            "kind": "info",
            "build": build,
        });
        let mut output = serde_json::to_string(&payload)?;
        output.push('\n');
        output
    } else if mode.is_json() {
        let payload = serde_json::json!({ "status": "ok", "build": build });
        let mut output = serde_json::to_string_pretty(&payload)?;
        output.push('\n');
        output
    } else {
        format!(
            "status: ok\nname: {}\nversion: {}\ninfra: {}\napi: {}\nprofile: {}\n",
            build.name, build.version, build.infra_version, build.api_version, build.profile
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
