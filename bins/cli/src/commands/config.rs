//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{
    CliOutput, ConfigSource, ENV_PREFIX, collect_scoped_env, format_error_output, format_ndjson_summary,
    log_info,
};
use cinedex_infra::{load_effective_config, load_effective_config_json, validate_env_parsing};

/// Run `config show`.
pub fn run_config_show(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    let config = match load_effective_config_json(&env, source.path, source.overrides_json) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, "config.show", &error)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        let config_value: serde_json::Value = serde_json::from_str(config.trim())?;
        format_ndjson_summary(
            "ok",
            "config.show",
            Some(serde_json::json!({ "effectiveConfig": config_value })),
        )
    } else if mode.is_json() {
        let config_value: serde_json::Value = serde_json::from_str(config.trim())?;
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": source.path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        });
        let mut output = serde_json::to_string_pretty(&payload)?;
        output.push('\n');
        output
    } else {
        let mut out = String::new();
        out.push_str("status: ok\nconfig:\n");
        out.push_str(&config);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Run `config check`.
pub fn run_config_check(mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env(ENV_PREFIX);
    if let Err(error) = validate_env_parsing(&env) {
        return Ok(format_error_output(mode, "config.check", &error));
    }
    let config = match load_effective_config(&env, source.path, source.overrides_json) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, "config.check", &error)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let summary = serde_json::json!({
        "store": config.store.provider,
        "catalogPath": &*config.catalog.path,
        "defaultLanguage": config.core.default_language.as_str(),
        "warmConcurrency": config.warm_concurrency(),
    });
    let stdout = if mode.is_ndjson() {
        format_ndjson_summary("ok", "config.check", Some(summary))
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": source.path.map(|value| value.to_string_lossy().to_string()),
            "summary": summary,
        });
        let mut output = serde_json::to_string_pretty(&payload)?;
        output.push('\n');
        output
    } else {
        let mut out = String::from("status: ok\nconfig: ok\n");
        if let Some(path) = source.path {
            out.push_str(&format!("path: {}\n", path.to_string_lossy()));
        }
        out.push_str(&format!(
            "defaultLanguage: {}\nwarmConcurrency: {}\n",
            config.core.default_language.as_str(),
            config.warm_concurrency()
        ));
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
