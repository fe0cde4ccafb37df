//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use cinedex_api::v1::{
    ApiV1ErrorDto, ApiV1ErrorKind, ApiV1Response, ApiV1Result, StatusKind,
    error_envelope_to_api_v1_error,
};
use cinedex_infra::{Backend, InfraError, block_on_with_ctrl_c, is_secret_key, load_effective_config};
use cinedex_shared::RequestContext;
use clap::{Parser, Subcommand};
use commands::{
    run_cache_cleanup, run_cache_stats, run_config_check, run_config_show, run_detail_get,
    run_detail_invalidate, run_info, run_warm_all, run_warm_item, run_warm_one, run_warm_stats,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const ENV_PREFIX: &str = "CINEDEX_";
const TRACE_ENV: &str = "CINEDEX_TRACE";
const TRACE_FORMAT_ENV: &str = "CINEDEX_TRACE_FORMAT";

#[derive(Debug, Parser)]
#[command(
    name = "cinedex",
    version,
    about = "Movie detail cache and enrichment warmer",
    long_about = None
)]
struct Cli {
    /// Config file path (JSON/TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Partial config JSON applied over the file (no secrets).
    #[arg(long, global = true)]
    overrides_json: Option<String>,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Read or drop detail records.
    Detail {
        #[command(subcommand)]
        command: DetailCommands,
    },
    /// Composite cache maintenance.
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Prepopulate director and soundtrack records.
    Warm {
        #[command(subcommand)]
        command: WarmCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config with secrets redacted.
    Show,
    /// Validate the config file, overrides, and environment.
    Check,
}

#[derive(Debug, Subcommand)]
enum DetailCommands {
    /// Serve a detail record, rebuilding it when missing or stale.
    Get {
        /// Catalog identifier.
        subject_id: String,
        /// Language code (`pt`, `en`, `es`, `fr`); the configured default when omitted.
        #[arg(long)]
        language: Option<String>,
    },
    /// Drop cached composites for a subject.
    Invalidate {
        /// Catalog identifier.
        subject_id: String,
        /// Only this language; every language when omitted.
        #[arg(long)]
        language: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    /// Count stored composites by freshness and language.
    Stats,
    /// Delete composites past the freshness window.
    Cleanup,
}

#[derive(Debug, Subcommand)]
enum WarmCommands {
    /// Warm every catalog item.
    All {
        /// Language passed to providers.
        #[arg(long)]
        language: Option<String>,
        /// Maximum items warmed at once (1..=32).
        #[arg(long)]
        max_concurrency: Option<u32>,
    },
    /// Warm one catalog item.
    One {
        /// Catalog identifier.
        subject_id: String,
        /// Language passed to providers.
        #[arg(long)]
        language: Option<String>,
    },
    /// Warm an item read from a JSON file; it need not be in the catalog.
    Item {
        /// JSON file holding one catalog item.
        #[arg(long)]
        file: PathBuf,
        /// Language passed to providers.
        #[arg(long)]
        language: Option<String>,
    },
    /// Report enrichment coverage of the catalog.
    Stats,
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

/// Where the effective config comes from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConfigSource<'a> {
    pub path: Option<&'a Path>,
    pub overrides_json: Option<&'a str>,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let mode = OutputMode::from_args(&cli.output);
    let source = ConfigSource {
        path: cli.config.as_deref(),
        overrides_json: cli.overrides_json.as_deref(),
    };

    match run(&cli.command, mode, source) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode, source: ConfigSource<'_>) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode),
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(mode, source),
            ConfigCommands::Check => run_config_check(mode, source),
        },
        Commands::Detail { command } => match command {
            DetailCommands::Get {
                subject_id,
                language,
            } => run_detail_get(mode, source, subject_id, language.as_deref()),
            DetailCommands::Invalidate {
                subject_id,
                language,
            } => run_detail_invalidate(mode, source, subject_id, language.as_deref()),
        },
        Commands::Cache { command } => match command {
            CacheCommands::Stats => run_cache_stats(mode, source),
            CacheCommands::Cleanup => run_cache_cleanup(mode, source),
        },
        Commands::Warm { command } => match command {
            WarmCommands::All {
                language,
                max_concurrency,
            } => run_warm_all(mode, source, language.as_deref(), *max_concurrency),
            WarmCommands::One {
                subject_id,
                language,
            } => run_warm_one(mode, source, subject_id, language.as_deref()),
            WarmCommands::Item { file, language } => {
                run_warm_item(mode, source, file, language.as_deref())
            },
            WarmCommands::Stats => run_warm_stats(mode, source),
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(TRACE_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(TRACE_FORMAT_ENV).is_ok_and(|value| value.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .try_init()
    };
    if let Err(error) = result {
        let _ = writeln!(io::stderr(), "warn: tracing disabled: {error}");
    }
}

/// How a successful payload renders.
pub(crate) struct Renderer<T> {
    /// Text body printed after the status line.
    pub text: fn(&T) -> String,
    /// Extra NDJSON lines emitted before the summary line.
    pub ndjson_items: fn(&T) -> Vec<serde_json::Value>,
}

impl<T> Renderer<T> {
    /// Render text only; NDJSON output is a single summary line.
    pub fn text(text: fn(&T) -> String) -> Self {
        Self {
            text,
            ndjson_items: no_items,
        }
    }
}

fn no_items<T>(_: &T) -> Vec<serde_json::Value> {
    Vec::new()
}

/// Load the config and wire a backend, then run one outward operation on it.
///
/// Config and wiring failures render like operation failures.
pub(crate) fn run_backend_op<T, F, Fut>(
    mode: OutputMode,
    source: ConfigSource<'_>,
    kind: &str,
    op: F,
    renderer: &Renderer<T>,
) -> Result<CliOutput, CliError>
where
    T: Serialize,
    F: FnOnce(Backend, RequestContext) -> Fut,
    Fut: Future<Output = ApiV1Response<T>>,
{
    let backend = match open_backend(mode, source) {
        Ok(backend) => backend,
        Err(error) => return Ok(format_error_output(mode, kind, &error)),
    };
    let ctx = RequestContext::new_request();
    tracing::debug!(
        kind,
        correlation_id = ctx.correlation_id().as_str(),
        "running backend operation"
    );
    match block_on_with_ctrl_c(ctx, move |ctx| op(backend, ctx)) {
        Ok(response) => render_response(mode, kind, response, renderer),
        Err(error) => Ok(format_error_output(mode, kind, &error)),
    }
}

fn open_backend(mode: OutputMode, source: ConfigSource<'_>) -> Result<Backend, InfraError> {
    let env = collect_scoped_env(ENV_PREFIX);
    let config = load_effective_config(&env, source.path, source.overrides_json)?;
    let backend = Backend::from_config(config)?;
    Ok(if mode.no_progress {
        backend.with_logger(None)
    } else {
        backend
    })
}

/// Render a payload and its status in the requested format.
pub(crate) fn render_response<T: Serialize>(
    mode: OutputMode,
    kind: &str,
    (payload, status): ApiV1Response<T>,
    renderer: &Renderer<T>,
) -> Result<CliOutput, CliError> {
    let error = payload.error().map(sanitize_api_error);
    let exit_code = exit_code_for(status, error.as_ref());

    let stdout = match (&payload, error.as_ref()) {
        (ApiV1Result::Ok { data, .. }, _) => {
            if mode.is_ndjson() {
                let mut out = String::new();
                for item in (renderer.ndjson_items)(data) {
                    out.push_str(&serde_json::to_string(&item)?);
                    out.push('\n');
                }
                out.push_str(&format_ndjson_summary(
                    status.as_str(),
                    kind,
                    Some(serde_json::json!({ "data": data })),
                ));
                out
            } else if mode.is_json() {
                let payload = serde_json::json!({
                    "status": status.as_str(),
                    "kind": kind,
                    "data": data,
                });
                let mut output = serde_json::to_string_pretty(&payload)?;
                output.push('\n');
                output
            } else {
                format!("status: {status}\n{}", (renderer.text)(data))
            }
        },
        (ApiV1Result::Err { .. }, Some(error)) => format_error_stdout(mode, kind, status, error),
        (ApiV1Result::Err { .. }, None) => String::new(),
    };

    let mut stderr = String::new();
    if !status.is_ok() {
        log_info(&mut stderr, "command failed", mode.no_progress);
    }

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code,
    })
}

/// Render a failure that happened outside an outward operation.
pub(crate) fn format_error_output(mode: OutputMode, kind: &str, error: &InfraError) -> CliOutput {
    let status = StatusKind::from_error(error);
    let api_error = sanitize_api_error(&error_envelope_to_api_v1_error(error, None));

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    CliOutput {
        stdout: format_error_stdout(mode, kind, status, &api_error),
        stderr,
        exit_code: exit_code_for(status, Some(&api_error)),
    }
}

fn format_error_stdout(
    mode: OutputMode,
    kind: &str,
    status: StatusKind,
    error: &ApiV1ErrorDto,
) -> String {
    if mode.is_ndjson() {
        format_ndjson_error(status, kind, error)
    } else if mode.is_json() {
        let payload = serde_json::json!({
            "status": status.as_str(),
            "kind": kind,
            "error": error,
        });

        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut output = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
            "{\"status\":\"internal_error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}".to_string()
        });
        output.push('\n');
        output
    } else {
        format_api_error_text(status, error)
    }
}

/// Map an outward status to the process exit code.
///
/// Unreadable files (config, catalog, store) exit with the I/O code.
pub(crate) fn exit_code_for(status: StatusKind, error: Option<&ApiV1ErrorDto>) -> ExitCode {
    if error.is_some_and(|error| is_io_code(&error.code)) {
        return ExitCode::Io;
    }
    match status {
        StatusKind::Ok => ExitCode::Ok,
        StatusKind::NotFound => ExitCode::NotFound,
        StatusKind::BadInput => ExitCode::InvalidInput,
        StatusKind::InternalError => ExitCode::Internal,
    }
}

fn is_io_code(code: &str) -> bool {
    code == "ERR_CORE_IO" || code.starts_with("ERR_CONFIG_CONFIG_FILE_")
}

fn sanitize_api_error(error: &ApiV1ErrorDto) -> ApiV1ErrorDto {
    let mut error = error.clone();
    if let Some(meta) = error.meta.as_mut() {
        for (key, value) in meta.iter_mut() {
            if is_secret_key(key) {
                *value = "<redacted>".to_string();
            }
        }
    }
    error
}

fn format_api_error_text(status: StatusKind, error: &ApiV1ErrorDto) -> String {
    let mut out = String::new();
    out.push_str("status: ");
    out.push_str(status.as_str());
    out.push('\n');
    out.push_str("code: ");
    out.push_str(&error.code);
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(match error.kind {
        ApiV1ErrorKind::Expected => "EXPECTED",
        ApiV1ErrorKind::Invariant => "INVARIANT",
    });
    out.push('\n');

    if let Some(meta) = error.meta.as_ref().filter(|meta| !meta.is_empty()) {
        out.push_str("meta:\n");
        for (key, value) in meta {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

pub(crate) fn format_ndjson_summary(
    status: &str,
    kind: &str,
    extra: Option<serde_json::Value>,
) -> String {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "type".to_string(),
        serde_json::Value::String("summary".to_string()),
    );
    payload.insert(
        "status".to_string(),
        serde_json::Value::String(status.to_string()),
    );
    payload.insert(
        "kind".to_string(),
        serde_json::Value::String(kind.to_string()),
    );
    if let Some(serde_json::Value::Object(map)) = extra {
        for (key, value) in map {
            payload.insert(key, value);
        }
    }
    let mut out = serde_json::to_string(&serde_json::Value::Object(payload)).unwrap_or_else(|_| {
        "{\"type\":\"summary\",\"status\":\"internal_error\",\"kind\":\"internal\"}".to_string()
    });
    out.push('\n');
    out
}

fn format_ndjson_error(status: StatusKind, kind: &str, error: &ApiV1ErrorDto) -> String {
    let payload = serde_json::json!({
        "type": "error",
        "status": status.as_str(),
        "kind": kind,
        "error": error,
    });
    let mut out = serde_json::to_string(&payload).unwrap_or_else(|_| {
        "{\"type\":\"error\",\"status\":\"internal_error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"INVARIANT\"}}".to_string()
    });
    out.push('\n');
    out
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

pub(crate) fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;
    use cinedex_shared::{ErrorCode, ErrorEnvelope};
    use clap::CommandFactory;

    fn mode(format: OutputFormat) -> OutputMode {
        OutputMode {
            format,
            no_progress: true,
        }
    }

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["cinedex", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::try_parse_from([
            "cinedex",
            "warm",
            "all",
            "--max-concurrency",
            "4",
            "--config",
            "cinedex.toml",
            "--output",
            "ndjson",
        ])?;
        assert_eq!(cli.config.as_deref(), Some(Path::new("cinedex.toml")));
        assert_eq!(cli.output.output, Some(OutputFormat::Ndjson));
        assert!(matches!(
            cli.command,
            Commands::Warm {
                command: WarmCommands::All {
                    max_concurrency: Some(4),
                    ..
                }
            }
        ));
        Ok(())
    }

    #[test]
    fn exit_codes_follow_status() {
        assert_eq!(exit_code_for(StatusKind::Ok, None), ExitCode::Ok);
        assert_eq!(exit_code_for(StatusKind::NotFound, None), ExitCode::NotFound);
        assert_eq!(exit_code_for(StatusKind::BadInput, None), ExitCode::InvalidInput);
        assert_eq!(exit_code_for(StatusKind::InternalError, None), ExitCode::Internal);
    }

    #[test]
    fn unreadable_files_exit_with_the_io_code() {
        let catalog = ErrorEnvelope::expected(ErrorCode::io(), "failed to read catalog file");
        let output = format_error_output(mode(OutputFormat::Text), "detail.get", &catalog);
        assert_eq!(output.exit_code, ExitCode::Io);

        let config = ErrorEnvelope::expected(
            ErrorCode::new("config", "config_file_not_found"),
            "failed to read config file",
        );
        let output = format_error_output(mode(OutputFormat::Json), "config.check", &config);
        assert_eq!(output.exit_code, ExitCode::Io);
    }

    #[test]
    fn error_metadata_secrets_are_redacted() -> Result<(), Box<dyn std::error::Error>> {
        let error = ErrorEnvelope::invalid_input("bad key").with_metadata("apiKey", "sk-live");
        let output = format_error_output(mode(OutputFormat::Json), "config.check", &error);
        assert!(!output.stdout.contains("sk-live"));
        let value: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
        assert_eq!(value["status"], "bad_input");
        assert_eq!(value["error"]["code"], "ERR_CORE_INVALID_INPUT");
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        Ok(())
    }

    #[test]
    fn ok_payloads_render_in_every_format() -> Result<(), Box<dyn std::error::Error>> {
        fn text(value: &u64) -> String {
            format!("removed: {value}\n")
        }
        let response = || (ApiV1Result::ok(3_u64), StatusKind::Ok);
        let renderer = Renderer::text(text);

        let plain = render_response(mode(OutputFormat::Text), "cache.cleanup", response(), &renderer)?;
        assert_eq!(plain.stdout, "status: ok\nremoved: 3\n");

        let json = render_response(mode(OutputFormat::Json), "cache.cleanup", response(), &renderer)?;
        let value: serde_json::Value = serde_json::from_str(&json.stdout)?;
        assert_eq!(value["data"], 3);

        let ndjson =
            render_response(mode(OutputFormat::Ndjson), "cache.cleanup", response(), &renderer)?;
        assert_eq!(ndjson.stdout.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(ndjson.stdout.trim())?;
        assert_eq!(value["type"], "summary");
        assert_eq!(value["kind"], "cache.cleanup");
        Ok(())
    }
}
