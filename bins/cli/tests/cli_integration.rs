//! CLI integration tests.
#![allow(missing_docs, reason = "integration test crate")]

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_DIR: AtomicU32 = AtomicU32::new(0);

const CATALOG: &str = r#"[
  {"tconst": "m1", "title": "Blade Runner", "year": 1982, "director": "Ridley Scott"},
  {"tconst": "m2", "title": "Koyaanisqatsi", "year": 1982}
]"#;

struct Workdir(PathBuf);

impl Workdir {
    fn new() -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join(format!(
            "cinedex-cli-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("catalog.json"), CATALOG)?;
        Ok(Self(dir))
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }

    /// Offline overrides: no portrait lookups, catalog and store inside the workdir.
    fn overrides(&self, store: &str) -> String {
        serde_json::json!({
            "store": {
                "provider": store,
                "sqlitePath": self.path("cache.sqlite3").display().to_string(),
            },
            "catalog": { "path": self.path("catalog.json").display().to_string() },
            "providers": { "portrait": { "enabled": false } },
        })
        .to_string()
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn scrub_scoped_env(command: &mut Command) {
    for (key, _) in std::env::vars() {
        if key.starts_with("CINEDEX_") {
            command.env_remove(key);
        }
    }
}

fn run_cli(workdir: &Workdir, store: &str, args: &[&str]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cinedex"));
    scrub_scoped_env(&mut command);
    command
        .current_dir(&workdir.0)
        .arg("--no-progress")
        .arg("--overrides-json")
        .arg(workdir.overrides(store))
        .args(args);
    command.output()
}

fn stdout_json(output: &Output) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn info_reports_the_binary_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cinedex"));
    scrub_scoped_env(&mut command);
    let output = command.args(["info", "--output", "json"]).output()?;
    assert_eq!(output.status.code(), Some(0));
    let value = stdout_json(&output)?;
    assert_eq!(value["status"], "ok");
    assert_eq!(value["build"]["version"], env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[test]
fn config_show_redacts_env_secrets() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    let mut command = Command::new(env!("CARGO_BIN_EXE_cinedex"));
    scrub_scoped_env(&mut command);
    let output = command
        .env("CINEDEX_OPENAI_API_KEY", "sk-never-printed")
        .arg("--overrides-json")
        .arg(workdir.overrides("memory"))
        .args(["config", "show", "--output", "json"])
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains("sk-never-printed"));
    assert!(stdout.contains("[REDACTED]"));
    Ok(())
}

#[test]
fn config_check_rejects_malformed_env() -> Result<(), Box<dyn std::error::Error>> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_cinedex"));
    scrub_scoped_env(&mut command);
    let output = command
        .env("CINEDEX_WARM_MAX_CONCURRENCY", "many")
        .args(["config", "check", "--output", "json"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let value = stdout_json(&output)?;
    assert_eq!(value["status"], "bad_input");
    Ok(())
}

#[test]
fn detail_get_builds_then_hits_the_sqlite_cache() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    let args = ["detail", "get", "m1", "--language", "en", "--output", "json"];

    let first = run_cli(&workdir, "sqlite", &args)?;
    assert_eq!(first.status.code(), Some(0));
    let first = stdout_json(&first)?;
    assert_eq!(first["status"], "ok");
    assert_eq!(first["kind"], "detail.get");
    assert_eq!(first["data"]["fromCache"], false);
    assert_eq!(first["data"]["detail"]["cacheKey"], "m1_en");

    let second = stdout_json(&run_cli(&workdir, "sqlite", &args)?)?;
    assert_eq!(second["data"]["fromCache"], true);

    let stats = stdout_json(&run_cli(&workdir, "sqlite", &["cache", "stats", "--output", "json"])?)?;
    assert_eq!(stats["data"]["total"], 1);
    Ok(())
}

#[test]
fn unknown_subjects_exit_with_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    let output = run_cli(&workdir, "memory", &["detail", "get", "m404", "--output", "json"])?;
    assert_eq!(output.status.code(), Some(4));
    let value = stdout_json(&output)?;
    assert_eq!(value["status"], "not_found");
    assert_eq!(value["error"]["code"], "ERR_CORE_NOT_FOUND");
    Ok(())
}

#[test]
fn unsupported_languages_exit_with_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    let output = run_cli(&workdir, "memory", &["detail", "get", "m1", "--language", "de"])?;
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("status: bad_input\n"));
    Ok(())
}

#[test]
fn a_missing_catalog_is_an_io_failure() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    std::fs::remove_file(workdir.path("catalog.json"))?;
    let output = run_cli(&workdir, "memory", &["cache", "stats", "--output", "json"])?;
    assert_eq!(output.status.code(), Some(3));
    Ok(())
}

#[test]
fn warm_all_streams_one_ndjson_line_per_item() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    let output = run_cli(
        &workdir,
        "memory",
        &["warm", "all", "--max-concurrency", "2", "--output", "ndjson"],
    )?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    let lines: Vec<Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 3);
    let items: Vec<&Value> = lines.iter().filter(|line| line["type"] == "item").collect();
    assert_eq!(items.len(), 2);
    assert_eq!(
        items.first().map(|line| &line["item"]["subjectId"]),
        Some(&Value::from("m1"))
    );
    let summary = lines.last().ok_or("missing summary line")?;
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["kind"], "warm.all");
    assert_eq!(summary["data"]["total"], 2);
    Ok(())
}

#[test]
fn warm_item_rejects_files_that_are_not_json() -> Result<(), Box<dyn std::error::Error>> {
    let workdir = Workdir::new()?;
    let file = workdir.path("item.json");
    std::fs::write(&file, "title = 'not json'")?;
    let output = run_cli(
        &workdir,
        "memory",
        &["warm", "item", "--file", path_str(&file)?, "--output", "json"],
    )?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)?["status"], "bad_input");
    Ok(())
}

fn path_str(path: &Path) -> Result<&str, Box<dyn std::error::Error>> {
    path.to_str().ok_or_else(|| "non-utf8 temp path".into())
}
