//! Shared pieces of the `statvault` command-line tool.
//!
//! Config resolution and report rendering live here so they can be tested
//! without spawning the binary.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use statvault_storage::{AuditEntry, Month, RowHealth, StatsRecord, StoreConfig};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Environment variable holding the master secret.
pub const MASTER_SECRET_ENV: &str = "STATVAULT_MASTER_SECRET";

/// Builds a store config from a JSON file, explicit flags, or both.
///
/// Flags win over the file. Without a file both `db` and `secret` are required.
pub fn resolve_config(
    config_file: Option<&Path>,
    db: Option<PathBuf>,
    secret: Option<String>,
) -> Result<StoreConfig> {
    let mut config = match config_file {
        Some(file) => StoreConfig::from_json_file(file)
            .with_context(|| format!("Failed to load config {}", file.display()))?,
        None => {
            let Some(path) = db.clone() else {
                bail!("either --config or --db is required");
            };
            let Some(secret) = secret.clone() else {
                bail!("master secret missing: pass --master-secret or set {MASTER_SECRET_ENV}");
            };
            StoreConfig::new(path, secret)
        }
    };

    if let Some(path) = db {
        config.path = path;
    }
    if let Some(secret) = secret {
        config.master_secret = secret.into();
    }
    Ok(config)
}

/// JSON shape printed by `statvault show`.
#[derive(Debug, Serialize)]
pub struct StatsView<'a> {
    pub instance: &'a str,
    pub month: String,
    #[serde(flatten)]
    pub record: &'a StatsRecord,
    pub ap_by_source: BTreeMap<&'a str, u64>,
}

impl<'a> StatsView<'a> {
    pub fn new(instance: &'a str, month: Month, record: &'a StatsRecord) -> Self {
        Self {
            instance,
            month: month.to_string(),
            ap_by_source: record.entries_by_source(),
            record,
        }
    }
}

fn health_label(health: RowHealth) -> &'static str {
    match health {
        RowHealth::Valid => "ok",
        RowHealth::AuthenticationFailure => "AUTH-FAIL",
        RowHealth::Malformed => "MALFORMED",
    }
}

/// Renders an audit report as aligned text, one row per line.
pub fn render_audit(report: &[AuditEntry]) -> String {
    let width = report
        .iter()
        .map(|e| e.instance.len())
        .max()
        .unwrap_or(0)
        .max("INSTANCE".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  MONTH    BYTES  STATUS", "INSTANCE");
    for entry in report {
        let _ = writeln!(
            out,
            "{:<width$}  {}  {:>5}  {}",
            entry.instance,
            entry.month,
            entry.blob_len,
            health_label(entry.health)
        );
    }
    out
}

/// Number of rows in `report` that are not readable.
pub fn unhealthy_count(report: &[AuditEntry]) -> usize {
    report
        .iter()
        .filter(|e| e.health != RowHealth::Valid)
        .count()
}
