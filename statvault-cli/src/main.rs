//! statvault command-line tool
//!
//! Records and inspects encrypted monthly statistics without going through
//! the host application.
//!
//! Usage:
//!   statvault --config statvault.json show main
//!   STATVAULT_MASTER_SECRET=... statvault --db stats.db battle main
//!
//! Logs go to stderr (RUST_LOG overrides the level); command output goes to
//! stdout.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{Parser, Subcommand};
use statvault_cli::{MASTER_SECRET_ENV, StatsView, render_audit, resolve_config, unhealthy_count};
use statvault_storage::{Month, Store};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "statvault")]
#[command(about = "Encrypted per-instance monthly statistics")]
struct Args {
    /// JSON config file (path, master_secret, kdf, busy_timeout_ms)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long)]
    db: Option<PathBuf>,

    /// Master secret, overriding the config
    #[arg(long, env = MASTER_SECRET_ENV, hide_env_values = true)]
    master_secret: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the statistics of one instance and month as JSON
    Show {
        instance: String,
        /// Month as YYYY-MM (default: current UTC month)
        #[arg(short, long)]
        month: Option<String>,
        /// Print the stored blob as base64 instead of decrypting it
        #[arg(long)]
        raw: bool,
    },
    /// List the months stored for an instance
    Months { instance: String },
    /// Check every stored row; exits non-zero if any is unreadable
    Audit,
    /// Record one battle in the current month
    Battle { instance: String },
    /// Record an AP gain in the current month
    AddAp {
        instance: String,
        amount: u64,
        #[arg(long, default_value = "0")]
        base: u64,
        #[arg(long, default_value = "1")]
        count: u64,
        #[arg(long, default_value = "akashi")]
        source: String,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = resolve_config(args.config.as_deref(), args.db, args.master_secret)?;
    let store = Store::open(config).context("Failed to open stats store")?;

    run(&store, args.command)
}

fn run(store: &Store, command: Command) -> Result<ExitCode> {
    match command {
        Command::Show {
            instance,
            month,
            raw,
        } => {
            let month: Month = match month {
                Some(m) => m.parse().with_context(|| format!("Invalid month {m:?}"))?,
                None => store.current_month()?,
            };
            let key = month.to_string();

            if raw {
                match store.raw_blob(&instance, &key)? {
                    Some(blob) => println!("{}", STANDARD.encode(blob)),
                    None => {
                        warn!("No row for {} {}", instance, key);
                        return Ok(ExitCode::FAILURE);
                    }
                }
            } else {
                let record = store.get_stats(&instance, &key)?;
                let view = StatsView::new(&instance, month, &record);
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
        }
        Command::Months { instance } => {
            for month in store.list_months(&instance)? {
                println!("{month}");
            }
        }
        Command::Audit => {
            let report = store.audit()?;
            print!("{}", render_audit(&report));
            let bad = unhealthy_count(&report);
            if bad > 0 {
                warn!("{} of {} rows unreadable", bad, report.len());
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Battle { instance } => {
            store.increment_battle_count(&instance)?;
            info!("Recorded battle for {}", instance);
        }
        Command::AddAp {
            instance,
            amount,
            base,
            count,
            source,
        } => {
            store.add_akashi_ap_entry(&instance, amount, base, count, &source)?;
            info!("Recorded {} AP for {} from {}", amount, instance, source);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_ap() {
        let args = Args::try_parse_from([
            "statvault", "--db", "stats.db", "add-ap", "main", "120", "--base", "60", "--count",
            "2",
        ])
        .unwrap();

        assert_eq!(args.db, Some(PathBuf::from("stats.db")));
        match args.command {
            Command::AddAp {
                instance,
                amount,
                base,
                count,
                source,
            } => {
                assert_eq!(instance, "main");
                assert_eq!((amount, base, count), (120, 60, 2));
                assert_eq!(source, "akashi");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_show_with_month() {
        let args =
            Args::try_parse_from(["statvault", "-c", "cfg.json", "show", "main", "-m", "2026-02"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("cfg.json")));
        assert!(matches!(
            args.command,
            Command::Show { ref month, raw: false, .. } if month.as_deref() == Some("2026-02")
        ));
    }

    #[test]
    fn requires_subcommand() {
        assert!(Args::try_parse_from(["statvault", "--db", "stats.db"]).is_err());
    }

    #[test]
    fn run_against_temp_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = statvault_storage::StoreConfig::new(dir.path().join("s.db"), "long enough")
            .with_kdf(statvault_storage::KdfParams {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
            });
        let store = Store::open(config).unwrap();

        run(&store, Command::Battle { instance: "main".into() }).unwrap();
        assert_eq!(store.get_current_stats("main").unwrap().battle_count, 1);
        assert_eq!(run(&store, Command::Audit).unwrap(), ExitCode::SUCCESS);

        let show_raw = |instance: &str| Command::Show {
            instance: instance.into(),
            month: None,
            raw: true,
        };
        assert_eq!(run(&store, show_raw("main")).unwrap(), ExitCode::SUCCESS);
        assert_eq!(run(&store, show_raw("nobody")).unwrap(), ExitCode::FAILURE);
    }
}
