//! netinv-syncd - applies device polls to the inventory
//!
//! Loads the policy file and a JSON store snapshot, runs one command against
//! the interface manager and writes the snapshot back when it changed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netinv_core::model::DeviceId;
use netinv_core::{
    format_speed, DiscoveryEntry, InterfaceMgr, InventoryConfig, MemoryStore, ReconcileOptions,
    DEFAULT_CONFIG_PATH,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Network inventory sync tool
#[derive(Parser, Debug)]
#[command(name = "netinv-syncd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Policy file (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Inventory snapshot (JSON), created if missing
    #[arg(short, long, default_value = "netinv-store.json")]
    store: PathBuf,

    /// Log level used when RUST_LOG is unset
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile one device poll
    Sync {
        /// Poll file (JSON) with the device id and discovered interfaces
        poll: PathBuf,

        /// Reconcile without writing the snapshot back
        #[arg(long)]
        dry_run: bool,
    },
    /// List linked interfaces that disagree on duplex
    Duplex {
        /// Include devices on the ignore list
        #[arg(long)]
        all: bool,
    },
    /// Link two interfaces as neighbors
    Link {
        a: u64,
        b: u64,
        /// Pin the link against automatic changes
        #[arg(long)]
        fixed: bool,
    },
    /// Clear an interface's neighbor
    Unlink { id: u64 },
    /// Format a speed in bits per second
    Speed { bps: u64 },
}

/// Contents of a poll file.
#[derive(Debug, Deserialize)]
struct DevicePoll {
    device: DeviceId,
    /// Overrides the options derived from the policy file.
    #[serde(default)]
    options: Option<ReconcileOptions>,
    #[serde(default)]
    interfaces: Vec<DiscoveryEntry>,
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    if path.exists() {
        MemoryStore::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        info!(path = %path.display(), "No snapshot yet, starting empty");
        Ok(MemoryStore::new())
    }
}

fn load_poll(path: &Path) -> Result<DevicePoll> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

async fn run(args: Args) -> Result<()> {
    if let Command::Speed { bps } = args.command {
        println!("{}", format_speed(bps));
        return Ok(());
    }

    let config = InventoryConfig::load_or_default(&args.config)?;
    let store = Arc::new(load_store(&args.store)?);
    let mgr = InterfaceMgr::new(Arc::clone(&store), config);

    let dirty = match args.command {
        Command::Sync { poll, dry_run } => {
            let poll = load_poll(&poll)?;
            let options = poll.options.unwrap_or_else(|| mgr.default_options());
            let report = mgr
                .reconcile_batch(poll.device, &poll.interfaces, options)
                .await?;

            for outcome in &report.outcomes {
                for warning in &outcome.warnings {
                    println!("{}: {}", outcome.interface.name, warning);
                }
            }
            for failure in &report.failures {
                println!("interface {}: {}", failure.interface, failure.error);
            }
            if report.ipv4_changed || report.ipv6_changed {
                info!(
                    ipv4 = report.ipv4_changed,
                    ipv6 = report.ipv6_changed,
                    "Address trees need rebuilding"
                );
            }
            if !report.failures.is_empty() {
                warn!(failed = report.failures.len(), "Some interfaces were not reconciled");
            }
            !dry_run
        }
        Command::Duplex { all } => {
            for (a, b) in mgr.find_duplex_mismatches(!all).await? {
                let (ia, ib) = (mgr.get(a).await?, mgr.get(b).await?);
                println!(
                    "{} ({}) <-> {} ({})",
                    ia.name,
                    ia.oper_duplex.map_or("unknown", |d| d.as_str()),
                    ib.name,
                    ib.oper_duplex.map_or("unknown", |d| d.as_str()),
                );
            }
            false
        }
        Command::Link { a, b, fixed } => {
            mgr.add_neighbor(a, b, fixed).await?;
            true
        }
        Command::Unlink { id } => {
            mgr.remove_neighbor(id).await?;
            true
        }
        Command::Speed { .. } => false,
    };

    if dirty {
        store
            .save(&args.store)
            .with_context(|| format!("writing {}", args.store.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netinv_core::model::Device;
    use netinv_core::{NewInterface, Store};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "netinv-syncd",
            "--store",
            "/tmp/inv.json",
            "link",
            "3",
            "4",
            "--fixed",
        ])
        .unwrap();

        assert_eq!(args.store, PathBuf::from("/tmp/inv.json"));
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(matches!(
            args.command,
            Command::Link {
                a: 3,
                b: 4,
                fixed: true
            }
        ));
    }

    #[test]
    fn test_poll_file_parse() {
        let poll: DevicePoll = serde_json::from_str(
            r#"{
                "device": 1,
                "interfaces": [
                    { "interface": 2, "record": { "info": { "oper_status": "up" } } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(poll.device, 1);
        assert!(poll.options.is_none());
        assert_eq!(poll.interfaces[0].interface, 2);
        assert_eq!(
            poll.interfaces[0].record.info.oper_status.as_deref(),
            Some("up")
        );
    }

    #[tokio::test]
    async fn test_sync_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("inv.json");
        let poll_path = dir.path().join("poll.json");

        let store = Arc::new(MemoryStore::new());
        let device = store.add_device(Device::new(0, "sw1"));
        let mgr = InterfaceMgr::new(Arc::clone(&store), InventoryConfig::default());
        let iface = mgr
            .create(NewInterface::new(device.id, "Gi0/1"))
            .await
            .unwrap();
        store.save(&store_path).unwrap();

        let poll = format!(
            r#"{{ "device": {}, "interfaces": [
                {{ "interface": {}, "record": {{ "vlans": {{ "10": {{ "name": "users" }} }} }} }}
            ] }}"#,
            device.id, iface.id
        );
        fs::write(&poll_path, poll).unwrap();

        let args = Args {
            config: dir.path().join("absent.toml"),
            store: store_path.clone(),
            log_level: "info".to_string(),
            command: Command::Sync {
                poll: poll_path,
                dry_run: false,
            },
        };
        run(args).await.unwrap();

        let saved = MemoryStore::load(&store_path).unwrap();
        assert_eq!(saved.interface_vlans(iface.id).await.unwrap().len(), 1);
    }
}
