use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;
use tracing::{error, info};

mod config;
mod watch;

use crate::config::GatewayConfig;
use dabgw_node::confirm::Orchestrator;
use dabgw_node::registry::CsvDeviceSource;
use dabgw_node::retry::{run_retry_loop, RetryConfig};
use dabgw_node::sender::load_or_create_sender_id;
use dabgw_node::signal::FixedSignalSource;
use dabgw_node::store::SharedStore;
use dabgw_onboard::OnboardServer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Device registry CSV (overrides configuration)
    #[arg(long)]
    devices: Option<PathBuf>,
    /// Watched message directory (overrides configuration)
    #[arg(long)]
    folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let filter = std::env::var("DABGW_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let mut config = match GatewayConfig::new(cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!("failed to load config: {err}");
            std::process::exit(1);
        }
    };
    if let Some(devices) = cli.devices {
        config.devices_csv = devices;
    }
    if let Some(folder) = cli.folder {
        config.watch_dir = folder;
    }

    let registry = CsvDeviceSource::new(&config.devices_csv);
    match registry.validate() {
        Ok(count) => info!(
            "device registry {} holds {count} devices",
            config.devices_csv.display()
        ),
        Err(err) => {
            error!(
                "fatal: device registry {}: {err}",
                config.devices_csv.display()
            );
            std::process::exit(1);
        }
    }

    let sender = match load_or_create_sender_id(&config.sender_id_path) {
        Ok(id) => id,
        Err(err) => {
            error!("fatal: sender id unavailable: {err}");
            std::process::exit(1);
        }
    };
    info!("gateway sender id {sender}");

    let store = SharedStore::default();
    let orchestrator = Arc::new(
        Orchestrator::new(
            store.clone(),
            Arc::new(registry),
            Arc::new(FixedSignalSource(config.dab_signal)),
            sender,
        )
        .with_wifi_label(&config.wifi_technology),
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let _ = flag::register(SIGTERM, Arc::clone(&shutdown));
    let _ = flag::register(SIGINT, Arc::clone(&shutdown));

    if config.onboard_port != 0 {
        let bind = format!("{}:{}", config.onboard_bind, config.onboard_port);
        match tokio::net::TcpListener::bind(&bind).await {
            Ok(listener) => {
                info!("onboard interface listening on {bind}");
                tokio::spawn(OnboardServer::new(store.clone()).serve(listener));
            }
            Err(err) => {
                error!("fatal: onboard interface bind failed on {bind}: {err}");
                std::process::exit(1);
            }
        }
    }

    let watcher = tokio::spawn(watch::run_watcher(
        Arc::clone(&orchestrator),
        config.watch_dir.clone(),
        config.watch_interval,
        Arc::clone(&shutdown),
    ));

    info!("monitoring {} started", config.watch_dir.display());
    run_retry_loop(
        orchestrator,
        RetryConfig {
            tick_interval: config.tick_interval,
            attempt_timeout: config.attempt_timeout,
        },
        Arc::clone(&shutdown),
    )
    .await;

    let _ = watcher.await;
    info!("monitoring stopped");
}
