// Pipeline startup and shutdown using ServiceManager

use crate::analysis::{PatternAnalyzer, PlaceholderAnalyzer, WhaleMovementAnalyzer};
use crate::config::{self, Config};
use crate::connectivity::{HealthCheckResult, HealthMonitor, RpcHealthProbe};
use crate::database::{MemoryStore, Persistence, SqliteStore};
use crate::ingestion::{Poller, PollerConfig};
use crate::logger::{self, LogTag};
use crate::notifications::{MultiChannelNotifier, NotificationSender};
use crate::rpc::{Connector, ConnectionManager, EndpointRegistry, HttpConnector};
use crate::services::implementations::{HealthMonitorService, IngestionService};
use crate::services::ServiceManager;
use crate::wallets::{ClassifierConfig, WalletClassifier, WalletStateStore};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// Startup options taken from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_path: Option<PathBuf>,
    /// Keep everything in memory, nothing is written to disk
    pub dry_run: bool,
}

impl From<&crate::arguments::Arguments> for RunOptions {
    fn from(args: &crate::arguments::Arguments) -> Self {
        Self {
            config_path: args.config.as_ref().map(PathBuf::from),
            dry_run: args.dry_run,
        }
    }
}

/// Load, validate and install the configuration
pub fn load_and_init_config(options: &RunOptions) -> Result<Config> {
    let config = match &options.config_path {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    }
    .context("Failed to load configuration")?;

    config::init_config(config.clone()).context("Failed to install configuration")?;
    Ok(config)
}

/// Open the store the pipeline writes to
pub fn open_store(config: &Config, dry_run: bool) -> Result<Arc<dyn Persistence>> {
    if dry_run {
        logger::info(LogTag::Database, "Dry run: keeping all state in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = if config.database.path.is_empty() {
        crate::paths::get_database_path()
    } else {
        PathBuf::from(&config.database.path)
    };
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    logger::info(
        LogTag::Database,
        &format!("Database opened at {}", path.display()),
    );
    Ok(Arc::new(store))
}

/// Registry from the persisted snapshot when there is one, else from config
pub async fn build_registry(config: &Config, store: &dyn Persistence) -> Arc<EndpointRegistry> {
    if !config.database.persist_endpoints {
        return Arc::new(EndpointRegistry::from_config(&config.rpc.endpoints));
    }

    let persisted = match store.load_endpoints().await {
        Ok(persisted) => persisted,
        Err(e) => {
            logger::warning(
                LogTag::Database,
                &format!("Failed to load persisted endpoints, using config: {}", e),
            );
            Vec::new()
        }
    };

    let registry = if persisted.is_empty() {
        EndpointRegistry::from_config(&config.rpc.endpoints)
    } else {
        logger::info(
            LogTag::Rpc,
            &format!("Loaded {} persisted endpoints", persisted.len()),
        );
        EndpointRegistry::from_persisted(persisted, &config.rpc.endpoints)
    };

    if let Err(e) = store.save_endpoints(&registry.snapshot()).await {
        logger::warning(
            LogTag::Database,
            &format!("Failed to persist endpoint registry: {}", e),
        );
    }
    Arc::new(registry)
}

fn build_analyzer(config: &Config, store: Arc<dyn Persistence>) -> Arc<dyn PatternAnalyzer> {
    if config.analysis.detect_whale_movements {
        logger::info(
            LogTag::Analysis,
            &format!(
                "Whale movement detection enabled (>= {} within {}m)",
                config.analysis.min_whale_transaction, config.analysis.time_window_minutes
            ),
        );
        Arc::new(WhaleMovementAnalyzer::new(
            store,
            config.analysis.time_window_minutes,
            config.analysis.min_whale_transaction,
        ))
    } else {
        Arc::new(PlaceholderAnalyzer)
    }
}

fn build_notifier(config: &Config) -> Arc<dyn NotificationSender> {
    let notifier = MultiChannelNotifier::from_config(&config.notifications);
    let channels = notifier.channel_names();
    if channels.is_empty() {
        logger::info(
            LogTag::Notifications,
            "No notification channels configured, alerts go to the log",
        );
    } else {
        logger::info(
            LogTag::Notifications,
            &format!("Notification channels: {}", channels.join(", ")),
        );
    }
    Arc::new(notifier)
}

/// Probe every configured endpoint once
pub async fn check_endpoints(config: &Config) -> Vec<(String, HealthCheckResult)> {
    let registry = Arc::new(EndpointRegistry::from_config(&config.rpc.endpoints));
    let connector: Arc<dyn Connector> = Arc::new(HttpConnector::from_config(config));
    HealthMonitor::new(registry, Arc::new(RpcHealthProbe::new(connector)))
        .check_all()
        .await
}

/// Main pipeline execution: wire components, run services until Ctrl-C
pub async fn run_bot(options: RunOptions) -> Result<()> {
    logger::info(LogTag::System, "WhaleWatch starting up...");

    let config = load_and_init_config(&options)?;
    logger::info(
        LogTag::Config,
        &format!(
            "Monitoring {} programs, {} endpoints configured",
            config.monitor.programs.len(),
            config.rpc.endpoints.len()
        ),
    );

    let store = open_store(&config, options.dry_run)?;
    let registry = build_registry(&config, store.as_ref()).await;
    let connector: Arc<dyn Connector> = Arc::new(HttpConnector::from_config(&config));

    let connections = Arc::new(
        ConnectionManager::connect(registry.clone(), connector.clone())
            .await
            .context("Failed to establish an upstream connection")?,
    );

    let classifier = Arc::new(WalletClassifier::new(
        ClassifierConfig::from(&config.thresholds),
        Arc::new(WalletStateStore::new()),
        store.clone(),
        build_analyzer(&config, store.clone()),
        build_notifier(&config),
    ));

    let poller = Arc::new(Poller::new(
        PollerConfig::from(&config),
        connections,
        classifier,
    ));

    let mut monitor = HealthMonitor::new(registry, Arc::new(RpcHealthProbe::new(connector)));
    if config.database.persist_endpoints {
        monitor = monitor.with_persistence(store);
    }

    let mut service_manager = ServiceManager::new(config.clone());
    service_manager.register(Box::new(HealthMonitorService::new(
        Arc::new(monitor),
        Duration::from_secs(config.connectivity.check_interval_secs),
    )));
    service_manager.register(Box::new(IngestionService::new(
        poller,
        Duration::from_secs(config.rpc.poll_interval_secs),
    )));

    service_manager
        .start_all()
        .await
        .map_err(|e| anyhow!("Failed to start services: {}", e))?;
    logger::info(LogTag::System, "All services started - WhaleWatch is running");

    wait_for_shutdown_signal().await?;

    logger::info(LogTag::System, "Initiating graceful shutdown...");
    for (name, health) in service_manager.get_health().await {
        logger::debug(LogTag::System, &format!("{}: {}", name, health));
    }
    service_manager
        .stop_all()
        .await
        .map_err(|e| anyhow!("Failed to stop services: {}", e))?;

    logger::info(LogTag::System, "WhaleWatch shut down successfully");
    logger::flush();
    Ok(())
}

/// Wait for Ctrl-C; a second Ctrl-C exits immediately
async fn wait_for_shutdown_signal() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<()>();
    let presses = AtomicUsize::new(0);

    ctrlc::set_handler(move || {
        if presses.fetch_add(1, Ordering::SeqCst) > 0 {
            eprintln!("Second Ctrl+C detected, forcing immediate exit.");
            // 130 is the conventional exit code for SIGINT
            std::process::exit(130);
        }
        let _ = tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    logger::info(
        LogTag::System,
        "Waiting for shutdown signal (press Ctrl+C twice to force kill)",
    );
    rx.recv().await;
    logger::warning(LogTag::System, "Shutdown signal received");
    Ok(())
}
