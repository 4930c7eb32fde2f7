//! # Smith-Chain Node Runtime
//!
//! Composition root of the node: builds the subsystems, bootstraps genesis
//! and drives the block service from workers and bus events.
//!
//! ## Modular Structure
//!
//! - `container/` - Subsystem container with dependency injection
//! - `handlers/` - Event handlers reacting to the bus
//! - `workers/` - Periodic production and maintenance tasks
//!
//! ## Event Flow
//!
//! ```text
//! peer tx ──→ Mempool(3) ──TransactionAdded──→ ChainEventHandler
//!                                                   │
//!                                 IncompleteQueue(4).satisfy
//!                                                   │
//!                                                   ↓
//! production worker ──try_produce──→ BlockService(6) ──BlockPushed──→ height gauge
//!                                        ↑
//! pool scan worker ──scan_block_pool─────┘
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (from env)
//! 2. Validate the node seed is not the development default
//! 3. Wire subsystems in dependency order
//! 4. Create genesis block (if not exists)
//! 5. Start event handler and workers
//! 6. Signal ready

pub mod container;
pub mod handlers;
pub mod workers;

pub use container::{ChainService, ConfigError, NodeConfig, SubsystemContainer, WorkerConfig};
pub use handlers::ChainEventHandler;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventSubscriber, EventTopic};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The node runtime orchestrating all subsystems.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Create a new node runtime with configuration.
    pub fn new(config: NodeConfig) -> Self {
        Self::with_container(SubsystemContainer::new(config))
    }

    /// Create a runtime around already wired subsystems.
    pub fn with_container(container: SubsystemContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start the node runtime.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Initialize genesis block (if not exists)
    /// 2. Start the chain event handler
    /// 3. Start the periodic workers
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Smith-Chain Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let tip = self
            .container
            .bootstrap_genesis()
            .context("Failed to bootstrap genesis block")?;
        chain_telemetry::set_chain_height(tip.height);

        let handler = ChainEventHandler::new(
            self.container
                .event_bus
                .subscribe(EventFilter::topics(vec![EventTopic::Mempool, EventTopic::Consensus])),
            Arc::clone(&self.container.block_service),
        );
        let mut handler_shutdown = self.shutdown_rx.clone();
        let handler_task = tokio::spawn(async move {
            tokio::select! {
                _ = handler.run() => {}
                _ = handler_shutdown.changed() => {
                    info!("[runtime] Shutdown signal received by event handler");
                }
            }
        });

        let mut tasks = self.tasks.lock();
        tasks.push(handler_task);
        tasks.extend(workers::spawn_workers(
            Arc::clone(&self.container),
            self.shutdown_rx.clone(),
        ));

        info!(
            node_public_key = %hex::encode(self.container.node_public_key()),
            block_height = tip.height,
            "Node started"
        );
        Ok(())
    }

    /// Shutdown the node gracefully.
    ///
    /// Signals every task and waits up to two seconds for each to finish.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(Duration::from_secs(2), task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Task ended abnormally"),
                Err(_) => warn!("Task did not stop in time"),
            }
        }
        match chain_telemetry::gather_metrics() {
            Ok(text) => debug!(metrics = %text, "Final metrics snapshot"),
            Err(e) => warn!(error = %e, "Failed to gather metrics"),
        }
        info!("Shutdown complete");
    }

    /// Get a reference to the subsystem container.
    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }
}
