//! # Periodic Workers
//!
//! Each worker is a tokio task ticking on its own interval until the
//! shutdown signal flips:
//!
//! | Worker | Interval | Work |
//! |--------|----------|------|
//! | `block_production` | `production_interval` | Smith a block once this node's smith time arrives |
//! | `maintenance` | `maintenance_interval` | Expire mempool entries, evict stale incomplete blocks |
//! | `pool_scan` | `pool_scan_interval` | Persist pooled blocks whose window opened |

use crate::container::SubsystemContainer;
use sc_03_mempool::MempoolResult;
use sc_06_consensus::{ConsensusResult, PushOutcome};
use shared_types::Block;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Smith and push a block if this node is due.
pub fn produce_block(container: &SubsystemContainer) -> ConsensusResult<Option<PushOutcome>> {
    let outcome = container
        .block_service
        .try_produce(&container.config.node_seed)?;
    match &outcome {
        Some(PushOutcome::Pushed(block)) => info!(
            block_id = block.id,
            block_height = block.height,
            transactions = block.transactions.len(),
            "[runtime] Block produced"
        ),
        Some(PushOutcome::Pooled { blocksmith_index }) => {
            debug!(blocksmith_index, "[runtime] Produced block waits in the pool")
        }
        None => {}
    }
    Ok(outcome)
}

/// Expire stale mempool entries and incomplete blocks. Returns both counts.
pub fn run_maintenance(container: &SubsystemContainer) -> MempoolResult<(usize, usize)> {
    let expired = container.mempool.expire()?;
    let evicted = container.incomplete_queue.evict_stale();
    if expired > 0 || evicted > 0 {
        debug!(expired, evicted, "[runtime] Maintenance pass");
    }
    Ok((expired, evicted))
}

/// Persist the next pooled block whose turn has come.
pub fn scan_pool(container: &SubsystemContainer) -> ConsensusResult<Option<Block>> {
    container.block_service.scan_block_pool()
}

/// Start every worker.
pub fn spawn_workers(
    container: Arc<SubsystemContainer>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let workers = container.config.workers;
    vec![
        spawn_periodic(
            "block_production",
            workers.production_interval,
            Arc::clone(&container),
            shutdown.clone(),
            produce_block,
        ),
        spawn_periodic(
            "maintenance",
            workers.maintenance_interval,
            Arc::clone(&container),
            shutdown.clone(),
            run_maintenance,
        ),
        spawn_periodic(
            "pool_scan",
            workers.pool_scan_interval,
            container,
            shutdown,
            scan_pool,
        ),
    ]
}

fn spawn_periodic<T, E, F>(
    name: &'static str,
    period: Duration,
    container: Arc<SubsystemContainer>,
    mut shutdown: watch::Receiver<bool>,
    tick: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    E: Display + Send + 'static,
    F: Fn(&SubsystemContainer) -> Result<T, E> + Copy + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(worker = name, period_ms = period.as_millis() as u64, "[runtime] Worker started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // ledger and chain locks are blocking; keep them off the async threads
                    let shared = Arc::clone(&container);
                    let ok = match tokio::task::spawn_blocking(move || tick(&shared)).await {
                        Ok(Ok(_)) => true,
                        Ok(Err(e)) => {
                            warn!(worker = name, error = %e, "[runtime] Worker run failed");
                            false
                        }
                        Err(e) => {
                            warn!(worker = name, error = %e, "[runtime] Worker run aborted");
                            false
                        }
                    };
                    chain_telemetry::record_worker_run(name, ok);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(worker = name, "[runtime] Shutdown signal received");
                        break;
                    }
                }
            }
        }
    })
}
