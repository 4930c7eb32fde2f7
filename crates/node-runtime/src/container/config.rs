//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Security Requirements
//!
//! - `node_seed` MUST NOT be the all-zero value in production
//! - All timeouts and limits have sane defaults with override capability

use sc_03_mempool::MempoolConfig;
use sc_04_incomplete_queue::IncompleteQueueConfig;
use sc_06_consensus::{ConsensusConfig, GenesisAccount, GenesisConfig, GenesisNode};
use shared_crypto::{Ed25519NodeSigner, NodeSigner};
use shared_types::{Hash, Timestamp};
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Development chain start, 2024-01-01T00:00:00Z.
const DEV_GENESIS_TIMESTAMP: Timestamp = 1_704_067_200;
const DEV_GENESIS_SEED: Hash = *b"smith-chain development genesis!";
const DEV_ACCOUNT_BALANCE: i64 = 1_000_000_000;
const DEV_LOCKED_BALANCE: i64 = 100_000;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Secret seed of this node's signing key.
    pub node_seed: [u8; 32],
    pub consensus: ConsensusConfig,
    pub mempool: MempoolConfig,
    pub incomplete_queue: IncompleteQueueConfig,
    pub workers: WorkerConfig,
    /// Chain the node bootstraps when storage is empty.
    pub genesis: GenesisConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::development([0; 32])
    }
}

impl NodeConfig {
    /// A single-node development chain in which `node_seed` is the only
    /// genesis blocksmith and its own key funds the owner account.
    pub fn development(node_seed: [u8; 32]) -> Self {
        Self {
            node_seed,
            consensus: ConsensusConfig::default(),
            mempool: MempoolConfig::default(),
            incomplete_queue: IncompleteQueueConfig::default(),
            workers: WorkerConfig::default(),
            genesis: development_genesis(&node_seed),
        }
    }

    /// Defaults overridden from `SC_*` environment variables.
    ///
    /// - `SC_NODE_SEED`: 64 hex chars
    /// - `SC_GENESIS_TIMESTAMP`: Unix seconds of the development genesis
    /// - `SC_PRODUCTION_INTERVAL_MS`, `SC_MAINTENANCE_INTERVAL_MS`,
    ///   `SC_POOL_SCAN_INTERVAL_MS`: worker periods
    /// - `SC_MAX_ROLLBACK_DEPTH`, `SC_MEMPOOL_EXPIRY_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let node_seed = match env::var("SC_NODE_SEED") {
            Ok(value) => parse_seed(&value)?,
            Err(_) => {
                warn!("SC_NODE_SEED not set, using the development seed");
                [0; 32]
            }
        };
        let mut config = Self::development(node_seed);

        if let Some(timestamp) = env_number("SC_GENESIS_TIMESTAMP")? {
            config.genesis.timestamp = timestamp;
        }
        if let Some(ms) = env_number("SC_PRODUCTION_INTERVAL_MS")? {
            config.workers.production_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_number("SC_MAINTENANCE_INTERVAL_MS")? {
            config.workers.maintenance_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_number("SC_POOL_SCAN_INTERVAL_MS")? {
            config.workers.pool_scan_interval = Duration::from_millis(ms);
        }
        if let Some(depth) = env_number("SC_MAX_ROLLBACK_DEPTH")? {
            config.consensus.max_rollback_depth = depth;
        }
        if let Some(secs) = env_number("SC_MEMPOOL_EXPIRY_SECS")? {
            config.mempool.expiry_seconds = secs;
        }

        info!(
            genesis_timestamp = config.genesis.timestamp,
            production_ms = config.workers.production_interval.as_millis() as u64,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Validate configuration for production readiness.
    ///
    /// # Returns
    ///
    /// Returns `Err` if:
    /// - the node seed is the all-zero development seed
    /// - a worker interval is zero
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.node_seed == [0u8; 32] {
            return Err(ConfigError::InsecureNodeSeed);
        }
        self.workers.validate()
    }
}

/// Periods of the runtime workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// How often the production worker checks for its smith time.
    pub production_interval: Duration,
    /// Period of mempool expiry and incomplete-queue pruning.
    pub maintenance_interval: Duration,
    /// Period of the block pool scan.
    pub pool_scan_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            production_interval: Duration::from_millis(500),
            maintenance_interval: Duration::from_secs(5),
            pool_scan_interval: Duration::from_millis(500),
        }
    }
}

impl WorkerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("production_interval", self.production_interval),
            ("maintenance_interval", self.maintenance_interval),
            ("pool_scan_interval", self.pool_scan_interval),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                return Err(ConfigError::ZeroInterval(name));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "SECURITY VIOLATION: node seed is the all-zero development value. \
         Set SC_NODE_SEED environment variable."
    )]
    InsecureNodeSeed,

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("Worker interval {0} must be non-zero")]
    ZeroInterval(&'static str),
}

fn development_genesis(node_seed: &[u8; 32]) -> GenesisConfig {
    let node_public_key = Ed25519NodeSigner::new().public_key_from_seed(node_seed);
    GenesisConfig {
        timestamp: DEV_GENESIS_TIMESTAMP,
        block_seed: DEV_GENESIS_SEED,
        accounts: vec![GenesisAccount {
            address: node_public_key,
            balance: DEV_ACCOUNT_BALANCE,
        }],
        nodes: vec![GenesisNode {
            account_address: node_public_key,
            node_public_key,
            locked_balance: DEV_LOCKED_BALANCE,
        }],
    }
}

fn parse_seed(value: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(value.trim()).map_err(|e| ConfigError::InvalidValue {
        name: "SC_NODE_SEED",
        reason: e.to_string(),
    })?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| ConfigError::InvalidValue {
            name: "SC_NODE_SEED",
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })
}

fn env_number(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_rejected_for_production() {
        let config = NodeConfig::default();
        assert_eq!(
            config.validate_for_production(),
            Err(ConfigError::InsecureNodeSeed)
        );
        assert!(NodeConfig::development([9; 32]).validate_for_production().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = NodeConfig::development([9; 32]);
        config.workers.pool_scan_interval = Duration::ZERO;
        assert_eq!(
            config.validate_for_production(),
            Err(ConfigError::ZeroInterval("pool_scan_interval"))
        );
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed(&"ab".repeat(32)).unwrap(), [0xAB; 32]);
        assert!(matches!(
            parse_seed("abcd"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(parse_seed("not hex").is_err());
    }

    #[test]
    fn test_development_genesis_registers_own_node() {
        let config = NodeConfig::development([5; 32]);
        let key = Ed25519NodeSigner::new().public_key_from_seed(&[5; 32]);
        assert_eq!(config.genesis.nodes.len(), 1);
        assert_eq!(config.genesis.nodes[0].node_public_key, key);
        assert_eq!(config.genesis.accounts[0].address, key);
    }
}
