//! # Consensus Domain
//!
//! Pure consensus rules: configuration, errors, difficulty and persist
//! windows, participation scoring, genesis construction and node scrambling.

pub mod config;
pub mod difficulty;
pub mod errors;
pub mod genesis;
pub mod participation;
pub mod scramble;

pub use config::ConsensusConfig;
pub use difficulty::{cumulative_difficulty, persist_window, PersistWindow};
pub use errors::{ConsensusError, ConsensusResult};
pub use genesis::{build_genesis_block, GenesisAccount, GenesisConfig, GenesisNode};
pub use participation::{clamp_score, lottery_shares, participation_delta};
pub use scramble::{scramble_nodes, ScrambledNodes};
