//! # Node Registry Maintenance
//!
//! Chain-advancement side effects applied inside a block push: participation
//! scores, lottery rewards, expulsion and admission of nodes.

use crate::domain::{clamp_score, lottery_shares, ConsensusConfig, ConsensusError, ConsensusResult};
use crate::ports::Blocksmith;
use sc_01_ledger_store::LedgerWrite;
use shared_types::entities::*;
use tracing::{debug, info};

/// Penalizes every blocksmith ordered before the producer and rewards the
/// producer with `delta`.
pub fn update_participation_scores(
    ledger: &mut dyn LedgerWrite,
    blocksmiths: &[Blocksmith],
    producer: &PublicKey,
    delta: i64,
    height: u64,
    config: &ConsensusConfig,
) -> ConsensusResult<()> {
    let position = blocksmiths
        .iter()
        .position(|smith| &smith.node_public_key == producer)
        .ok_or(ConsensusError::BlocksmithNotFound(*producer))?;

    for (index, skipped) in blocksmiths[..position].iter().enumerate() {
        add_score(ledger, skipped.node_id, -config.max_score_change, height, config)?;
        ledger.insert_skipped_blocksmith(&SkippedBlocksmith {
            blocksmith_public_key: skipped.node_public_key,
            pop_change: -config.max_score_change,
            block_height: height,
            blocksmith_index: index as u32,
        })?;
    }
    if position > 0 {
        debug!(height, skipped = position, "[sc-06] Skipped blocksmiths penalized");
    }
    add_score(ledger, blocksmiths[position].node_id, delta, height, config)
}

fn add_score(
    ledger: &mut dyn LedgerWrite,
    node_id: NodeId,
    delta: i64,
    height: u64,
    config: &ConsensusConfig,
) -> ConsensusResult<()> {
    let current = ledger.participation_score(node_id)?.map_or(0, |s| s.score);
    ledger.put_participation_score(&ParticipationScore {
        node_id,
        score: clamp_score(current + delta, config.max_participation_score),
        height,
    })?;
    Ok(())
}

/// Splits `reward` among the owners of the first `winners` blocksmiths.
pub fn distribute_rewards(
    ledger: &mut dyn LedgerWrite,
    blocksmiths: &[Blocksmith],
    reward: i64,
    winners: usize,
    height: u64,
) -> ConsensusResult<()> {
    let winners = &blocksmiths[..winners.min(blocksmiths.len())];
    if winners.is_empty() || reward == 0 {
        return Ok(());
    }
    for (smith, share) in winners.iter().zip(lottery_shares(reward, winners.len())) {
        ledger.add_account_balance(&smith.account_address, share, share, share, height)?;
    }
    Ok(())
}

/// Deletes every registered node whose participation score reached zero and
/// returns its locked balance to the owner.
pub fn expel_nodes(ledger: &mut dyn LedgerWrite, height: u64) -> ConsensusResult<usize> {
    let mut expelled = 0;
    for mut registration in ledger.node_registrations_by_status(RegistrationStatus::Registered)? {
        let score = ledger
            .participation_score(registration.node_id)?
            .map_or(0, |s| s.score);
        if score > 0 {
            continue;
        }
        let refund = registration.locked_balance;
        registration.locked_balance = 0;
        registration.registration_status = RegistrationStatus::Deleted;
        registration.height = height;
        ledger.put_node_registration(&registration)?;
        ledger.add_account_balance(&registration.account_address, refund, refund, 0, height)?;
        info!(
            node_id = registration.node_id,
            refund, height, "[sc-06] Node expelled"
        );
        expelled += 1;
    }
    Ok(expelled)
}

/// Registers up to `config.max_node_admittance` queued nodes, highest locked
/// balance first, with the default participation score.
pub fn admit_nodes(
    ledger: &mut dyn LedgerWrite,
    height: u64,
    config: &ConsensusConfig,
) -> ConsensusResult<usize> {
    let mut queued = ledger.node_registrations_by_status(RegistrationStatus::Queued)?;
    queued.sort_by(|a, b| {
        b.locked_balance
            .cmp(&a.locked_balance)
            .then(a.node_id.cmp(&b.node_id))
    });
    queued.truncate(config.max_node_admittance);

    for registration in &mut queued {
        registration.registration_status = RegistrationStatus::Registered;
        registration.height = height;
        ledger.put_node_registration(registration)?;
        ledger.put_participation_score(&ParticipationScore {
            node_id: registration.node_id,
            score: config.default_participation_score,
            height,
        })?;
    }
    if !queued.is_empty() {
        info!(count = queued.len(), height, "[sc-06] Nodes admitted");
    }
    Ok(queued.len())
}
