//! # Participation Scores and Rewards

/// Weight of a linked receipt relative to an unlinked one.
const LINKED_RECEIPT_WEIGHT: i64 = 2;

/// Score change earned by a blocksmith for the receipts in its block.
///
/// Linking more than half of the possible receipts earns the full change;
/// below that the change is proportional to the weighted receipt count.
pub fn participation_delta(
    linked: u32,
    unlinked: u32,
    max_receipts: u32,
    max_change: i64,
) -> i64 {
    let half = (max_receipts / 2) as i64;
    if max_receipts == 0 || linked as i64 > half {
        return max_change;
    }
    let weight = linked as i64 * LINKED_RECEIPT_WEIGHT + unlinked as i64;
    let denominator = (half * LINKED_RECEIPT_WEIGHT).max(1);
    (weight * max_change / denominator).min(max_change)
}

/// Keeps a score within `[0, max]`.
pub fn clamp_score(score: i64, max: i64) -> i64 {
    score.clamp(0, max)
}

/// Splits `total` among `winners`; the remainder goes to the first winner.
pub fn lottery_shares(total: i64, winners: usize) -> Vec<i64> {
    if winners == 0 {
        return Vec::new();
    }
    let n = winners as i64;
    let mut shares = vec![total / n; winners];
    shares[0] += total % n;
    shares
}
