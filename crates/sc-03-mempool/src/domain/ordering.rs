//! # Block Ordering
//!
//! Selected transactions are sorted by fee per byte (descending), then
//! arrival time (ascending), then ID (ascending). Every honest node must
//! produce the same order from the same mempool content.

use shared_types::MempoolTransaction;
use std::cmp::Ordering;

/// Fee normalized by serialized size.
pub fn fee_per_byte(fee: i64, size: usize) -> i64 {
    if size == 0 {
        return 0;
    }
    fee / size as i64
}

/// Total order used when embedding transactions in a block.
pub fn block_order(a: &MempoolTransaction, b: &MempoolTransaction) -> Ordering {
    b.fee_per_byte
        .cmp(&a.fee_per_byte)
        .then(a.arrival_timestamp.cmp(&b.arrival_timestamp))
        .then(a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(id: u64, fee_per_byte: i64, arrival_timestamp: u64) -> MempoolTransaction {
        MempoolTransaction {
            id,
            fee_per_byte,
            arrival_timestamp,
            transaction_bytes: Vec::new(),
            sender_account_address: [0; 32],
            recipient_account_address: None,
            block_height: 0,
        }
    }

    #[test]
    fn test_fee_tie_broken_by_arrival() {
        let mut entries = vec![
            entry(1, 1, 1562893305),
            entry(2, 10, 1562893304),
            entry(3, 1, 1562893302),
            entry(4, 100, 1562893306),
            entry(5, 5, 1562893303),
        ];
        entries.sort_by(block_order);
        let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 2, 5, 3, 1]);
    }

    #[test]
    fn test_full_tie_broken_by_id() {
        let mut entries = vec![entry(9, 3, 10), entry(2, 3, 10)];
        entries.sort_by(block_order);
        assert_eq!(entries[0].id, 2);
    }

    #[test]
    fn test_fee_per_byte() {
        assert_eq!(fee_per_byte(1000, 200), 5);
        assert_eq!(fee_per_byte(10, 0), 0);
    }

    fn entries_strategy() -> impl Strategy<Value = Vec<MempoolTransaction>> {
        prop::collection::btree_map(any::<u64>(), (0i64..50, 0u64..20), 0..40).prop_map(|m| {
            m.into_iter()
                .map(|(id, (fee, arrival))| entry(id, fee, arrival))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_order_independent_of_input_order(
            (original, shuffled) in entries_strategy()
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let mut a = original;
            let mut b = shuffled;
            a.sort_by(block_order);
            b.sort_by(block_order);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_order_is_fee_descending(entries in entries_strategy()) {
            let mut sorted = entries;
            sorted.sort_by(block_order);
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].fee_per_byte >= pair[1].fee_per_byte);
            }
        }
    }
}
