//! Property tests for prize-pool arithmetic.

use proptest::prelude::*;
use tournament_clock::prize_pool;

proptest! {
    #[test]
    fn prize_pool_is_collected_or_guarantee(
        entries in 0u32..10_000,
        reentries in 0u32..10_000,
        guaranteed in 0i64..10_000_000,
        buy_in in 0i64..100_000,
        reentry_fee in 0i64..100_000,
    ) {
        let pool = prize_pool(entries, reentries, guaranteed, buy_in, reentry_fee);
        let collected = i64::from(entries) * buy_in + i64::from(reentries) * reentry_fee;

        prop_assert_eq!(pool, collected.max(guaranteed));
        prop_assert!(pool >= guaranteed);
        prop_assert!(pool >= collected);
    }

    #[test]
    fn prize_pool_grows_with_entries(
        entries in 0u32..10_000,
        reentries in 0u32..10_000,
        guaranteed in 0i64..10_000_000,
        buy_in in 1i64..100_000,
        reentry_fee in 0i64..100_000,
    ) {
        let before = prize_pool(entries, reentries, guaranteed, buy_in, reentry_fee);
        let after = prize_pool(entries + 1, reentries, guaranteed, buy_in, reentry_fee);

        prop_assert!(after >= before);
    }
}
