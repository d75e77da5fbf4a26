use folio_cache::{PageSlotPool, PoolCapacity};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Activate(u32),
    Recycle(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![(0u32..64).prop_map(Op::Activate), (0u32..64).prop_map(Op::Recycle)]
}

proptest! {
    #[test]
    fn unpinned_pool_never_exceeds_capacity(
        visible in 1usize..4,
        pages_per_spread in 1usize..3,
        ops in proptest::collection::vec(op(), 0..200),
    ) {
        let capacity = PoolCapacity::for_layout(visible, pages_per_spread);
        let mut pool = PageSlotPool::new(capacity, |id| id);

        for op in ops {
            match op {
                Op::Activate(page) => {
                    let slot = pool.activate(page, page as usize / pages_per_spread);
                    prop_assert_eq!(slot.page(), Some(page));
                }
                Op::Recycle(page) => {
                    pool.recycle(page);
                    prop_assert!(pool.slot_for(page).is_none());
                }
            }
            prop_assert!(pool.live_slots() <= capacity.slots());
        }

        prop_assert_eq!(pool.stats().overflows, 0);
    }

    #[test]
    fn repeated_activation_returns_same_slot(page in 0u32..10_000, spread in 0usize..5_000) {
        let mut pool = PageSlotPool::new(PoolCapacity::for_layout(1, 2), |id| id);

        let first = pool.activate(page, spread).id();
        let second = pool.activate(page, spread).id();

        prop_assert_eq!(first, second);
        prop_assert_eq!(pool.stats().recycles, 0);
        prop_assert_eq!(pool.bound_pages(), vec![page]);
    }
}
