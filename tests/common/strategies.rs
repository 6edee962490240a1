use manifest_balancer::models::SizedItem;
use proptest::prelude::*;

/// Strategy for generating item references shaped like storage paths
pub fn item_ref_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,10}".prop_map(|name| format!("/videos/{name}.mp4"))
}

/// Strategy for generating item sizes, biased toward collisions so tie-breaks get exercised
pub fn item_size_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        3 => 0u64..16,
        2 => 0u64..10_000_000,
        1 => Just(0u64),
    ]
}

/// Strategy for generating a set of sized items with distinct references
pub fn sized_items_strategy(max_items: usize) -> impl Strategy<Value = Vec<SizedItem>> {
    prop::collection::btree_map(item_ref_strategy(), item_size_strategy(), 0..max_items).prop_map(
        |items| {
            items
                .into_iter()
                .map(|(item_ref, size)| SizedItem::new(item_ref, size))
                .collect()
        },
    )
}

/// Strategy for generating group cardinalities
pub fn items_per_group_strategy() -> impl Strategy<Value = usize> {
    1usize..9
}
