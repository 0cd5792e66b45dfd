//! Property tests for paging invariants.
//!
//! Uses proptest to verify:
//! 1. Combined continuation round-trip: parse(to_string(c)) == c
//! 2. Page-size bound: no page exceeds the requested size
//! 3. Merge order: every page is sorted by the merge factory
//! 4. No loss, no duplicates: draining every source by feeding each page's
//!    continuation back yields every entity exactly once, in merge order,
//!    also when sources paginate by a different key than the merge

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use nftunion_core::{
    is_sorted_by, ArgPaging, ArgSlice, ByLastUpdatedAndId, ByPriceAndId, CombinedContinuation,
    ContinuationFactory, DateIdContinuation, Identified, LastUpdated, Paging, Priced, Slice,
    SourceState,
};

// ── Fixtures ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct Entity {
    id: String,
    millis: i64,
    /// Per-source offset applied by the merge key only.
    shift: i64,
    price: Option<Decimal>,
}

impl Identified for Entity {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl LastUpdated for Entity {
    fn last_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis).unwrap()
    }
}

impl Priced for Entity {
    fn price_usd(&self) -> Option<Decimal> {
        self.price
    }

    fn price_native(&self) -> Option<Decimal> {
        None
    }
}

/// Orders by `millis + shift`, then id. Within one source this agrees with
/// `ByLastUpdatedAndId::ASC`; across sources it interleaves differently.
#[derive(Debug, Clone, Copy)]
struct ByShiftedTime;

impl ContinuationFactory<Entity> for ByShiftedTime {
    type Cursor = DateIdContinuation;

    fn cursor_of(&self, entity: &Entity) -> DateIdContinuation {
        DateIdContinuation::from_millis(entity.millis + entity.shift, &entity.id).unwrap()
    }

    fn compare_cursors(&self, a: &DateIdContinuation, b: &DateIdContinuation) -> Ordering {
        a.cmp(b)
    }
}

/// Backend simulator: everything strictly after the cursor, trimmed to `size`.
fn fetch<F: ContinuationFactory<Entity>>(
    factory: &F,
    entities: &[Entity],
    continuation: Option<&str>,
    size: usize,
) -> Slice<Entity> {
    let cursor = factory.parse_cursor(continuation).unwrap();
    let remaining: Vec<Entity> = entities
        .iter()
        .filter(|e| cursor.as_ref().map_or(true, |c| factory.is_after(e, c)))
        .cloned()
        .collect();
    Paging::new(factory, remaining).slice(size)
}

/// Drain with one factory for both source pagination and merging.
fn drain<F: ContinuationFactory<Entity> + Clone>(
    factory: F,
    sources: &BTreeMap<String, Vec<Entity>>,
    size: usize,
) -> Vec<Slice<Entity>> {
    drain_with(factory.clone(), factory, sources, size)
}

/// Drive the merge pager until the continuation is `None`, collecting pages.
fn drain_with<S, M>(
    source_order: S,
    merge_order: M,
    sources: &BTreeMap<String, Vec<Entity>>,
    size: usize,
) -> Vec<Slice<Entity>>
where
    S: ContinuationFactory<Entity> + Clone,
    M: ContinuationFactory<Entity>,
{
    let paging = ArgPaging::new(source_order.clone(), merge_order);
    let mut pages = Vec::new();
    let mut continuation: Option<String> = None;

    // Every page makes progress, so the bound is generous.
    let total: usize = sources.values().map(Vec::len).sum();
    for _ in 0..=(total + sources.len() + 1) {
        let combined = CombinedContinuation::parse(continuation.as_deref()).unwrap();
        let slices = sources
            .iter()
            .map(|(id, entities)| match combined.state(id) {
                SourceState::Completed => ArgSlice::completed(id.clone()),
                state => {
                    let requested = state.as_requested().map(String::from);
                    let slice = fetch(&source_order, entities, requested.as_deref(), size);
                    ArgSlice::new(id.clone(), requested, slice)
                }
            })
            .collect();

        let page = paging.page(slices, size);
        continuation = page.continuation.clone();
        pages.push(page);
        if continuation.is_none() {
            return pages;
        }
    }
    panic!("merge paging did not terminate");
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_sources() -> impl Strategy<Value = BTreeMap<String, Vec<Entity>>> {
    let source_ids = prop::sample::subsequence(vec!["ETHEREUM", "FLOW", "SOLANA", "TEZOS"], 1..=4);
    source_ids.prop_flat_map(|ids| {
        let per_source = ids
            .into_iter()
            .map(|id| {
                let rows = prop::collection::vec((0..40i64, prop::option::of(0..20u32)), 0..15);
                (rows, 0..30i64).prop_map(move |(rows, shift)| {
                    let entities = rows
                        .into_iter()
                        .enumerate()
                        .map(|(n, (millis, price))| Entity {
                            id: format!("{id}:{n}"),
                            millis,
                            shift,
                            price: price.map(Decimal::from),
                        })
                        .collect::<Vec<_>>();
                    (id.to_string(), entities)
                })
            })
            .collect::<Vec<_>>();
        per_source.prop_map(|pairs| pairs.into_iter().collect::<BTreeMap<_, _>>())
    })
}

fn arb_combined() -> impl Strategy<Value = CombinedContinuation> {
    let state = prop_oneof![
        Just(SourceState::Completed),
        "[0-9]{1,13}_[A-Za-z0-9:_.-]{1,20}".prop_map(SourceState::Active),
    ];
    prop::collection::btree_map("[A-Z]{1,10}", state, 0..6)
        .prop_map(|map| map.into_iter().collect::<CombinedContinuation>())
}

fn all_sorted<F: ContinuationFactory<Entity>>(
    factory: &F,
    sources: &BTreeMap<String, Vec<Entity>>,
) -> Vec<String> {
    let mut all: Vec<Entity> = sources.values().flatten().cloned().collect();
    all.sort_by(|a, b| factory.compare(a, b));
    all.into_iter().map(|e| e.id).collect()
}

// ── 1. Round-trip ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn combined_roundtrip(combined in arb_combined()) {
        let wire = combined.to_string();
        let parsed = CombinedContinuation::parse(Some(&wire)).unwrap();
        prop_assert_eq!(parsed, combined);
    }
}

// ── 2–4. Drain invariants ────────────────────────────────────────────

proptest! {
    #[test]
    fn drain_by_last_updated_asc(sources in arb_sources(), size in 1..8usize) {
        let factory = ByLastUpdatedAndId::ASC;
        let pages = drain(factory, &sources, size);

        for page in &pages {
            prop_assert!(page.len() <= size);
            prop_assert!(is_sorted_by(&factory, &page.entities));
        }
        let seen: Vec<String> = pages.into_iter().flat_map(|p| p.entities).map(|e| e.id).collect();
        prop_assert_eq!(seen, all_sorted(&factory, &sources));
    }

    #[test]
    fn drain_by_last_updated_desc(sources in arb_sources(), size in 1..8usize) {
        let factory = ByLastUpdatedAndId::DESC;
        let pages = drain(factory, &sources, size);

        for page in &pages {
            prop_assert!(page.len() <= size);
        }
        let seen: Vec<String> = pages.into_iter().flat_map(|p| p.entities).map(|e| e.id).collect();
        prop_assert_eq!(seen, all_sorted(&factory, &sources));
    }

    #[test]
    fn drain_with_source_and_merge_orders_differing(sources in arb_sources(), size in 1..8usize) {
        let pages = drain_with(ByLastUpdatedAndId::ASC, ByShiftedTime, &sources, size);

        for page in &pages {
            prop_assert!(page.len() <= size);
            prop_assert!(is_sorted_by(&ByShiftedTime, &page.entities));
        }
        let seen: Vec<String> = pages.into_iter().flat_map(|p| p.entities).map(|e| e.id).collect();
        prop_assert_eq!(seen, all_sorted(&ByShiftedTime, &sources));
    }

    #[test]
    fn drain_by_price_with_unpriced_entities(
        sources in arb_sources(),
        size in 1..8usize,
        descending in any::<bool>(),
    ) {
        let factory = if descending { ByPriceAndId::DESC } else { ByPriceAndId::ASC };
        let pages = drain(factory, &sources, size);

        let seen: Vec<Entity> = pages.into_iter().flat_map(|p| p.entities).collect();
        prop_assert!(is_sorted_by(&factory, &seen));

        // Un-priced entities never interleave with priced ones.
        let first_unpriced = seen.iter().position(|e| e.price.is_none()).unwrap_or(seen.len());
        prop_assert!(seen[first_unpriced..].iter().all(|e| e.price.is_none()));

        let ids: Vec<String> = seen.into_iter().map(|e| e.id).collect();
        prop_assert_eq!(ids, all_sorted(&factory, &sources));
    }

    #[test]
    fn single_source_paging_bound(
        rows in prop::collection::vec(0..100i64, 0..30),
        size in 1..10usize,
    ) {
        let entities: Vec<Entity> = rows
            .into_iter()
            .enumerate()
            .map(|(n, millis)| Entity { id: format!("e{n}"), millis, shift: 0, price: None })
            .collect();
        let total = entities.len();
        let slice = Paging::new(&ByLastUpdatedAndId::ASC, entities).slice(size);

        prop_assert_eq!(slice.len(), total.min(size));
        prop_assert_eq!(slice.is_exhausted(), total <= size);
        prop_assert!(is_sorted_by(&ByLastUpdatedAndId::ASC, &slice.entities));
    }
}
