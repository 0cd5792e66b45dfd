//! Multi-source merge pager (k-way merge over independently paginated sources).
//!
//! Each round takes one `ArgSlice` per source, all fetched at page size `S`,
//! and produces one page of at most `S` entities in merge order plus the next
//! combined continuation.
//!
//! Per-source continuation rules:
//! - zero winners: the requested continuation is kept unchanged, so
//!   fetched-but-outranked entities are fetched again on a later page
//! - supplied nothing and reported no next page: `COMPLETED` (an empty,
//!   exhausted source would otherwise stay untouched forever)
//! - every supplied entity won and the source reported no next page: `COMPLETED`
//! - otherwise: the source-order cursor of that source's lowest-ranked winner
//!
//! When every known source is `COMPLETED` the overall continuation is `None`
//! rather than an all-`COMPLETED` string, which would loop on empty pages.

use std::cmp::Ordering;

use crate::arg_slice::ArgSlice;
use crate::combined::{CombinedContinuation, SourceState};
use crate::factory::ContinuationFactory;
use crate::slice::Slice;

/// Output of one merge round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPage<E> {
    pub slice: Slice<E>,
    pub combined: CombinedContinuation,
}

impl<E> MergedPage<E> {
    pub fn into_slice(self) -> Slice<E> {
        self.slice
    }
}

/// Merge pager over a source-order factory `S` and a merge-order factory `M`.
///
/// `S` is each backend's native pagination key and computes the next
/// per-source cursor. `M` interleaves all sources. They are usually the same.
#[derive(Debug, Clone)]
pub struct ArgPaging<S, M> {
    source_order: S,
    merge_order: M,
}

impl<F: Clone> ArgPaging<F, F> {
    /// Source order and merge order are the same factory.
    pub fn single(order: F) -> Self {
        Self::new(order.clone(), order)
    }
}

struct Candidate<K, E> {
    key: K,
    source: usize,
    entity: E,
}

struct SourceRound<'a> {
    source_id: &'a str,
    requested: SourceState,
    supplied: usize,
    exhausted: bool,
}

impl<S, M> ArgPaging<S, M> {
    pub fn new(source_order: S, merge_order: M) -> Self {
        Self {
            source_order,
            merge_order,
        }
    }

    pub fn source_order(&self) -> &S {
        &self.source_order
    }

    pub fn merge_order(&self) -> &M {
        &self.merge_order
    }

    /// Merge one round and return only the page.
    pub fn page<E>(&self, slices: Vec<ArgSlice<E>>, size: usize) -> Slice<E>
    where
        S: ContinuationFactory<E>,
        M: ContinuationFactory<E>,
    {
        self.merge(slices, size).into_slice()
    }

    /// Merge one round. Source ids are expected to be unique across `slices`.
    pub fn merge<E>(&self, slices: Vec<ArgSlice<E>>, size: usize) -> MergedPage<E>
    where
        S: ContinuationFactory<E>,
        M: ContinuationFactory<E>,
    {
        debug_assert!(
            {
                let mut ids: Vec<&str> = slices.iter().map(|s| s.source_id.as_str()).collect();
                ids.sort_unstable();
                ids.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate source id in merge round"
        );

        let source_ids: Vec<String> = slices.iter().map(|s| s.source_id.clone()).collect();
        let mut rounds: Vec<SourceRound<'_>> = Vec::with_capacity(slices.len());
        let mut pool: Vec<Candidate<M::Cursor, E>> = Vec::new();

        for (source, arg) in slices.into_iter().enumerate() {
            let requested = SourceState::from_requested(arg.requested_continuation.as_deref());
            let completed = requested.is_completed();
            rounds.push(SourceRound {
                source_id: &source_ids[source],
                requested,
                supplied: if completed { 0 } else { arg.slice.entities.len() },
                exhausted: arg.slice.continuation.is_none(),
            });
            if completed {
                continue;
            }
            pool.extend(arg.slice.entities.into_iter().map(|entity| Candidate {
                key: self.merge_order.cursor_of(&entity),
                source,
                entity,
            }));
        }

        // Stable sort: equal keys keep their per-source order, and break
        // across sources on source id.
        pool.sort_by(|a, b| {
            self.merge_order
                .compare_cursors(&a.key, &b.key)
                .then_with(|| rounds[a.source].source_id.cmp(rounds[b.source].source_id))
        });
        pool.truncate(size);

        let mut won: Vec<usize> = vec![0; rounds.len()];
        let mut last_won: Vec<Option<usize>> = vec![None; rounds.len()];
        let mut winners = Vec::with_capacity(pool.len());
        for (rank, candidate) in pool.into_iter().enumerate() {
            won[candidate.source] += 1;
            last_won[candidate.source] = Some(rank);
            winners.push(candidate.entity);
        }

        let mut combined = CombinedContinuation::new();
        for (source, round) in rounds.iter().enumerate() {
            let next = match last_won[source] {
                None if round.supplied == 0 && round.exhausted => SourceState::Completed,
                None => round.requested.clone(),
                Some(_) if won[source] == round.supplied && round.exhausted => {
                    SourceState::Completed
                }
                Some(rank) => {
                    SourceState::Active(self.source_order.continuation_of(&winners[rank]))
                }
            };
            combined.set(round.source_id.to_string(), next);
        }

        let continuation = if combined.all_completed(rounds.iter().map(|r| r.source_id)) {
            None
        } else {
            Some(combined.to_string())
        };

        MergedPage {
            slice: Slice::new(continuation, winners),
            combined,
        }
    }
}

/// True when `entities` are in `factory` order.
pub fn is_sorted_by<E, F: ContinuationFactory<E>>(factory: &F, entities: &[E]) -> bool {
    entities
        .windows(2)
        .all(|w| factory.compare(&w[0], &w[1]) != Ordering::Greater)
}
