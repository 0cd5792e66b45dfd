//! Source clients: one independently paginated backend each.
//!
//! A source answers `fetch_page(continuation, size)` in its own native order
//! and returns a `Slice`. The gateway only ever talks to sources through
//! `SourceClient`, so a real HTTP indexer client and the in-memory simulator
//! are interchangeable.

use thiserror::Error;

use nftunion_core::{is_wire_safe_source_id, ContinuationError, ContinuationFactory, Paging, Slice};

/// Errors a backend can report for one fetch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("source rejected request: {0}")]
    Rejected(String),
    #[error(transparent)]
    Continuation(#[from] ContinuationError),
}

/// One independently paginated backend.
pub trait SourceClient<E>: Send + Sync {
    /// Key of this source inside the combined continuation.
    fn source_id(&self) -> &str;

    /// Fetch up to `size` entities strictly after `continuation` in this
    /// source's native order. `None` starts from the beginning.
    fn fetch_page(&self, continuation: Option<&str>, size: usize) -> Result<Slice<E>, SourceError>;
}

/// Backend simulator over a fixed entity set, paginated by `order`.
#[derive(Debug, Clone)]
pub struct InMemorySource<E, F> {
    source_id: String,
    order: F,
    entities: Vec<E>,
}

impl<E, F: ContinuationFactory<E>> InMemorySource<E, F> {
    /// Returns `None` when `source_id` cannot appear in a combined continuation.
    pub fn new(source_id: impl Into<String>, order: F, mut entities: Vec<E>) -> Option<Self> {
        let source_id = source_id.into();
        if !is_wire_safe_source_id(&source_id) {
            return None;
        }
        entities.sort_by(|a, b| order.compare(a, b));
        Some(Self {
            source_id,
            order,
            entities,
        })
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<E, F> SourceClient<E> for InMemorySource<E, F>
where
    E: Clone + Send + Sync,
    F: ContinuationFactory<E>,
{
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn fetch_page(&self, continuation: Option<&str>, size: usize) -> Result<Slice<E>, SourceError> {
        let cursor = self.order.parse_cursor(continuation)?;
        let start = match &cursor {
            Some(cursor) => self
                .entities
                .partition_point(|e| !self.order.is_after(e, cursor)),
            None => 0,
        };
        // One extra entity tells Paging whether another page exists.
        let end = self.entities.len().min(start.saturating_add(size.max(1)).saturating_add(1));
        let batch = self.entities[start..end].to_vec();
        Ok(Paging::new(&self.order, batch).slice(size))
    }
}
