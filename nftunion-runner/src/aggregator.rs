//! Multi-source request handling: decode the client cursor, fan out, merge.
//!
//! One request runs in three steps:
//! - parse the combined continuation (a malformed cursor is a client error)
//! - fetch one page from every enabled source that is not `COMPLETED`,
//!   concurrently on the rayon pool unless parallelism is disabled
//! - merge the per-source pages with `ArgPaging` and encode the next cursor
//!
//! `COMPLETED` sources are never contacted again. A source that fails is
//! either fatal (`FailurePolicy::Abort`) or contributes nothing this round
//! and keeps its cursor (`FailurePolicy::SkipAsEmpty`).

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use nftunion_core::{
    is_wire_safe_source_id, ArgPaging, ArgSlice, CombinedContinuation, ContinuationError,
    ContinuationFactory, MergedPage, Paging, Slice, SourceState,
};

use crate::config::{FailurePolicy, GatewayConfig};
use crate::source::{SourceClient, SourceError};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("bad continuation: {0}")]
    BadRequest(#[from] ContinuationError),
    #[error("page size {requested} exceeds maximum {max}")]
    PageSizeTooLarge { requested: usize, max: usize },
    #[error("unknown or disabled source '{0}'")]
    UnknownSource(String),
    #[error("source '{source_id}' failed: {error}")]
    SourceFailed {
        source_id: String,
        #[source]
        error: SourceError,
    },
    #[error("cursor for source '{0}' cannot be encoded in a combined continuation")]
    UnencodableCursor(String),
    #[error("source '{0}' registered twice")]
    DuplicateSource(String),
    #[error("source id '{0}' is empty or contains ':' or ';'")]
    InvalidSourceId(String),
    #[error("drain did not reach the end after {pages} pages")]
    DrainLimit { pages: usize },
}

impl AggregateError {
    /// True when the caller sent a request that can never succeed as-is.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AggregateError::BadRequest(_)
                | AggregateError::PageSizeTooLarge { .. }
                | AggregateError::UnknownSource(_)
        )
    }

    pub fn http_status(&self) -> u16 {
        match self {
            _ if self.is_client_error() => 400,
            AggregateError::SourceFailed { .. } => 502,
            _ => 500,
        }
    }
}

/// Client request for one merged page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub continuation: Option<String>,
    /// `None` uses the configured default size.
    pub size: Option<usize>,
    /// Restrict the request to these sources. Empty means all enabled sources.
    pub sources: Vec<String>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_continuation(mut self, continuation: Option<impl Into<String>>) -> Self {
        self.continuation = continuation.map(Into::into);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_sources<I, T>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }
}

/// Gateway over a set of sources sharing one source order `S` and merge order `M`.
pub struct Aggregator<E, S, M> {
    paging: ArgPaging<S, M>,
    config: GatewayConfig,
    sources: BTreeMap<String, Arc<dyn SourceClient<E>>>,
    parallel: bool,
}

impl<E, S, M> Aggregator<E, S, M>
where
    E: Send + Sync + 'static,
    S: ContinuationFactory<E>,
    M: ContinuationFactory<E>,
{
    pub fn new(paging: ArgPaging<S, M>, config: GatewayConfig) -> Self {
        let parallel = config.parallel;
        Self {
            paging,
            config,
            sources: BTreeMap::new(),
            parallel,
        }
    }

    /// Enables or disables concurrent fan-out.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_source(
        mut self,
        source: impl SourceClient<E> + 'static,
    ) -> Result<Self, AggregateError> {
        self.add_source(Arc::new(source))?;
        Ok(self)
    }

    pub fn add_source(&mut self, source: Arc<dyn SourceClient<E>>) -> Result<(), AggregateError> {
        let id = source.source_id().to_string();
        if !is_wire_safe_source_id(&id) {
            return Err(AggregateError::InvalidSourceId(id));
        }
        if self.sources.contains_key(&id) {
            return Err(AggregateError::DuplicateSource(id));
        }
        self.sources.insert(id, source);
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn paging(&self) -> &ArgPaging<S, M> {
        &self.paging
    }

    /// Registered and enabled source ids, in wire order.
    pub fn source_ids(&self) -> Vec<&str> {
        self.sources
            .keys()
            .map(String::as_str)
            .filter(|id| self.config.sources.is_enabled(id))
            .collect()
    }

    fn resolve_size(&self, size: Option<usize>) -> Result<usize, AggregateError> {
        let paging = &self.config.paging;
        match size {
            None => Ok(paging.default_size),
            Some(requested) if requested > paging.max_size => {
                Err(AggregateError::PageSizeTooLarge {
                    requested,
                    max: paging.max_size,
                })
            }
            Some(requested) => Ok(requested.max(1)),
        }
    }

    fn enabled_source(&self, source_id: &str) -> Result<&Arc<dyn SourceClient<E>>, AggregateError> {
        self.sources
            .get(source_id)
            .filter(|_| self.config.sources.is_enabled(source_id))
            .ok_or_else(|| AggregateError::UnknownSource(source_id.to_string()))
    }

    fn participants(
        &self,
        request: &PageRequest,
    ) -> Result<Vec<&Arc<dyn SourceClient<E>>>, AggregateError> {
        if request.sources.is_empty() {
            return Ok(self
                .sources
                .iter()
                .filter(|(id, _)| self.config.sources.is_enabled(id))
                .map(|(_, source)| source)
                .collect());
        }
        let mut selected: Vec<_> = request
            .sources
            .iter()
            .map(|id| self.enabled_source(id))
            .collect::<Result<_, _>>()?;
        selected.sort_by(|a, b| a.source_id().cmp(b.source_id()));
        selected.dedup_by(|a, b| a.source_id() == b.source_id());
        Ok(selected)
    }

    /// Fetch one merged page and its structured continuation.
    pub fn fetch(&self, request: &PageRequest) -> Result<MergedPage<E>, AggregateError> {
        let size = self.resolve_size(request.size)?;
        let combined = CombinedContinuation::parse(request.continuation.as_deref())?;
        for (_, state) in combined.iter() {
            if let SourceState::Active(cursor) = state {
                self.paging.source_order().parse_cursor(Some(cursor))?;
            }
        }

        let participants = self.participants(request)?;
        debug!(
            sources = participants.len(),
            size,
            parallel = self.parallel,
            "fan-out"
        );

        let slices: Vec<ArgSlice<E>> = if self.parallel {
            participants
                .par_iter()
                .map(|source| self.fetch_source(source, &combined, size))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            participants
                .iter()
                .map(|source| self.fetch_source(source, &combined, size))
                .collect::<Result<Vec<_>, _>>()?
        };

        let merged = self.paging.merge(slices, size);
        if !merged.combined.is_wire_safe() {
            let offender = merged
                .combined
                .iter()
                .find(|(id, state)| {
                    !CombinedContinuation::new()
                        .with_state(*id, (*state).clone())
                        .is_wire_safe()
                })
                .map(|(id, _)| id.to_string())
                .unwrap_or_default();
            return Err(AggregateError::UnencodableCursor(offender));
        }

        debug!(
            returned = merged.slice.len(),
            continuation = merged.slice.continuation.as_deref().unwrap_or("<end>"),
            "merged page"
        );
        Ok(merged)
    }

    /// Fetch one merged page.
    pub fn fetch_page(&self, request: &PageRequest) -> Result<Slice<E>, AggregateError> {
        self.fetch(request).map(MergedPage::into_slice)
    }

    fn fetch_source(
        &self,
        source: &Arc<dyn SourceClient<E>>,
        combined: &CombinedContinuation,
        size: usize,
    ) -> Result<ArgSlice<E>, AggregateError> {
        let source_id = source.source_id();
        let requested = match combined.state(source_id) {
            SourceState::Completed => return Ok(ArgSlice::completed(source_id)),
            state => state.as_requested().map(String::from),
        };

        match source.fetch_page(requested.as_deref(), size) {
            Ok(slice) => Ok(ArgSlice::new(source_id, requested, slice)),
            Err(SourceError::Continuation(e)) => Err(AggregateError::BadRequest(e)),
            Err(error) => match self.config.failure_policy {
                FailurePolicy::Abort => Err(AggregateError::SourceFailed {
                    source_id: source_id.to_string(),
                    error,
                }),
                FailurePolicy::SkipAsEmpty => {
                    warn!(source = source_id, %error, "source failed, skipping this round");
                    // Not exhausted: an empty exhausted slice would complete the source.
                    let pending = Slice::new(Some(requested.clone().unwrap_or_default()), vec![]);
                    Ok(ArgSlice::new(source_id, requested, pending))
                }
            },
        }
    }

    /// Page a single source. The continuation is that source's raw cursor,
    /// not a combined one.
    pub fn fetch_single(
        &self,
        source_id: &str,
        continuation: Option<&str>,
        size: Option<usize>,
    ) -> Result<Slice<E>, AggregateError> {
        let size = self.resolve_size(size)?;
        let source = self.enabled_source(source_id)?;
        let order = self.paging.source_order();
        order.parse_cursor(continuation)?;

        let fetched = source
            .fetch_page(continuation, size)
            .map_err(|error| match error {
                SourceError::Continuation(e) => AggregateError::BadRequest(e),
                error => AggregateError::SourceFailed {
                    source_id: source_id.to_string(),
                    error,
                },
            })?;
        debug!(source = source_id, returned = fetched.len(), "single-source page");

        let upstream = fetched.continuation;
        let mut page = Paging::new(order, fetched.entities).slice(size);
        // An exact-size page from a source with more data is not the end.
        if page.is_exhausted() && upstream.is_some() {
            page.continuation = page
                .entities
                .last()
                .map(|last| order.continuation_of(last))
                .or(upstream);
        }
        Ok(page)
    }

    /// Follow continuations from `request` until the end of the stream.
    pub fn drain(&self, request: &PageRequest) -> Result<Vec<E>, AggregateError> {
        let max_pages = self.config.paging.max_drain_pages;
        let mut request = request.clone();
        let mut entities = Vec::new();

        for _ in 0..max_pages {
            let page = self.fetch_page(&request)?;
            entities.extend(page.entities);
            match page.continuation {
                Some(next) => request.continuation = Some(next),
                None => return Ok(entities),
            }
        }
        Err(AggregateError::DrainLimit { pages: max_pages })
    }
}
