//! NFT Union Core: continuations, ordering factories, and merge paging.
//!
//! This crate is the pure pagination engine behind the multi-chain gateway:
//! - Continuations: ordered, string-serializable resume positions
//! - Factories: entity -> continuation extraction and the ordering it induces
//! - Single-source paging: trim one backend's overshoot batch to a page
//! - Combined continuation: per-source state packed into one client cursor
//! - Merge paging: k-way merge of one page per source into one global page
//!
//! Nothing here performs I/O or holds shared state; every call builds fresh
//! immutable values.

pub mod arg_paging;
pub mod arg_slice;
pub mod combined;
pub mod continuation;
pub mod factory;
pub mod paging;
pub mod slice;

pub use arg_paging::{is_sorted_by, ArgPaging, MergedPage};
pub use arg_slice::ArgSlice;
pub use combined::{is_wire_safe_source_id, CombinedContinuation, SourceState, COMPLETED};
pub use continuation::{
    Continuation, ContinuationError, DateIdContinuation, IdContinuation, PriceIdContinuation,
    SortDirection,
};
pub use factory::{
    ByLastUpdatedAndId, ById, ByPriceAndId, ContinuationFactory, Identified, LastUpdated, Priced,
};
pub use paging::Paging;
pub use slice::Slice;
