//! NFT Union Runner: the gateway side of merge paging.
//!
//! This crate builds on `nftunion-core` to provide:
//! - Source clients (`SourceClient`) and an in-memory indexer simulator
//! - The aggregator: cursor decoding, concurrent fan-out, failure policy, merge
//! - Single-source paging with raw per-entity cursors
//! - Gateway configuration loaded from TOML
//! - Union entity types and the merge pagers each listing uses
//! - JSON fixtures grouping entities into per-blockchain sources

pub mod aggregator;
pub mod config;
pub mod entities;
pub mod fixture;
pub mod presets;
pub mod source;

pub use aggregator::{AggregateError, Aggregator, PageRequest};
pub use config::{ConfigError, FailurePolicy, GatewayConfig, PagingConfig, SourcesConfig};
pub use entities::{
    group_by_blockchain, group_by_currency, ActivityKind, Blockchain, OnChain, UnionActivity,
    UnionItem, UnionOrder, UnionOwnership,
};
pub use fixture::{Fixture, FixtureError};
pub use source::{InMemorySource, SourceClient, SourceError};
