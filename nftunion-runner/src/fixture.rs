//! JSON fixtures: entity sets that stand in for live blockchain indexers.
//!
//! A fixture file holds any of `items`, `ownerships`, `orders` and
//! `activities`. Entities are split into one in-memory source per blockchain
//! (or per currency for an order book) before paging.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use nftunion_core::ContinuationFactory;

use crate::entities::{
    group_by_blockchain, group_by_currency, OnChain, UnionActivity, UnionItem, UnionOrder,
    UnionOwnership,
};
use crate::source::InMemorySource;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("read fixture: {0}")]
    Read(#[from] std::io::Error),
    #[error("parse fixture JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("'{0}' cannot be used as a source id")]
    InvalidSourceId(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub items: Vec<UnionItem>,
    pub ownerships: Vec<UnionOwnership>,
    pub orders: Vec<UnionOrder>,
    pub activities: Vec<UnionActivity>,
}

impl Fixture {
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// One source per blockchain present in `entities`, each paginated by `order`.
pub fn blockchain_sources<E, F>(
    entities: Vec<E>,
    order: F,
) -> Result<Vec<InMemorySource<E, F>>, FixtureError>
where
    E: OnChain,
    F: ContinuationFactory<E> + Clone,
{
    group_by_blockchain(entities)
        .into_iter()
        .map(|(blockchain, group)| {
            InMemorySource::new(blockchain.as_str(), order.clone(), group)
                .ok_or_else(|| FixtureError::InvalidSourceId(blockchain.to_string()))
        })
        .collect()
}

/// One source per currency in an item's order book.
pub fn currency_sources<F>(
    orders: Vec<UnionOrder>,
    order: F,
) -> Result<Vec<InMemorySource<UnionOrder, F>>, FixtureError>
where
    F: ContinuationFactory<UnionOrder> + Clone,
{
    group_by_currency(orders)
        .into_iter()
        .map(|(currency, group)| {
            InMemorySource::new(currency.as_str(), order.clone(), group)
                .ok_or(FixtureError::InvalidSourceId(currency))
        })
        .collect()
}
