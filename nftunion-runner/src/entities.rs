//! Union entity types: the normalized shapes every blockchain indexer maps into.
//!
//! The engine never looks inside these; it only sees them through the
//! `Identified`, `LastUpdated` and `Priced` traits.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use nftunion_core::{Identified, LastUpdated, Priced};

/// Blockchain served by one backend indexer. Its wire name is the source id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Blockchain {
    Ethereum,
    Polygon,
    Flow,
    Tezos,
    Solana,
    Immutablex,
}

impl Blockchain {
    pub const ALL: [Blockchain; 6] = [
        Blockchain::Ethereum,
        Blockchain::Polygon,
        Blockchain::Flow,
        Blockchain::Tezos,
        Blockchain::Solana,
        Blockchain::Immutablex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Blockchain::Ethereum => "ETHEREUM",
            Blockchain::Polygon => "POLYGON",
            Blockchain::Flow => "FLOW",
            Blockchain::Tezos => "TEZOS",
            Blockchain::Solana => "SOLANA",
            Blockchain::Immutablex => "IMMUTABLEX",
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Blockchain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Blockchain::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown blockchain: {s}"))
    }
}

/// Entity that lives on exactly one blockchain.
pub trait OnChain {
    fn blockchain(&self) -> Blockchain;
}

/// NFT item (one token).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionItem {
    /// `<BLOCKCHAIN>:<contract>:<tokenId>`
    pub id: String,
    pub blockchain: Blockchain,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub supply: u64,
    #[serde(default)]
    pub deleted: bool,
}

/// Ownership of some amount of one item by one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionOwnership {
    pub id: String,
    pub blockchain: Blockchain,
    pub item_id: String,
    pub owner: String,
    pub value: u64,
    pub last_updated_at: DateTime<Utc>,
}

/// Sell order or bid. Prices are per unit; `*_usd` is the normalized price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionOrder {
    pub id: String,
    pub blockchain: Blockchain,
    pub item_id: String,
    /// Currency symbol the order is priced in (e.g. `ETH`, `WETH`, `FLOW`).
    pub currency: String,
    #[serde(default)]
    pub make_price: Option<Decimal>,
    #[serde(default)]
    pub make_price_usd: Option<Decimal>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Mint,
    Burn,
    Transfer,
    List,
    Bid,
    Sell,
    CancelList,
    CancelBid,
}

/// On-chain or order-book event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionActivity {
    pub id: String,
    pub blockchain: Blockchain,
    pub kind: ActivityKind,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub item_id: Option<String>,
}

macro_rules! impl_entity_traits {
    ($ty:ty, $updated:ident) => {
        impl Identified for $ty {
            fn entity_id(&self) -> &str {
                &self.id
            }
        }

        impl LastUpdated for $ty {
            fn last_updated_at(&self) -> DateTime<Utc> {
                self.$updated
            }
        }

        impl OnChain for $ty {
            fn blockchain(&self) -> Blockchain {
                self.blockchain
            }
        }
    };
}

impl_entity_traits!(UnionItem, last_updated_at);
impl_entity_traits!(UnionOwnership, last_updated_at);
impl_entity_traits!(UnionOrder, last_updated_at);
impl_entity_traits!(UnionActivity, date);

impl Priced for UnionOrder {
    fn price_usd(&self) -> Option<Decimal> {
        self.make_price_usd
    }

    fn price_native(&self) -> Option<Decimal> {
        self.make_price
    }
}

/// Split entities into one bucket per blockchain (one source each).
pub fn group_by_blockchain<E: OnChain>(entities: Vec<E>) -> BTreeMap<Blockchain, Vec<E>> {
    let mut groups: BTreeMap<Blockchain, Vec<E>> = BTreeMap::new();
    for entity in entities {
        groups.entry(entity.blockchain()).or_default().push(entity);
    }
    groups
}

/// Split one item's order book into one bucket per currency (one source each).
pub fn group_by_currency(orders: Vec<UnionOrder>) -> BTreeMap<String, Vec<UnionOrder>> {
    let mut groups: BTreeMap<String, Vec<UnionOrder>> = BTreeMap::new();
    for order in orders {
        groups.entry(order.currency.clone()).or_default().push(order);
    }
    groups
}
