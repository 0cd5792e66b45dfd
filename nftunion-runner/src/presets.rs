//! Merge pagers for the orderings the gateway exposes.
//!
//! Every listing endpoint pages all blockchains together; the preset fixes
//! which factory each backend paginates by and how the gateway interleaves.

use nftunion_core::{ArgPaging, ByLastUpdatedAndId, ByPriceAndId, SortDirection};

pub type ByLastUpdated = ArgPaging<ByLastUpdatedAndId, ByLastUpdatedAndId>;
pub type ByPrice = ArgPaging<ByPriceAndId, ByPriceAndId>;

/// Items, most recently updated first.
pub fn items_by_last_updated() -> ByLastUpdated {
    ArgPaging::single(ByLastUpdatedAndId::DESC)
}

/// Ownerships, most recently updated first.
pub fn ownerships_by_last_updated() -> ByLastUpdated {
    ArgPaging::single(ByLastUpdatedAndId::DESC)
}

/// Orders of any kind, most recently updated first.
pub fn orders_by_last_updated() -> ByLastUpdated {
    ArgPaging::single(ByLastUpdatedAndId::DESC)
}

/// Sell orders, cheapest first.
pub fn sell_orders_by_price() -> ByPrice {
    ArgPaging::single(ByPriceAndId::ASC)
}

/// Bids, highest first.
pub fn bids_by_price() -> ByPrice {
    ArgPaging::single(ByPriceAndId::DESC)
}

/// Activities by date in either direction.
pub fn activities_by_date(direction: SortDirection) -> ByLastUpdated {
    ArgPaging::single(ByLastUpdatedAndId { direction })
}
