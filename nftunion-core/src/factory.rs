//! Continuation factories: extract a cursor from an entity and define entity order.
//!
//! A factory is the only place an ordering lives: entity order is cursor order
//! under the factory's `compare_cursors`. The merge pager takes two factories
//! (source order and merge order), so both are injected values rather than
//! hard-coded fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::continuation::{
    Continuation, ContinuationError, DateIdContinuation, IdContinuation, PriceIdContinuation,
    SortDirection,
};

/// Entity with a stable id, used as the secondary sort key.
pub trait Identified {
    fn entity_id(&self) -> &str;
}

/// Entity carrying a last-updated timestamp.
pub trait LastUpdated: Identified {
    fn last_updated_at(&self) -> DateTime<Utc>;
}

/// Entity carrying an optional price in a normalized currency and in its native currency.
pub trait Priced: Identified {
    fn price_usd(&self) -> Option<Decimal>;
    fn price_native(&self) -> Option<Decimal>;
}

/// Pure `Entity -> Cursor` extraction plus the ordering it induces.
pub trait ContinuationFactory<E>: Send + Sync {
    type Cursor: Continuation;

    /// Deterministic, side-effect free.
    fn cursor_of(&self, entity: &E) -> Self::Cursor;

    /// Strict total order over cursors in this factory's direction.
    fn compare_cursors(&self, a: &Self::Cursor, b: &Self::Cursor) -> Ordering;

    fn compare(&self, a: &E, b: &E) -> Ordering {
        self.compare_cursors(&self.cursor_of(a), &self.cursor_of(b))
    }

    /// Canonical string form of the entity's cursor.
    fn continuation_of(&self, entity: &E) -> String {
        self.cursor_of(entity).to_string()
    }

    /// True when `entity` sorts strictly after `cursor`.
    fn is_after(&self, entity: &E, cursor: &Self::Cursor) -> bool {
        self.compare_cursors(&self.cursor_of(entity), cursor) == Ordering::Greater
    }

    fn parse_cursor(&self, value: Option<&str>) -> Result<Option<Self::Cursor>, ContinuationError> {
        Self::Cursor::parse(value)
    }
}

impl<E, F> ContinuationFactory<E> for &F
where
    F: ContinuationFactory<E> + ?Sized,
{
    type Cursor = F::Cursor;

    fn cursor_of(&self, entity: &E) -> Self::Cursor {
        (**self).cursor_of(entity)
    }

    fn compare_cursors(&self, a: &Self::Cursor, b: &Self::Cursor) -> Ordering {
        (**self).compare_cursors(a, b)
    }
}

/// Order by last-updated time, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByLastUpdatedAndId {
    pub direction: SortDirection,
}

impl ByLastUpdatedAndId {
    pub const ASC: Self = Self {
        direction: SortDirection::Asc,
    };
    pub const DESC: Self = Self {
        direction: SortDirection::Desc,
    };
}

impl<E: LastUpdated> ContinuationFactory<E> for ByLastUpdatedAndId {
    type Cursor = DateIdContinuation;

    fn cursor_of(&self, entity: &E) -> DateIdContinuation {
        DateIdContinuation::new(entity.last_updated_at(), entity.entity_id())
    }

    fn compare_cursors(&self, a: &DateIdContinuation, b: &DateIdContinuation) -> Ordering {
        self.direction.apply(a.cmp(b))
    }
}

/// Order by price (USD, then native), then id. Un-priced entities sort last
/// in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByPriceAndId {
    pub direction: SortDirection,
}

impl ByPriceAndId {
    pub const ASC: Self = Self {
        direction: SortDirection::Asc,
    };
    pub const DESC: Self = Self {
        direction: SortDirection::Desc,
    };

    /// Extreme used as the comparison value when no price exists.
    pub fn sentinel(&self) -> Decimal {
        match self.direction {
            SortDirection::Asc => Decimal::ZERO,
            SortDirection::Desc => Decimal::MAX,
        }
    }

    /// The value a cursor is compared by.
    pub fn sort_value(&self, cursor: &PriceIdContinuation) -> Decimal {
        cursor.price.unwrap_or_else(|| self.sentinel())
    }
}

impl<E: Priced> ContinuationFactory<E> for ByPriceAndId {
    type Cursor = PriceIdContinuation;

    fn cursor_of(&self, entity: &E) -> PriceIdContinuation {
        let price = entity.price_usd().or_else(|| entity.price_native());
        PriceIdContinuation::new(price, entity.entity_id())
    }

    fn compare_cursors(&self, a: &PriceIdContinuation, b: &PriceIdContinuation) -> Ordering {
        a.price
            .is_none()
            .cmp(&b.price.is_none())
            .then_with(|| {
                let by_value = self
                    .sort_value(a)
                    .cmp(&self.sort_value(b))
                    .then_with(|| a.id.cmp(&b.id));
                self.direction.apply(by_value)
            })
    }
}

/// Order by id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ById {
    pub direction: SortDirection,
}

impl<E: Identified> ContinuationFactory<E> for ById {
    type Cursor = IdContinuation;

    fn cursor_of(&self, entity: &E) -> IdContinuation {
        IdContinuation::new(entity.entity_id())
    }

    fn compare_cursors(&self, a: &IdContinuation, b: &IdContinuation) -> Ordering {
        self.direction.apply(a.cmp(b))
    }
}
