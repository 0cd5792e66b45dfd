use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::{split_key_id, Continuation, ContinuationError, SEPARATOR};

/// Resume position keyed by a price then id.
///
/// An un-priced position renders with an empty key (`"_<id>"`). Natural order
/// puts priced positions before un-priced ones, ascending by price, then id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceIdContinuation {
    pub price: Option<Decimal>,
    pub id: String,
}

impl PriceIdContinuation {
    pub fn new(price: Option<Decimal>, id: impl Into<String>) -> Self {
        Self {
            price,
            id: id.into(),
        }
    }

    pub fn is_priced(&self) -> bool {
        self.price.is_some()
    }
}

impl Ord for PriceIdContinuation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .is_none()
            .cmp(&other.price.is_none())
            .then_with(|| self.price.cmp(&other.price))
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for PriceIdContinuation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PriceIdContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price {
            Some(price) => write!(f, "{}{}{}", price, SEPARATOR, self.id),
            None => write!(f, "{}{}", SEPARATOR, self.id),
        }
    }
}

impl Continuation for PriceIdContinuation {
    fn parse(value: Option<&str>) -> Result<Option<Self>, ContinuationError> {
        let Some((key, id)) = split_key_id(value) else {
            return Ok(None);
        };
        if key.is_empty() {
            return Ok(Some(Self::new(None, id)));
        }
        let price = Decimal::from_str(key).map_err(|e| {
            ContinuationError::malformed(value.unwrap_or_default(), format!("price key: {e}"))
        })?;
        Ok(Some(Self::new(Some(price), id)))
    }
}
