//! Continuations: totally ordered, string-serializable resume positions.
//!
//! A continuation is the key a source paginates by, plus the entity id as a
//! tie-breaker. Its string form is `<key>_<id>`; parsing splits on the FIRST
//! separator only, so the id itself may contain `_`.
//!
//! Parsing distinguishes three outcomes:
//! - `Ok(None)`: start of stream (`None`, empty, or no separator at all)
//! - `Ok(Some(_))`: a valid resume position
//! - `Err(_)`: cursor-shaped input whose key is invalid, never silently reset

pub mod date_id;
pub mod id;
pub mod price_id;

pub use date_id::DateIdContinuation;
pub use id::IdContinuation;
pub use price_id::PriceIdContinuation;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Separator between the key and the id in a continuation string.
pub const SEPARATOR: char = '_';

/// Errors from decoding client-supplied continuation strings.
///
/// Continuations are round-tripped through API clients, so every variant is a
/// client error (bad request), never a server fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContinuationError {
    #[error("malformed continuation '{input}': {reason}")]
    Malformed { input: String, reason: String },

    #[error("malformed combined continuation '{input}': {reason}")]
    MalformedCombined { input: String, reason: String },
}

impl ContinuationError {
    pub(crate) fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_combined(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCombined {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A resume position within one ordered stream.
pub trait Continuation: Clone + fmt::Debug + fmt::Display + Send + Sync + Sized {
    /// Parse the canonical string form. See the module docs for the three outcomes.
    fn parse(value: Option<&str>) -> Result<Option<Self>, ContinuationError>;
}

/// Sort direction of a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Apply this direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Split `<key>_<id>` on the first separator.
///
/// Returns `None` when the input is absent, empty, or has no separator.
pub(crate) fn split_key_id(value: Option<&str>) -> Option<(&str, &str)> {
    let value = value?;
    if value.is_empty() {
        return None;
    }
    value.split_once(SEPARATOR)
}
