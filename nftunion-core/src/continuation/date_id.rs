use chrono::{DateTime, Utc};
use std::fmt;

use super::{split_key_id, Continuation, ContinuationError, SEPARATOR};

/// Resume position keyed by a timestamp (millisecond precision) then id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateIdContinuation {
    pub date: DateTime<Utc>,
    pub id: String,
}

impl DateIdContinuation {
    /// Build a continuation, truncating the timestamp to milliseconds so the
    /// in-memory value equals its own parsed string form.
    pub fn new(date: DateTime<Utc>, id: impl Into<String>) -> Self {
        let millis = date.timestamp_millis();
        Self {
            date: DateTime::from_timestamp_millis(millis).unwrap_or(date),
            id: id.into(),
        }
    }

    pub fn from_millis(millis: i64, id: impl Into<String>) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|date| Self {
            date,
            id: id.into(),
        })
    }

    pub fn millis(&self) -> i64 {
        self.date.timestamp_millis()
    }
}

impl fmt::Display for DateIdContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.millis(), SEPARATOR, self.id)
    }
}

impl Continuation for DateIdContinuation {
    fn parse(value: Option<&str>) -> Result<Option<Self>, ContinuationError> {
        let Some((key, id)) = split_key_id(value) else {
            return Ok(None);
        };
        let input = value.unwrap_or_default();
        let millis: i64 = key
            .parse()
            .map_err(|e| ContinuationError::malformed(input, format!("date key: {e}")))?;
        Self::from_millis(millis, id)
            .map(Some)
            .ok_or_else(|| ContinuationError::malformed(input, "date out of range"))
    }
}
