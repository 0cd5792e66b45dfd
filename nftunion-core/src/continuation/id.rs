use std::fmt;

use super::{Continuation, ContinuationError};

/// Resume position keyed by the entity id alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdContinuation(pub String);

impl IdContinuation {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for IdContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Continuation for IdContinuation {
    fn parse(value: Option<&str>) -> Result<Option<Self>, ContinuationError> {
        Ok(value.filter(|v| !v.is_empty()).map(Self::new))
    }
}
