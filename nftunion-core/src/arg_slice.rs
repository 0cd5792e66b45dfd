//! Source-tagged page: a Slice plus the source id and the continuation used to request it.

use serde::{Deserialize, Serialize};

use crate::combined::COMPLETED;
use crate::slice::Slice;

/// One source's contribution to a merge round.
///
/// `requested_continuation` is what tells "contributed zero winners" apart
/// from "genuinely exhausted": a source that wins nothing keeps it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSlice<E> {
    pub source_id: String,
    pub requested_continuation: Option<String>,
    pub slice: Slice<E>,
}

impl<E> ArgSlice<E> {
    pub fn new(
        source_id: impl Into<String>,
        requested_continuation: Option<String>,
        slice: Slice<E>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            requested_continuation,
            slice,
        }
    }

    /// Placeholder for a source already drained in an earlier round. Such a
    /// source must not be fetched again.
    pub fn completed(source_id: impl Into<String>) -> Self {
        Self::new(source_id, Some(COMPLETED.to_string()), Slice::empty())
    }

    pub fn is_completed(&self) -> bool {
        self.requested_continuation.as_deref() == Some(COMPLETED)
    }
}
