//! Page of entities from one stream plus the opaque string that resumes it.

use serde::{Deserialize, Serialize};

/// Entities and the continuation that resumes after them.
///
/// `continuation == None` means the stream is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice<E> {
    pub continuation: Option<String>,
    pub entities: Vec<E>,
}

impl<E> Slice<E> {
    pub fn new(continuation: Option<String>, entities: Vec<E>) -> Self {
        Self {
            continuation,
            entities,
        }
    }

    /// An exhausted, empty page.
    pub fn empty() -> Self {
        Self::new(None, Vec::new())
    }

    pub fn is_exhausted(&self) -> bool {
        self.continuation.is_none()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Convert entities while keeping the continuation.
    pub fn map<T>(self, f: impl FnMut(E) -> T) -> Slice<T> {
        Slice {
            continuation: self.continuation,
            entities: self.entities.into_iter().map(f).collect(),
        }
    }
}

impl<E> Default for Slice<E> {
    fn default() -> Self {
        Self::empty()
    }
}
