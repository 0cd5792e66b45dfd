//! Combined continuation: one string carrying every source's resume state.
//!
//! Wire format: `id1:cur1;id2:cur2;...`, sources in id order. Parsing splits on
//! `;` first, then each piece on the FIRST `:` only, so cursor values may
//! contain `:` (e.g. `ETHEREUM:0xabc:1` item ids). There is no escaping:
//! source ids must not contain `:` or `;`, and cursors must not contain `;`.
//!
//! A source absent from the map has never been touched; `COMPLETED` marks a
//! drained source that must not be fetched again.

use std::collections::BTreeMap;
use std::fmt;

use crate::continuation::ContinuationError;

/// Sentinel value for a drained source.
pub const COMPLETED: &str = "COMPLETED";

const PAIR_SEPARATOR: char = ';';
const KEY_SEPARATOR: char = ':';

/// Resume state of one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceState {
    /// Never fetched: start from the beginning.
    Unset,
    /// Resume after this cursor.
    Active(String),
    /// Fully drained.
    Completed,
}

impl SourceState {
    /// Interpret a per-source continuation as seen on an ArgSlice.
    pub fn from_requested(value: Option<&str>) -> Self {
        match value {
            None | Some("") => SourceState::Unset,
            Some(COMPLETED) => SourceState::Completed,
            Some(cursor) => SourceState::Active(cursor.to_string()),
        }
    }

    /// The per-source continuation to hand to a fetch, `None` for a fresh start.
    pub fn as_requested(&self) -> Option<&str> {
        match self {
            SourceState::Unset => None,
            SourceState::Active(cursor) => Some(cursor),
            SourceState::Completed => Some(COMPLETED),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SourceState::Completed)
    }
}

/// Per-source resume states packed into one opaque client cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombinedContinuation {
    states: BTreeMap<String, SourceState>,
}

impl CombinedContinuation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a client cursor. `None` and `""` both decode to the empty value.
    pub fn parse(value: Option<&str>) -> Result<Self, ContinuationError> {
        let Some(input) = value else {
            return Ok(Self::default());
        };

        let mut states = BTreeMap::new();
        for piece in input.split(PAIR_SEPARATOR).filter(|p| !p.is_empty()) {
            let (source_id, cursor) = piece.split_once(KEY_SEPARATOR).ok_or_else(|| {
                ContinuationError::malformed_combined(input, format!("missing ':' in '{piece}'"))
            })?;
            if source_id.is_empty() {
                return Err(ContinuationError::malformed_combined(
                    input,
                    format!("empty source id in '{piece}'"),
                ));
            }
            if cursor.is_empty() {
                return Err(ContinuationError::malformed_combined(
                    input,
                    format!("empty cursor for source '{source_id}'"),
                ));
            }
            states.insert(
                source_id.to_string(),
                SourceState::from_requested(Some(cursor)),
            );
        }
        Ok(Self { states })
    }

    /// State of one source; untouched sources are `Unset`.
    pub fn state(&self, source_id: &str) -> SourceState {
        self.states
            .get(source_id)
            .cloned()
            .unwrap_or(SourceState::Unset)
    }

    /// Raw per-source continuation (cursor string or `COMPLETED`).
    pub fn get(&self, source_id: &str) -> Option<&str> {
        self.states.get(source_id).and_then(|s| s.as_requested())
    }

    /// Return a copy with `source_id` set to `state`. Setting `Unset` removes the source.
    pub fn with_state(mut self, source_id: impl Into<String>, state: SourceState) -> Self {
        self.set(source_id.into(), state);
        self
    }

    pub(crate) fn set(&mut self, source_id: String, state: SourceState) {
        match state {
            SourceState::Unset => {
                self.states.remove(&source_id);
            }
            SourceState::Active(cursor) if cursor.is_empty() => {
                self.states.remove(&source_id);
            }
            state => {
                self.states.insert(source_id, state);
            }
        }
    }

    /// True when every listed source is `Completed`. Vacuously true for no sources.
    pub fn all_completed<'a>(&self, source_ids: impl IntoIterator<Item = &'a str>) -> bool {
        source_ids
            .into_iter()
            .all(|id| self.state(id).is_completed())
    }

    /// Iterate `(source_id, state)` in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceState)> {
        self.states.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Whether this value survives the unescaped wire format unchanged.
    ///
    /// An active cursor spelled `COMPLETED` would read back as a drained source.
    pub fn is_wire_safe(&self) -> bool {
        self.states.iter().all(|(id, state)| {
            is_wire_safe_source_id(id)
                && match state {
                    SourceState::Active(cursor) => {
                        cursor != COMPLETED && !cursor.contains(PAIR_SEPARATOR)
                    }
                    SourceState::Completed => true,
                    SourceState::Unset => false,
                }
        })
    }
}

/// Source ids share the wire alphabet with the separators, so neither may appear.
pub fn is_wire_safe_source_id(source_id: &str) -> bool {
    !source_id.is_empty()
        && !source_id.contains(PAIR_SEPARATOR)
        && !source_id.contains(KEY_SEPARATOR)
}

impl fmt::Display for CombinedContinuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (source_id, state) in &self.states {
            let Some(cursor) = state.as_requested() else {
                continue;
            };
            if !first {
                write!(f, "{PAIR_SEPARATOR}")?;
            }
            write!(f, "{source_id}{KEY_SEPARATOR}{cursor}")?;
            first = false;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, SourceState)> for CombinedContinuation {
    fn from_iter<T: IntoIterator<Item = (S, SourceState)>>(iter: T) -> Self {
        let mut combined = Self::default();
        for (source_id, state) in iter {
            combined.set(source_id.into(), state);
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_parse_to_empty() {
        let empty = CombinedContinuation::new();
        assert_eq!(CombinedContinuation::parse(None).unwrap(), empty);
        assert_eq!(CombinedContinuation::parse(Some("")).unwrap(), empty);
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    fn parse_and_format() {
        let c = CombinedContinuation::parse(Some("a:10_ID1;b:COMPLETED")).unwrap();
        assert_eq!(c.state("a"), SourceState::Active("10_ID1".into()));
        assert_eq!(c.state("b"), SourceState::Completed);
        assert_eq!(c.state("c"), SourceState::Unset);
        assert_eq!(c.to_string(), "a:10_ID1;b:COMPLETED");
    }

    #[test]
    fn cursor_may_contain_colons() {
        let c = CombinedContinuation::parse(Some("ETHEREUM:1700_ETHEREUM:0xabc:42")).unwrap();
        assert_eq!(c.get("ETHEREUM"), Some("1700_ETHEREUM:0xabc:42"));
        assert_eq!(c.to_string(), "ETHEREUM:1700_ETHEREUM:0xabc:42");
    }

    #[test]
    fn output_is_sorted_by_source_id() {
        let c: CombinedContinuation = vec![
            ("b", SourceState::Active("7_ID5".into())),
            ("a", SourceState::Active("10_ID1".into())),
        ]
        .into_iter()
        .collect();
        assert_eq!(c.to_string(), "a:10_ID1;b:7_ID5");
    }

    #[test]
    fn piece_without_colon_is_malformed() {
        let err = CombinedContinuation::parse(Some("a:1;garbage")).unwrap_err();
        assert!(matches!(err, ContinuationError::MalformedCombined { .. }));
    }

    #[test]
    fn empty_id_or_cursor_is_malformed() {
        assert!(CombinedContinuation::parse(Some(":10_a")).is_err());
        assert!(CombinedContinuation::parse(Some("a:")).is_err());
    }

    #[test]
    fn trailing_separator_is_ignored() {
        let c = CombinedContinuation::parse(Some("a:COMPLETED;")).unwrap();
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn setting_unset_removes() {
        let c = CombinedContinuation::new()
            .with_state("a", SourceState::Completed)
            .with_state("a", SourceState::Unset);
        assert!(c.is_empty());
    }

    #[test]
    fn all_completed_checks_listed_sources() {
        let c = CombinedContinuation::new().with_state("a", SourceState::Completed);
        assert!(c.all_completed(["a"]));
        assert!(!c.all_completed(["a", "b"]));
        assert!(c.all_completed([]));
    }

    #[test]
    fn wire_safety() {
        let ok = CombinedContinuation::new().with_state("a", SourceState::Active("1_x:y".into()));
        assert!(ok.is_wire_safe());
        let bad = CombinedContinuation::new().with_state("a", SourceState::Active("1_x;y".into()));
        assert!(!bad.is_wire_safe());
        let bad_id = CombinedContinuation::new().with_state("a:b", SourceState::Completed);
        assert!(!bad_id.is_wire_safe());
    }

    #[test]
    fn active_cursor_spelled_like_the_sentinel_is_not_wire_safe() {
        let c = CombinedContinuation::new().with_state("a", SourceState::Active(COMPLETED.into()));
        assert!(!c.is_wire_safe());
        // It would come back as a drained source.
        let reparsed = CombinedContinuation::parse(Some(&c.to_string())).unwrap();
        assert_eq!(reparsed.state("a"), SourceState::Completed);
    }
}
