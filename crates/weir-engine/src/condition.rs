//! Per-stream outcome of the most recent read.

use indexmap::IndexMap;

/// Whether the last read of each stream succeeded.
///
/// Streams that were never read are unset and do not block gated
/// commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionTable {
    outcomes: IndexMap<String, bool>,
}

impl ConditionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a read of `stream`.
    pub fn record(&mut self, stream: &str, ok: bool) {
        match self.outcomes.get_mut(stream) {
            Some(slot) => *slot = ok,
            None => {
                self.outcomes.insert(stream.to_string(), ok);
            }
        }
    }

    /// The recorded outcome for `stream`, if any.
    pub fn get(&self, stream: &str) -> Option<bool> {
        self.outcomes.get(stream).copied()
    }

    /// Whether a command gated on `condition` may run.
    pub fn allows(&self, condition: Option<&str>) -> bool {
        condition.is_none_or(|stream| self.get(stream).unwrap_or(true))
    }
}
