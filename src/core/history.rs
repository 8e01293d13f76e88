//! In-memory session history.

use crate::core::turn::Turn;
use serde::Serialize;

/// Ordered history of completed exchanges for one session.
///
/// History grows only by whole user/assistant pairs via
/// [`SessionHistory::record_exchange`] and shrinks only by
/// [`SessionHistory::clear`]. It is never persisted.
///
/// # Examples
///
/// ```
/// use transcript_qa::core::SessionHistory;
///
/// let mut history = SessionHistory::new();
/// history.record_exchange("What was FY23 revenue?", "₹70,000 Cr");
/// assert_eq!(history.len(), 2);
///
/// history.clear();
/// assert!(history.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionHistory {
    turns: Vec<Turn>,
}

impl SessionHistory {
    /// Creates an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a completed exchange: the user turn, then the assistant turn.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.reserve(2);
        self.turns.push(Turn::user(question));
        self.turns.push(Turn::assistant(answer));
    }

    /// Discards every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Returns the turns in insertion order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns (always even).
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the history holds no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed exchanges.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.turns.len() / 2
    }
}
