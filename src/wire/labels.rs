//! Auto-label generation for unlabeled branches.

/// Monotonic label generator owned by a [`Wire`](crate::Wire).
///
/// Branching without an explicit label draws the next `knot<N>` name from
/// this sequence. Every wire owns its own sequence, so independent trees
/// never share uniqueness state, and tests can inject a deterministic one.
#[derive(Debug, Clone)]
pub struct LabelSequence {
    prefix: String,
    next: u64,
}

impl Default for LabelSequence {
    fn default() -> Self {
        LabelSequence {
            prefix: "knot".to_string(),
            next: 1,
        }
    }
}

impl LabelSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sequence with a custom prefix, counting from 1.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        LabelSequence {
            prefix: prefix.into(),
            next: 1,
        }
    }

    pub(crate) fn next_label(&mut self) -> String {
        let label = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        label
    }
}
