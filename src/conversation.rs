//! Session-scoped question/answer log.

/// One answered question. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    question: String,
    answer: String,
}

impl ConversationEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// Append-only log of entries in the order they were answered
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    entries: Vec<ConversationEntry>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the end and return it.
    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) -> &ConversationEntry {
        self.entries.push(ConversationEntry::new(question, answer));
        &self.entries[self.entries.len() - 1]
    }

    /// Entries in insertion order.
    pub fn all(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Entries most recent first, for display.
    pub fn newest_first(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
