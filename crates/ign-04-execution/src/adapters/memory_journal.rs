//! In-memory journal for tests and embedding.

use crate::domain::JournalMessage;
use crate::errors::JournalError;
use crate::ports::Journal;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Journal kept in a vector. Clones of the messages are handed out, so a
/// journal can be shared between runs to simulate a restart.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    messages: Mutex<Vec<JournalMessage>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Journal pre-filled with `messages`.
    #[must_use]
    pub fn with_messages(messages: Vec<JournalMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }

    /// Snapshot of the recorded messages.
    #[must_use]
    pub fn messages(&self) -> Vec<JournalMessage> {
        self.messages.lock().clone()
    }

    /// Number of recorded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn record(&self, message: &JournalMessage) -> Result<(), JournalError> {
        self.messages.lock().push(message.clone());
        Ok(())
    }

    async fn read(&self) -> Result<Vec<JournalMessage>, JournalError> {
        Ok(self.messages())
    }
}
