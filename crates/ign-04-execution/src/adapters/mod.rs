//! Adapters implementing the outbound ports.

pub mod file_journal;
pub mod memory_chain;
pub mod memory_journal;

pub use file_journal::FileJournal;
pub use memory_chain::{InMemoryChain, ScriptedResponse, DEFAULT_CHAIN_ID};
pub use memory_journal::MemoryJournal;
