//! Outbound ports of the execution engine.

pub mod chain;
pub mod journal;

pub use chain::{BlockInfo, BlockTag, CallRequest, ChainClient, TransactionInfo, TransactionRequest};
pub use journal::Journal;
