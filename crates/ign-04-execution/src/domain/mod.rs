//! Domain layer: execution states, journal messages and the reducer.

pub mod fees;
pub mod messages;
pub mod reducer;
pub mod state;

pub use fees::bump_fees;
pub use messages::JournalMessage;
pub use reducer::DeploymentState;
pub use state::{
    ExecutionRequest, ExecutionResult, ExecutionState, ExecutionStatus, NetworkFees, NetworkInteraction,
    OnchainInteraction, ReceiptStatus, SentTransaction, StaticCallInteraction, SuccessValue, TransactionReceipt,
};
