//! Domain layer: futures, arguments, runtime values and modules.

pub mod arguments;
pub mod futures;
pub mod module;
pub mod runtime_values;

pub use arguments::{AddressArgument, AmountArgument, Argument, DataArgument, SenderArgument};
pub use futures::{
    ContractAt, ContractCall, ContractDeployment, Dependency, EncodeFunctionCall, Future, FutureKind,
    FutureRef, FutureType, LibraryDeployment, ReadEventArgument, SendData, StaticCall,
};
pub use module::IgnitionModule;
pub use runtime_values::{AccountRuntimeValue, ModuleParameterRuntimeValue, ParameterResolver};
