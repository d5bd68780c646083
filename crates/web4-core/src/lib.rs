pub mod block;
pub mod codec;
pub mod constants;
pub mod error;
pub mod event;
pub mod transaction;
pub mod types;

pub use block::{Block, MrhSets};
pub use error::{ErrorKind, LedgerError};
pub use event::Event;
pub use transaction::{
    AuthorizationLevel, EnergyOperationType, QueuePriority, RevocationType, RoleType, TensorType,
    Transaction, TxKind, TxPayload, Witness, R6,
};
pub use types::*;
