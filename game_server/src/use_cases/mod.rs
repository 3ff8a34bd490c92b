// Use cases layer: application workflows for the session server.

pub mod accounts;
pub mod registry;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use accounts::AccountService;
pub use registry::{SessionError, SessionHandle, SessionRegistry, SessionSettings};
pub use types::{SessionEvent, SessionFrame, SessionMessage, SessionUpdate, TradeReceipt};
