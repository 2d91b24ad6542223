//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod chat_command;
mod counter_store;
mod reply_sink;

#[cfg(test)]
pub use chat_command::MockChatCommand;
pub use chat_command::ChatCommand;
#[cfg(test)]
pub use counter_store::MockCounterStore;
pub use counter_store::{CounterStore, CounterStoreError, ScanCursor, ScanPage, StoredRecord};
#[cfg(test)]
pub use reply_sink::MockReplySink;
pub use reply_sink::{LoggingReplySink, ReplySink, ReplySinkError};
