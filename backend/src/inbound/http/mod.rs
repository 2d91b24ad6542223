//! HTTP inbound adapter exposing the chat webhook and health probes.

pub mod error;
pub mod health;
pub mod state;
pub mod update;
pub mod webhook;

pub use error::ApiResult;
