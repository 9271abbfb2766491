//! Unified Streaming
//!
//! Normalizes the streaming formats of all supported providers into a single
//! event model with uniform lifecycle rules.

pub mod adapter;
pub mod adapters;
pub mod exchange;
pub mod unified;

pub use adapter::StreamAdapter;
pub use exchange::ExchangeDriver;
pub use unified::{AdapterError, ChatStreamEvent};
