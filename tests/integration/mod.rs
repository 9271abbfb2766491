//! Integration tests
//!
//! End-to-end scenarios for the provider layer, run against a scripted
//! transport stub instead of the network.

mod stubs;

mod gemini_stream_test;
mod lifecycle_test;
mod models_test;
