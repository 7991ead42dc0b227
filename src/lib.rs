//! Pushcast - HTTP/2 server push for static media segments
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod metrics;
pub mod push;
pub mod server;
