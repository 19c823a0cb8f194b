//! SMS alerter - forwards error-level log events to phone numbers
//!
//! This library provides the alert sink, the MessageBird transport, the
//! `tracing` bridge that feeds them, and the small HTTP surface used to
//! trigger a test alert.
pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod formatting;
pub mod notification;
pub mod server;
pub mod services;
pub mod sink;

// Re-export core types for convenience
pub use crate::core::*;
