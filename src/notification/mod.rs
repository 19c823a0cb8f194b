//! Delivers alerts to the messaging provider.
//!
//! `layer` turns `tracing` events into queued `LogEvent`s, `worker` drains the
//! queue on its own thread through the alert sink, and `messagebird` is the
//! transport the sink sends through in production.
pub mod layer;
pub mod messagebird;
pub mod worker;
