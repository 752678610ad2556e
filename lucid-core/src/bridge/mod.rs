//! Serial bridge
//!
//! Owns the UART driver, pumps received bytes to a sink and carries writes
//! from request handlers back to the wire.

pub mod serial;
pub mod stats;

pub use serial::{BridgeError, BridgePhase, BridgeSink, SerialBridge};
pub use stats::{BridgeCounters, BridgeStatistics};
