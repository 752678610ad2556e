//! Board-agnostic core of the LucidConsole WiFi-to-UART bridge
//!
//! This crate contains the concurrent parts of the device that do not
//! depend on a specific chip or radio:
//!
//! - Serial bridge (UART receive loop, send path, counters)
//! - Render queue and rate-limited display task
//! - Connectivity state machine (provisioning AP and station modes)
//! - Broadcast fan-out to live event-stream subscribers
//! - Device configuration and the status surface for request handlers
//!
//! Every component is an explicit context object. The application owns
//! them (typically in `StaticCell`s) and hands out references.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This must go first so the log macros are visible to every module
mod fmt;

pub mod bridge;
pub mod broadcast;
pub mod cancel;
pub mod config;
pub mod connectivity;
pub mod console;
pub mod render;
pub mod status;
pub mod text;

#[cfg(test)]
mod testing;

pub use cancel::StopToken;
pub use console::Console;
pub use status::SystemStatus;
