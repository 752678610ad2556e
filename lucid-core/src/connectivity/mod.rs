//! WiFi connectivity
//!
//! Boots into station mode when credentials are stored, otherwise into a
//! provisioning access point, and follows driver events from there.
//!
//! ```text
//!          Boot(no creds / sta fail)         Connect
//!   Init ───────────────────────────► AP ─────────────┐
//!    │                                ▲               ▼
//!    │ Boot(sta started)    ResetToAp │        StaConnecting ◄──┐
//!    └────────────────────────────────┼──────────►  │           │ ReconnectIssued
//!                                     │       GotIp │           │
//!                                     │             ▼           │
//!                                     │       StaConnected ──► StaDisconnected
//!                                     │               Disconnected
//! ```

pub mod events;
pub mod machine;
pub mod manager;
pub mod state;

pub use events::{Effect, Event};
pub use machine::{MachineParams, Transition};
pub use manager::{ap_ssid, validate_credentials, ConnectError, ConnectivityError, ConnectivityManager};
pub use state::{ConnectivityState, WifiMode, NO_SIGNAL_RSSI};
