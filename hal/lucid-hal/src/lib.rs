//! LucidConsole Hardware Abstraction Layer
//!
//! This crate defines the driver seams the bridge core talks to. Board
//! support crates (or the host emulator) implement them for real radios,
//! UARTs and displays.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (lucid-emu, board fw)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lucid-core (bridge, render, wifi, sse) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lucid-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::SerialTransport`], [`uart::SerialRx`], [`uart::SerialTx`] - Serial link
//! - [`display::DisplayBackend`] - Character-cell status display
//! - [`wifi::NetworkDriver`] - Radio control (AP and station)
//! - [`credentials::CredentialStore`] - Persistent WiFi credentials
//! - [`net::Subscriber`] - Live event-stream client connection
//! - [`system::SystemInfo`] - Platform statistics

#![no_std]
#![deny(unsafe_code)]

pub mod credentials;
pub mod display;
pub mod net;
pub mod system;
pub mod uart;
pub mod wifi;

// Re-export key traits at crate root for convenience
pub use credentials::{CredentialStore, Credentials, StoreError};
pub use display::{DisplayBackend, DisplayBus, DisplayError, ExclusiveBus};
pub use net::{Message, Subscriber};
pub use system::SystemInfo;
pub use uart::{RxEvent, SerialRx, SerialTransport, SerialTx, UartConfig};
pub use wifi::{ApSettings, NetworkDriver};
