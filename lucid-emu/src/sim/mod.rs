//! Simulated drivers
//!
//! Host implementations of the driver traits. The radio and serial peer
//! are driven by tasks through the static channels.

pub mod client;
pub mod display;
pub mod radio;
pub mod serial;
pub mod store;

pub use client::SimClient;
pub use display::{SimBus, TerminalDisplay};
pub use radio::SimRadio;
pub use serial::SimSerial;
pub use store::FileStore;

use lucid_hal::SystemInfo;

/// Reports a fixed amount of free memory
pub struct SimSystem {
    free_memory: u32,
}

impl SimSystem {
    pub fn new(free_memory: u32) -> Self {
        Self { free_memory }
    }
}

impl SystemInfo for SimSystem {
    fn free_memory(&self) -> u32 {
        self.free_memory
    }
}
