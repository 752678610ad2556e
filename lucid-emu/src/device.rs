//! Concrete device types
//!
//! Tasks cannot be generic, so the emulator pins every subsystem to the
//! simulated drivers here.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use lucid_core::broadcast::FanOut;
use lucid_core::config::{MAX_SUBSCRIBERS, RENDER_QUEUE_CAPACITY};
use lucid_core::connectivity::ConnectivityManager;
use lucid_core::console::FanOutBridge;
use lucid_core::render::RenderQueue;
use lucid_core::Console;

use crate::sim::{FileStore, SimClient, SimRadio, SimSerial};

pub type Raw = CriticalSectionRawMutex;

pub type Fan = FanOut<Raw, SimClient, MAX_SUBSCRIBERS>;

pub type Bridge = FanOutBridge<'static, Raw, SimSerial, SimClient, MAX_SUBSCRIBERS>;

pub type Render = RenderQueue<Raw, RENDER_QUEUE_CAPACITY>;

pub type Connectivity = ConnectivityManager<Raw, SimRadio, FileStore>;

pub type DeviceConsole =
    Console<'static, Raw, SimSerial, SimRadio, FileStore, SimClient, RENDER_QUEUE_CAPACITY, MAX_SUBSCRIBERS>;

/// Render commands for the display task
pub static RENDER: Render = RenderQueue::new();
