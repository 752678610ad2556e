//! Inter-task communication channels
//!
//! Static channels connecting the simulated radio and serial peer to the
//! device tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;
use heapless::String;
use lucid_core::connectivity::Event;
use lucid_core::StopToken;
use lucid_hal::credentials::MAX_SSID_LEN;
use portable_atomic::AtomicBool;

/// Channel capacity for radio events
const EVENT_CHANNEL_SIZE: usize = 8;

/// Receive FIFO of the simulated UART
pub const SERIAL_FIFO_SIZE: usize = 1024;

/// Radio operations requested by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCommand {
    /// Join `ssid` as a station
    Associate { ssid: String<MAX_SSID_LEN> },
    /// Retry the last station network
    Reconnect,
    /// Serve the provisioning access point
    HostAp,
    Stop,
}

/// Latest radio command (a newer command replaces an unhandled one)
pub static RADIO_CMD: Signal<CriticalSectionRawMutex, RadioCommand> = Signal::new();

/// Radio events for the connectivity state machine
pub static WIFI_EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> = Channel::new();

/// Bytes waiting on the receive side of the UART
pub static SERIAL_FIFO: Pipe<CriticalSectionRawMutex, SERIAL_FIFO_SIZE> = Pipe::new();

/// Set when bytes were lost because the receive FIFO was full
pub static SERIAL_OVERRUN: AtomicBool = AtomicBool::new(false);

/// Requests every periodic task to wind down
pub static STOP: StopToken = StopToken::new();
