//! Configuration type definitions

use core::net::Ipv4Addr;

use heapless::String;
use lucid_hal::uart::{DataBits, Parity, StopBits};
use lucid_hal::credentials::MAX_PASSWORD_LEN;
use lucid_hal::UartConfig;

use crate::text::truncated;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Depth of the render command queue
pub const RENDER_QUEUE_CAPACITY: usize = 16;

/// Maximum simultaneous event-stream subscribers
pub const MAX_SUBSCRIBERS: usize = 4;

/// Largest serial chunk read in one pass of the bridge loop
pub const RX_CHUNK_CAPACITY: usize = 1024;

/// Maximum length of the AP SSID prefix
pub const MAX_PREFIX_LEN: usize = 22;

/// Maximum length of the status screen title
pub const MAX_TITLE_LEN: usize = 12;

/// Serial line settings and bridge loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SerialConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// RTS/CTS flow control
    pub flow_control: bool,
    /// How long one receive wait may block before the stop flag is checked
    pub event_wait_ms: u32,
    /// Bytes read per pass (at most [`RX_CHUNK_CAPACITY`])
    pub rx_chunk_len: u16,
}

impl SerialConfig {
    /// Line settings handed to the transport
    pub fn uart(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baud_rate,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
            flow_control: self.flow_control,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
            event_wait_ms: 100,
            rx_chunk_len: RX_CHUNK_CAPACITY as u16,
        }
    }
}

/// Display refresh timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RenderConfig {
    /// Display task period (at most one command per tick)
    pub tick_ms: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { tick_ms: 50 }
    }
}

/// What the state machine does after losing the station link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReconnectPolicy {
    /// Retry right away, indefinitely
    #[default]
    Immediate,
    /// Retry after a delay that doubles on each failure
    Backoff { initial_ms: u32, max_ms: u32 },
}

impl ReconnectPolicy {
    /// Delay before the given (zero-based) retry
    pub fn delay_ms(&self, attempt: u8) -> u32 {
        match *self {
            ReconnectPolicy::Immediate => 0,
            ReconnectPolicy::Backoff { initial_ms, max_ms } => {
                let factor = 1u32.checked_shl(u32::from(attempt)).unwrap_or(u32::MAX);
                initial_ms.saturating_mul(factor).min(max_ms)
            }
        }
    }
}

/// Access point and station behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ConnectivityConfig {
    /// Prefix of the AP SSID; the last two MAC bytes are appended in hex
    pub ap_ssid_prefix: String<MAX_PREFIX_LEN>,
    /// AP passphrase, empty for an open network
    pub ap_password: String<MAX_PASSWORD_LEN>,
    pub ap_channel: u8,
    pub ap_max_connections: u8,
    /// Device address on the AP network
    pub gateway: [u8; 4],
    pub netmask: [u8; 4],
    /// Pause between stopping the radio and restarting it as an AP
    pub settle_ms: u32,
    pub reconnect: ReconnectPolicy,
}

impl ConnectivityConfig {
    pub fn gateway(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.gateway)
    }

    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.netmask)
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            ap_ssid_prefix: truncated("LUCIDUART_"),
            ap_password: truncated("luciduart123"),
            ap_channel: 1,
            ap_max_connections: 4,
            gateway: [10, 10, 10, 1],
            netmask: [255, 255, 255, 0],
            settle_ms: 100,
            reconnect: ReconnectPolicy::Immediate,
        }
    }
}

/// Subscriber fan-out timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BroadcastConfig {
    /// Longest a single subscriber send may take before it counts as failed
    pub send_timeout_ms: u32,
    /// Keep-alive period
    pub heartbeat_ms: u32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 500,
            heartbeat_ms: 1000,
        }
    }
}

/// Periodic status screen
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct StatusConfig {
    pub period_ms: u32,
    /// First word of the top status line
    pub title: String<MAX_TITLE_LEN>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            title: truncated("LucidConsole"),
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DeviceConfig {
    pub serial: SerialConfig,
    pub render: RenderConfig,
    pub connectivity: ConnectivityConfig,
    pub broadcast: BroadcastConfig,
    pub status: StatusConfig,
}
