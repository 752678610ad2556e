//! Render commands

use core::net::Ipv4Addr;

use heapless::String;
use lucid_hal::credentials::MAX_SSID_LEN;

use crate::connectivity::WifiMode;

/// Number of text rows on the display
pub const MAX_LINES: u8 = 8;

/// Characters per text row
pub const MAX_LINE_LEN: usize = 21;

/// Text of one display row
pub type LineText = String<MAX_LINE_LEN>;

/// One row of text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextLine {
    /// Row (0..8)
    pub line: u8,
    pub text: LineText,
    /// Blank the row before drawing
    pub clear: bool,
}

/// Values shown on the periodic status screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusScreen {
    pub uptime_s: u32,
    pub free_memory: u32,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub mode: WifiMode,
    pub ssid: String<MAX_SSID_LEN>,
    pub ip: Ipv4Addr,
    pub rssi: i8,
    pub client_count: u8,
}

/// A request for the display task
///
/// Consumed exactly once, in FIFO order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    TextLine(TextLine),
    ClearScreen,
    DisplayPower(bool),
    StatusUpdate(StatusScreen),
}
