//! UART serial communication abstractions
//!
//! The bridge reads from one half in its own loop while request handlers
//! write to the other, so the transport hands out independent halves.

use embassy_time::Duration;

/// Something that can bring up a UART peripheral
pub trait SerialTransport {
    /// Receive half produced by [`open`](Self::open)
    type Rx: SerialRx;
    /// Transmit half produced by [`open`](Self::open)
    type Tx: SerialTx;
    /// Error type for driver installation
    type Error;

    /// Install the driver with the given line settings
    ///
    /// Calling this again replaces any halves handed out earlier; the old
    /// halves must not be used afterwards.
    fn open(&mut self, config: &UartConfig) -> Result<(Self::Rx, Self::Tx), Self::Error>;
}

/// Event reported by the receive half of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// `n` bytes were copied into the caller's buffer
    Data(usize),
    /// Hardware FIFO overflowed and bytes were lost
    FifoOverflow,
    /// Driver ring buffer filled up
    BufferFull,
    /// Parity check failed on a received frame
    ParityError,
    /// Framing error on a received frame
    FrameError,
    /// Nothing happened before the wait elapsed
    Idle,
    /// Driver specific event the bridge does not act on
    Other(u8),
}

/// UART receiver
pub trait SerialRx {
    /// Wait up to `timeout` for the next driver event
    ///
    /// On [`RxEvent::Data`] the bytes have already been copied into `buf`.
    fn read_event(&mut self, buf: &mut [u8], timeout: Duration) -> impl core::future::Future<Output = RxEvent>;

    /// Discard any bytes still buffered in the driver
    fn flush_input(&mut self);

    /// Drop any queued driver events
    fn clear_events(&mut self);
}

/// UART transmitter
pub trait SerialTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Returns the number of bytes the driver accepted, which may be fewer
    /// than `data.len()`.
    fn write(&mut self, data: &[u8]) -> impl core::future::Future<Output = Result<usize, Self::Error>>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Hardware flow control (RTS/CTS)
    pub flow_control: bool,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: false,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopBits {
    One,
    Two,
}
