//! Status display abstractions
//!
//! The display is a character-cell panel (8 rows of 21 columns on the
//! 128x64 boards). Drawing goes to a frame buffer and only reaches the
//! panel on [`DisplayBackend::flush`].

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};

/// Pixel height of one character row
pub const ROW_HEIGHT: u16 = 8;

/// Pixel width of one character cell
pub const CHAR_WIDTH: u16 = 6;

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
    /// Invalid coordinates or dimensions
    InvalidCoordinates,
    /// Display not initialized
    NotInitialized,
    /// Shared bus could not be acquired in time
    BusTimeout,
}

/// Display backend trait
///
/// Provides a hardware-agnostic interface for rendering status text.
pub trait DisplayBackend {
    /// Clear the frame buffer
    fn clear(&mut self) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Draw text at the specified row and column
    ///
    /// - `row`: Row number (0-based)
    /// - `col`: Column number in characters (0-based)
    /// - `text`: Text to display, clipped at the right edge
    fn draw_text(
        &mut self,
        row: u8,
        col: u8,
        text: &str,
    ) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Fill (`on`) or blank a pixel rectangle
    fn fill_rect(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        on: bool,
    ) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Switch the panel on or off without touching the frame buffer
    fn set_power(&mut self, on: bool) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Send the frame buffer to the panel
    fn flush(&mut self) -> impl core::future::Future<Output = Result<(), DisplayError>>;

    /// Get the display dimensions
    ///
    /// Returns (columns, rows) in character units
    fn dimensions(&self) -> (u8, u8);
}

/// Raw command/data link to a display controller
pub trait DisplayBus {
    /// Error type for bus transfers
    type Error;

    /// Send a single controller command byte
    fn send_command(&mut self, command: u8) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Send frame buffer data
    fn send_data(&mut self, data: &[u8]) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}

/// Default time a display operation may wait for the shared bus
pub const BUS_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(1000);

/// A bus shared between the display and other peripherals
///
/// Every display operation takes the bus for its whole duration. If the
/// bus stays busy for longer than the acquire timeout the operation fails
/// with [`DisplayError::BusTimeout`] instead of blocking the render loop.
pub struct ExclusiveBus<M: RawMutex, B> {
    bus: Mutex<M, B>,
    timeout: Duration,
}

impl<M: RawMutex, B> ExclusiveBus<M, B> {
    /// Wrap a bus using the default acquire timeout
    pub const fn new(bus: B) -> Self {
        Self::with_timeout(bus, BUS_ACQUIRE_TIMEOUT)
    }

    /// Wrap a bus with a custom acquire timeout
    pub const fn with_timeout(bus: B, timeout: Duration) -> Self {
        Self {
            bus: Mutex::new(bus),
            timeout,
        }
    }

    /// Take the bus, giving up after the acquire timeout
    pub async fn acquire(&self) -> Result<MutexGuard<'_, M, B>, DisplayError> {
        with_timeout(self.timeout, self.bus.lock())
            .await
            .map_err(|_| DisplayError::BusTimeout)
    }
}
