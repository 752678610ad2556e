//! Terminal status display
//!
//! A character-cell stand-in for the 128x64 OLED (21 chars x 8 rows).
//! Flushing walks the pages over a [`DisplayBus`] exactly like the panel
//! driver does; the simulated bus prints the finished frame.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use lucid_hal::display::{CHAR_WIDTH, ROW_HEIGHT};
use lucid_hal::{DisplayBackend, DisplayBus, DisplayError, ExclusiveBus};
use log::*;

const COLS: usize = 21;
const ROWS: usize = 8;

/// Panel commands understood by the simulated bus
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
}

/// Bus end of the simulated panel
pub struct SimBus {
    page: usize,
    pages: [[u8; COLS]; ROWS],
    powered: bool,
    frames: u32,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            page: 0,
            pages: [[b' '; COLS]; ROWS],
            powered: true,
            frames: 0,
        }
    }

    /// Text currently latched in a page
    pub fn page_text(&self, page: usize) -> &str {
        self.pages
            .get(page)
            .and_then(|row| core::str::from_utf8(row).ok())
            .unwrap_or("")
    }

    fn print_frame(&self) {
        let border = "-".repeat(COLS);
        let mut out = format!("+{}+", border);
        for page in 0..ROWS {
            out.push_str(&format!("\n|{}|", self.page_text(page)));
        }
        out.push_str(&format!("\n+{}+", border));
        debug!("Display frame {}\n{}", self.frames, out);
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBus for SimBus {
    type Error = Infallible;

    async fn send_command(&mut self, command: u8) -> Result<(), Infallible> {
        match command {
            cmd::DISPLAY_OFF => {
                self.powered = false;
                info!("Display off");
            }
            cmd::DISPLAY_ON => {
                self.powered = true;
                info!("Display on");
            }
            c if c & 0xF0 == cmd::SET_PAGE_ADDR => self.page = usize::from(c & 0x0F),
            c => trace!("Display command {:#04x}", c),
        }
        Ok(())
    }

    async fn send_data(&mut self, data: &[u8]) -> Result<(), Infallible> {
        if let Some(row) = self.pages.get_mut(self.page) {
            let len = data.len().min(COLS);
            row[..len].copy_from_slice(&data[..len]);
        }
        if self.page == ROWS - 1 {
            self.frames += 1;
            if self.powered {
                self.print_frame();
            }
        }
        Ok(())
    }
}

/// Display backend drawing into a character buffer
pub struct TerminalDisplay {
    bus: &'static ExclusiveBus<CriticalSectionRawMutex, SimBus>,
    cells: [[u8; COLS]; ROWS],
}

impl TerminalDisplay {
    pub fn new(bus: &'static ExclusiveBus<CriticalSectionRawMutex, SimBus>) -> Self {
        Self {
            bus,
            cells: [[b' '; COLS]; ROWS],
        }
    }
}

impl DisplayBackend for TerminalDisplay {
    async fn clear(&mut self) -> Result<(), DisplayError> {
        for row in self.cells.iter_mut() {
            row.fill(b' ');
        }
        Ok(())
    }

    async fn draw_text(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        let (row, col) = (usize::from(row), usize::from(col));
        if row >= ROWS || col >= COLS {
            return Err(DisplayError::InvalidCoordinates);
        }
        let cells = &mut self.cells[row][col..];
        for (cell, ch) in cells.iter_mut().zip(text.chars()) {
            *cell = if ch.is_ascii() && !ch.is_ascii_control() {
                ch as u8
            } else {
                b'?'
            };
        }
        Ok(())
    }

    async fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, on: bool) -> Result<(), DisplayError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        let first_col = usize::from(x / CHAR_WIDTH);
        let first_row = usize::from(y / ROW_HEIGHT);
        if first_col >= COLS || first_row >= ROWS {
            return Err(DisplayError::InvalidCoordinates);
        }
        let last_col = usize::from((x.saturating_add(width) - 1) / CHAR_WIDTH).min(COLS - 1);
        let last_row = usize::from((y.saturating_add(height) - 1) / ROW_HEIGHT).min(ROWS - 1);
        let fill = if on { b'#' } else { b' ' };
        for row in &mut self.cells[first_row..=last_row] {
            row[first_col..=last_col].fill(fill);
        }
        Ok(())
    }

    async fn set_power(&mut self, on: bool) -> Result<(), DisplayError> {
        let mut bus = self.bus.acquire().await?;
        let command = if on { cmd::DISPLAY_ON } else { cmd::DISPLAY_OFF };
        bus.send_command(command)
            .await
            .map_err(|_| DisplayError::Communication)
    }

    async fn flush(&mut self) -> Result<(), DisplayError> {
        let mut bus = self.bus.acquire().await?;
        for (page, row) in self.cells.iter().enumerate() {
            bus.send_command(cmd::SET_PAGE_ADDR | page as u8)
                .await
                .map_err(|_| DisplayError::Communication)?;
            bus.send_data(row)
                .await
                .map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    fn dimensions(&self) -> (u8, u8) {
        (COLS as u8, ROWS as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use static_cell::StaticCell;

    fn display(cell: &'static StaticCell<ExclusiveBus<CriticalSectionRawMutex, SimBus>>) -> TerminalDisplay {
        TerminalDisplay::new(cell.init(ExclusiveBus::new(SimBus::new())))
    }

    #[test]
    fn test_flush_transfers_every_page() {
        static BUS: StaticCell<ExclusiveBus<CriticalSectionRawMutex, SimBus>> = StaticCell::new();
        let mut display = display(&BUS);
        block_on(async {
            display.draw_text(0, 0, "LucidConsole AP").await.unwrap();
            display.draw_text(7, 18, "abcdef").await.unwrap();
            display.flush().await.unwrap();
            let bus = display.bus.acquire().await.unwrap();
            assert_eq!(bus.frames, 1);
            assert_eq!(bus.page_text(0), "LucidConsole AP      ");
            assert_eq!(bus.page_text(7), "                  abc");
        });
    }

    #[test]
    fn test_fill_rect_blanks_a_row() {
        static BUS: StaticCell<ExclusiveBus<CriticalSectionRawMutex, SimBus>> = StaticCell::new();
        let mut display = display(&BUS);
        block_on(async {
            display.draw_text(2, 0, "old text").await.unwrap();
            display.draw_text(3, 0, "keep").await.unwrap();
            display.fill_rect(0, 16, 126, 8, false).await.unwrap();
            display.flush().await.unwrap();
            let bus = display.bus.acquire().await.unwrap();
            assert_eq!(bus.page_text(2).trim(), "");
            assert_eq!(bus.page_text(3).trim(), "keep");
        });
    }

    #[test]
    fn test_out_of_range_text_rejected() {
        static BUS: StaticCell<ExclusiveBus<CriticalSectionRawMutex, SimBus>> = StaticCell::new();
        let mut display = display(&BUS);
        assert_eq!(
            block_on(display.draw_text(8, 0, "x")),
            Err(DisplayError::InvalidCoordinates)
        );
        assert_eq!(
            block_on(display.fill_rect(200, 0, 6, 8, true)),
            Err(DisplayError::InvalidCoordinates)
        );
    }

    #[test]
    fn test_power_commands_reach_bus() {
        static BUS: StaticCell<ExclusiveBus<CriticalSectionRawMutex, SimBus>> = StaticCell::new();
        let mut display = display(&BUS);
        block_on(async {
            display.set_power(false).await.unwrap();
            assert!(!display.bus.acquire().await.unwrap().powered);
            display.set_power(true).await.unwrap();
            assert!(display.bus.acquire().await.unwrap().powered);
        });
    }
}
