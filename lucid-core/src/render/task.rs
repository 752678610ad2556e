//! Display task
//!
//! Drains the render queue at a fixed cadence. At most one command is
//! handled per tick; display errors are logged and never end the loop.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};
use heapless::String;
use lucid_hal::display::{CHAR_WIDTH, ROW_HEIGHT};
use lucid_hal::{DisplayBackend, DisplayError};

use super::command::{RenderCommand, StatusScreen, TextLine};
use super::layout::status_lines;
use super::queue::RenderQueue;
use crate::cancel::StopToken;
use crate::config::{RenderConfig, MAX_TITLE_LEN};
use crate::text::truncated;

pub struct DisplayTask<'a, M: RawMutex, D, const N: usize> {
    queue: &'a RenderQueue<M, N>,
    display: D,
    period: Duration,
    title: String<MAX_TITLE_LEN>,
}

impl<'a, M: RawMutex, D: DisplayBackend, const N: usize> DisplayTask<'a, M, D, N> {
    pub fn new(queue: &'a RenderQueue<M, N>, display: D, config: &RenderConfig, title: &str) -> Self {
        Self {
            queue,
            display,
            period: Duration::from_millis(u64::from(config.tick_ms)),
            title: truncated(title),
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run until `stop` is requested
    ///
    /// Ticks are anchored to the task start, so slow commands do not push
    /// later ticks back.
    pub async fn run(&mut self, stop: &StopToken) {
        info!("Display task started");
        let mut ticker = Ticker::every(self.period);
        while !stop.is_requested() {
            // A command waits out the rest of its tick; an empty tick ends early
            if let Either::First(command) = select(self.queue.receive(), ticker.next()).await {
                if let Err(e) = self.apply(command).await {
                    warn!("Render command failed: {:?}", e);
                }
                ticker.next().await;
            }
        }
        info!("Display task stopped");
    }

    /// Draw one command
    pub async fn apply(&mut self, command: RenderCommand) -> Result<(), DisplayError> {
        match command {
            RenderCommand::TextLine(line) => self.draw_line(&line).await,
            RenderCommand::ClearScreen => {
                self.display.clear().await?;
                self.display.flush().await
            }
            RenderCommand::DisplayPower(on) => self.display.set_power(on).await,
            RenderCommand::StatusUpdate(status) => self.draw_status(&status).await,
        }
    }

    async fn draw_line(&mut self, line: &TextLine) -> Result<(), DisplayError> {
        if line.clear {
            let (cols, _) = self.display.dimensions();
            let y = u16::from(line.line) * ROW_HEIGHT;
            let width = u16::from(cols) * CHAR_WIDTH;
            self.display.fill_rect(0, y, width, ROW_HEIGHT, false).await?;
        }
        self.display.draw_text(line.line, 0, &line.text).await?;
        self.display.flush().await
    }

    async fn draw_status(&mut self, status: &StatusScreen) -> Result<(), DisplayError> {
        self.display.clear().await?;
        for (row, text) in status_lines(&self.title, status).iter().enumerate() {
            self.display.draw_text(row as u8, 0, text).await?;
        }
        self.display.flush().await
    }
}
