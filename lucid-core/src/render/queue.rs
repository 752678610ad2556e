//! Bounded render queue
//!
//! Producers never block: when the queue is full the command is dropped
//! and counted. The display task is the only consumer.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicU32, Ordering};

use super::command::{RenderCommand, StatusScreen, TextLine, MAX_LINES};
use crate::text::truncated;

/// Why a command was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnqueueError {
    /// Queue at capacity; the command was dropped
    QueueFull,
    /// Row index outside the display
    InvalidLine,
}

/// Queue depth and drop counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderStats {
    pub queued: u32,
    pub dropped: u32,
}

pub struct RenderQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, RenderCommand, N>,
    dropped: AtomicU32,
}

impl<M: RawMutex, const N: usize> RenderQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue any command without waiting
    pub fn submit(&self, command: RenderCommand) -> Result<(), EnqueueError> {
        self.channel.try_send(command).map_err(|_| {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Render queue full, dropped {} so far", dropped);
            EnqueueError::QueueFull
        })
    }

    /// Queue a row of text, truncated to the display width
    pub fn enqueue_text_line(&self, line: u8, text: &str, clear: bool) -> Result<(), EnqueueError> {
        if line >= MAX_LINES {
            return Err(EnqueueError::InvalidLine);
        }
        self.submit(RenderCommand::TextLine(TextLine {
            line,
            text: truncated(text),
            clear,
        }))
    }

    pub fn enqueue_clear_screen(&self) -> Result<(), EnqueueError> {
        self.submit(RenderCommand::ClearScreen)
    }

    pub fn enqueue_display_power(&self, on: bool) -> Result<(), EnqueueError> {
        self.submit(RenderCommand::DisplayPower(on))
    }

    pub fn enqueue_status(&self, status: StatusScreen) -> Result<(), EnqueueError> {
        self.submit(RenderCommand::StatusUpdate(status))
    }

    /// Wait for the next command
    pub async fn receive(&self) -> RenderCommand {
        self.channel.receive().await
    }

    pub fn try_receive(&self) -> Option<RenderCommand> {
        self.channel.try_receive().ok()
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            queued: self.channel.len() as u32,
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl<M: RawMutex, const N: usize> Default for RenderQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
