//! Render queue and display task
//!
//! Any component may queue display updates; a single display task draws
//! them at a fixed cadence.

pub mod command;
pub mod layout;
pub mod queue;
pub mod task;

pub use command::{LineText, RenderCommand, StatusScreen, TextLine, MAX_LINES, MAX_LINE_LEN};
pub use queue::{EnqueueError, RenderQueue, RenderStats};
pub use task::DisplayTask;
