//! Display task
//!
//! Drains the render queue onto the terminal display, one command per tick.

use log::*;
use lucid_core::config::RenderConfig;
use lucid_core::render::DisplayTask;

use crate::channels::STOP;
use crate::device::RENDER;
use crate::sim::TerminalDisplay;

#[embassy_executor::task]
pub async fn display_task(display: TerminalDisplay, config: &'static RenderConfig, title: &'static str) {
    info!("Display task started");
    let mut task = DisplayTask::new(&RENDER, display, config, title);
    task.run(&STOP).await;
    info!("Display task stopped");
}
