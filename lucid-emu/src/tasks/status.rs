//! Periodic status screen task

use lucid_core::config::StatusConfig;

use crate::channels::STOP;
use crate::device::DeviceConsole;

#[embassy_executor::task]
pub async fn status_task(console: &'static DeviceConsole, config: &'static StatusConfig) {
    console.run_status_screen(config, &STOP).await;
}
