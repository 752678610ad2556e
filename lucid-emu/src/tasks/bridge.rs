//! Serial bridge task

use log::*;

use crate::device::Bridge;

/// Runs the bridge receive loop for the life of the program
#[embassy_executor::task]
pub async fn bridge_task(bridge: &'static Bridge) {
    info!("Bridge task started");
    bridge.run().await;
}
