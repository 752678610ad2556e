//! Subscriber keep-alive task

use lucid_core::config::BroadcastConfig;

use crate::channels::STOP;
use crate::device::Fan;

#[embassy_executor::task]
pub async fn heartbeat_task(fanout: &'static Fan, config: &'static BroadcastConfig) {
    fanout.run_heartbeat(config, &STOP).await;
}
