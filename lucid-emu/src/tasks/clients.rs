//! Simulated subscriber clients
//!
//! Opens one event stream per configured client at its join time.

use embassy_time::{Duration, Instant, Timer};
use log::*;
use lucid_core::broadcast::SubscribeError;

use crate::config::ClientConfig;
use crate::device::Fan;
use crate::sim::SimClient;

#[embassy_executor::task]
pub async fn clients_task(fanout: &'static Fan, clients: &'static [ClientConfig]) {
    let start = Instant::now();
    let mut order: Vec<&ClientConfig> = clients.iter().collect();
    order.sort_by_key(|client| client.join_after_ms);

    for client in order {
        Timer::at(start + Duration::from_millis(u64::from(client.join_after_ms))).await;
        match fanout.subscribe(SimClient::new(&client.name, client.fail_after)).await {
            Ok(slot) => info!(
                "[{}] subscribed in slot {} ({} live)",
                client.name,
                slot.0,
                fanout.subscriber_count()
            ),
            Err(SubscribeError::Full(rejected)) => {
                warn!("[{}] rejected, every slot is taken", rejected.name())
            }
            Err(SubscribeError::Unreachable) => {
                warn!("[{}] dropped before the welcome message", client.name)
            }
        }
    }
}
