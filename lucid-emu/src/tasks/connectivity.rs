//! Connectivity event task
//!
//! Feeds radio events into the connectivity state machine in arrival order.

use log::*;

use crate::channels::WIFI_EVENTS;
use crate::device::Connectivity;

#[embassy_executor::task]
pub async fn connectivity_task(manager: &'static Connectivity) {
    info!("Connectivity task started");

    loop {
        let event = WIFI_EVENTS.receive().await;
        debug!("Radio event: {}", event.name());
        if let Err(e) = manager.handle(event).await {
            warn!("Connectivity event failed: {:?}", e);
        }
        let state = manager.snapshot();
        trace!("Connectivity now {} ({} clients)", state.mode.label(), state.client_count);
    }
}
