//! Simulated air task
//!
//! Acts out what the radio would observe after each command: association
//! and an address for station mode, stations joining for AP mode. A new
//! command interrupts whatever is in progress.

use core::net::Ipv4Addr;

use embassy_futures::select::{select, Either};
use embassy_time::Timer;
use heapless::String;
use log::*;
use lucid_core::connectivity::Event;
use lucid_hal::credentials::MAX_SSID_LEN;

use crate::channels::{RadioCommand, RADIO_CMD, WIFI_EVENTS};
use crate::config::SimRadioConfig;

/// Time from association to an address
const DHCP_MS: u32 = 300;

/// Gap between stations joining the AP
const STATION_JOIN_MS: u32 = 500;

/// 802.11 reason codes reported on disconnect
const REASON_BEACON_TIMEOUT: u8 = 200;
const REASON_NO_AP_FOUND: u8 = 201;

#[embassy_executor::task]
pub async fn radio_task(config: &'static SimRadioConfig) {
    info!("Radio task started");

    let mut station: Option<String<MAX_SSID_LEN>> = None;
    let mut pending = None;
    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => RADIO_CMD.wait().await,
        };
        trace!("Radio command {:?}", command);
        pending = match command {
            RadioCommand::Associate { ssid } => {
                station = Some(ssid.clone());
                join(config, &ssid).await
            }
            RadioCommand::Reconnect => match station.clone() {
                Some(ssid) => join(config, &ssid).await,
                None => {
                    warn!("Reconnect without a station network");
                    None
                }
            },
            RadioCommand::HostAp => host_ap(config).await,
            RadioCommand::Stop => None,
        };
    }
}

/// Wait `ms`, or return early with a newer command
async fn pause(ms: u32) -> Option<RadioCommand> {
    match select(Timer::after_millis(u64::from(ms)), RADIO_CMD.wait()).await {
        Either::First(()) => None,
        Either::Second(command) => Some(command),
    }
}

async fn post(event: Event) {
    WIFI_EVENTS.send(event).await;
}

async fn join(config: &SimRadioConfig, ssid: &String<MAX_SSID_LEN>) -> Option<RadioCommand> {
    if let Some(command) = pause(config.association_ms).await {
        return Some(command);
    }
    if !config.reachable {
        info!("Network {} not found", ssid);
        post(Event::Disconnected {
            reason: REASON_NO_AP_FOUND,
        })
        .await;
        return None;
    }

    post(Event::Associated { ssid: ssid.clone() }).await;
    if let Some(command) = pause(DHCP_MS).await {
        return Some(command);
    }
    let ip = Ipv4Addr::from(config.station_ip);
    info!("Station got {} on {}", ip, ssid);
    post(Event::GotIp { ip, rssi: config.rssi }).await;

    let hold = config.link_drop_after_ms?;
    if let Some(command) = pause(hold).await {
        return Some(command);
    }
    info!("Station link lost");
    post(Event::Disconnected {
        reason: REASON_BEACON_TIMEOUT,
    })
    .await;
    None
}

async fn host_ap(config: &SimRadioConfig) -> Option<RadioCommand> {
    for _ in 0..config.ap_stations {
        if let Some(command) = pause(STATION_JOIN_MS).await {
            return Some(command);
        }
        post(Event::StationJoined).await;
    }
    None
}
