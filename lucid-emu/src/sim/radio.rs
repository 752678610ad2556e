//! Simulated WiFi radio
//!
//! Radio operations are forwarded to the air task as [`RadioCommand`]s;
//! whatever the air task observes comes back as connectivity events.

use core::convert::Infallible;

use log::*;
use lucid_core::text::truncated;
use lucid_hal::{ApSettings, NetworkDriver};

use crate::channels::{RadioCommand, RADIO_CMD};

pub struct SimRadio {
    mac: [u8; 6],
}

impl SimRadio {
    pub fn new(mac: [u8; 6]) -> Self {
        Self { mac }
    }
}

impl NetworkDriver for SimRadio {
    type Error = Infallible;

    async fn start_ap(&mut self, settings: &ApSettings<'_>) -> Result<(), Infallible> {
        info!(
            "AP up: ssid={} channel={} max={} {} gateway={}/{}",
            settings.ssid,
            settings.channel,
            settings.max_connections,
            if settings.is_open() { "open" } else { "wpa2" },
            settings.gateway,
            settings.netmask
        );
        RADIO_CMD.signal(RadioCommand::HostAp);
        Ok(())
    }

    async fn start_sta(&mut self, ssid: &str, _password: &str) -> Result<(), Infallible> {
        info!("Station start: ssid={}", ssid);
        RADIO_CMD.signal(RadioCommand::Associate { ssid: truncated(ssid) });
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<(), Infallible> {
        debug!("Station reconnect");
        RADIO_CMD.signal(RadioCommand::Reconnect);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), Infallible> {
        debug!("Radio stop");
        RADIO_CMD.signal(RadioCommand::Stop);
        Ok(())
    }

    fn mac_address(&self) -> [u8; 6] {
        self.mac
    }
}
