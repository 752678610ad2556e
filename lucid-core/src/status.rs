//! System status snapshot

use crate::bridge::BridgeStatistics;
use crate::connectivity::ConnectivityState;
use crate::render::{RenderStats, StatusScreen};

/// Everything a status query reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    /// Seconds since boot
    pub uptime_s: u32,
    pub free_memory: u32,
    pub connectivity: ConnectivityState,
    pub bridge: BridgeStatistics,
    pub render: RenderStats,
    /// Live event-stream subscribers
    pub subscribers: u8,
}

impl SystemStatus {
    /// Values for the periodic status screen
    pub fn screen(&self) -> StatusScreen {
        StatusScreen {
            uptime_s: self.uptime_s,
            free_memory: self.free_memory,
            rx_bytes: self.bridge.rx_bytes,
            tx_bytes: self.bridge.tx_bytes,
            mode: self.connectivity.mode,
            ssid: self.connectivity.ssid.clone(),
            ip: self.connectivity.ip,
            rssi: self.connectivity.rssi,
            client_count: self.connectivity.client_count,
        }
    }
}
