//! Configuration sanity checks

use super::types::{DeviceConfig, ReconnectPolicy, RX_CHUNK_CAPACITY};

/// Longest SSID the prefix plus four hex digits may form
const MAX_AP_SSID_LEN: usize = 32;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Baud rate of zero
    InvalidBaudRate,
    /// Receive chunk is empty or larger than the bridge buffer
    InvalidChunkLength,
    /// A loop period or timeout of zero
    ZeroPeriod,
    /// AP SSID prefix empty or too long for the MAC suffix
    InvalidSsidPrefix,
    /// AP passphrase must be empty or 8 to 63 characters
    InvalidApPassword,
    /// AP channel outside 1..=13
    InvalidChannel,
    /// AP must accept at least one station
    InvalidMaxConnections,
    /// Backoff with a zero initial delay or a cap below it
    InvalidBackoff,
}

impl DeviceConfig {
    /// Check the configuration for values the firmware cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::InvalidBaudRate);
        }
        let chunk = usize::from(self.serial.rx_chunk_len);
        if chunk == 0 || chunk > RX_CHUNK_CAPACITY {
            return Err(ConfigError::InvalidChunkLength);
        }
        if self.serial.event_wait_ms == 0
            || self.render.tick_ms == 0
            || self.broadcast.send_timeout_ms == 0
            || self.broadcast.heartbeat_ms == 0
            || self.status.period_ms == 0
        {
            return Err(ConfigError::ZeroPeriod);
        }

        let wifi = &self.connectivity;
        let prefix_len = wifi.ap_ssid_prefix.len();
        if prefix_len == 0 || prefix_len + 4 > MAX_AP_SSID_LEN {
            return Err(ConfigError::InvalidSsidPrefix);
        }
        let pass_len = wifi.ap_password.len();
        if pass_len != 0 && pass_len < 8 {
            return Err(ConfigError::InvalidApPassword);
        }
        if !(1..=13).contains(&wifi.ap_channel) {
            return Err(ConfigError::InvalidChannel);
        }
        if wifi.ap_max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections);
        }
        if let ReconnectPolicy::Backoff { initial_ms, max_ms } = wifi.reconnect {
            if initial_ms == 0 || max_ms < initial_ms {
                return Err(ConfigError::InvalidBackoff);
            }
        }

        Ok(())
    }
}
