//! Connectivity state

use core::net::Ipv4Addr;

use heapless::String;
use lucid_hal::credentials::MAX_SSID_LEN;

/// RSSI reported when no link exists
pub const NO_SIGNAL_RSSI: i8 = -100;

/// Radio operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WifiMode {
    /// Before the boot decision has been made
    Init,
    /// Serving the provisioning access point
    ApMode,
    /// Station started, waiting for association and an address
    StaConnecting,
    /// Station associated with an address
    StaConnected,
    /// Station link lost, reconnect pending
    StaDisconnected,
}

impl WifiMode {
    /// Short mode label used by status queries
    pub fn label(&self) -> &'static str {
        match self {
            WifiMode::Init => "Init",
            WifiMode::ApMode => "AP",
            WifiMode::StaConnecting => "Connecting",
            WifiMode::StaConnected => "STA",
            WifiMode::StaDisconnected => "Disconnected",
        }
    }

    /// Whether the radio is in one of the station modes
    pub fn is_station(&self) -> bool {
        matches!(
            self,
            WifiMode::StaConnecting | WifiMode::StaConnected | WifiMode::StaDisconnected
        )
    }
}

/// Connectivity state block
///
/// Written only by the state machine; everything else reads snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityState {
    pub mode: WifiMode,
    /// AP name in AP mode, target network in station modes
    pub ssid: String<MAX_SSID_LEN>,
    /// Current address, `0.0.0.0` when none
    pub ip: Ipv4Addr,
    /// Signal strength in dBm
    pub rssi: i8,
    /// Stations associated with our AP
    pub client_count: u8,
    /// Credentials are stored
    pub provisioned: bool,
    /// Reconnect attempts since the last successful connection
    pub reconnect_attempts: u8,
}

impl ConnectivityState {
    pub fn new() -> Self {
        Self {
            mode: WifiMode::Init,
            ssid: String::new(),
            ip: Ipv4Addr::UNSPECIFIED,
            rssi: NO_SIGNAL_RSSI,
            client_count: 0,
            provisioned: false,
            reconnect_attempts: 0,
        }
    }

    pub fn has_address(&self) -> bool {
        !self.ip.is_unspecified()
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new()
    }
}
