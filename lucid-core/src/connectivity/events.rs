//! Events and effects of the connectivity state machine

use core::net::Ipv4Addr;

use heapless::String;
use lucid_hal::credentials::MAX_SSID_LEN;
use lucid_hal::Credentials;

/// Events that can trigger connectivity transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Lifecycle events
    /// Boot decision: station mode towards `station` if it started,
    /// otherwise the provisioning AP
    Boot {
        station: Option<String<MAX_SSID_LEN>>,
        provisioned: bool,
        ap_ssid: String<MAX_SSID_LEN>,
    },

    // Driver events
    /// Station associated with a network
    Associated { ssid: String<MAX_SSID_LEN> },
    /// Station received an address
    GotIp { ip: Ipv4Addr, rssi: i8 },
    /// Station link lost
    Disconnected { reason: u8 },
    /// A station joined our AP
    StationJoined,
    /// A station left our AP
    StationLeft,
    /// A reconnect attempt was issued to the driver
    ReconnectIssued,

    // Requests
    /// Join a network with the given (already persisted) credentials
    Connect(Credentials),
    /// Drop the station link and serve the provisioning AP
    ResetToAp { ap_ssid: String<MAX_SSID_LEN> },
}

impl Event {
    /// Event name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Boot { .. } => "Boot",
            Event::Associated { .. } => "Associated",
            Event::GotIp { .. } => "GotIp",
            Event::Disconnected { .. } => "Disconnected",
            Event::StationJoined => "StationJoined",
            Event::StationLeft => "StationLeft",
            Event::ReconnectIssued => "ReconnectIssued",
            Event::Connect(_) => "Connect",
            Event::ResetToAp { .. } => "ResetToAp",
        }
    }
}

/// Driver work a transition asks for, executed in order after it is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop the radio
    StopRadio,
    /// Wait for the radio to settle
    Settle,
    /// Start the access point
    StartAp { ssid: String<MAX_SSID_LEN> },
    /// Start the station with these credentials
    StartStation(Credentials),
    /// Issue a reconnect after `delay_ms`
    Reconnect { delay_ms: u32 },
}
