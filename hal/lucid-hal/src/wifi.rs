//! WiFi radio abstractions
//!
//! The driver only performs radio operations. Events it observes
//! (association, address assignment, disconnects, stations joining the
//! access point) are reported back to the connectivity state machine by
//! the board glue.

use core::net::Ipv4Addr;

/// Access point parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApSettings<'a> {
    /// Network name advertised by the access point
    pub ssid: &'a str,
    /// WPA2 passphrase, empty for an open network
    pub password: &'a str,
    /// Radio channel
    pub channel: u8,
    /// Maximum number of associated stations
    pub max_connections: u8,
    /// Address of the device on the AP network (also the gateway)
    pub gateway: Ipv4Addr,
    /// Netmask of the AP network
    pub netmask: Ipv4Addr,
}

impl ApSettings<'_> {
    /// Whether the access point runs without authentication
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// WiFi radio driver
pub trait NetworkDriver {
    /// Error type for radio operations
    type Error;

    /// Start the radio as an access point
    fn start_ap(&mut self, settings: &ApSettings<'_>) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Start the radio as a station and begin connecting to `ssid`
    fn start_sta(&mut self, ssid: &str, password: &str) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Issue a new connection attempt with the current station settings
    fn reconnect(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Stop the radio
    fn stop(&mut self) -> impl core::future::Future<Output = Result<(), Self::Error>>;

    /// Factory MAC address of the station interface
    fn mac_address(&self) -> [u8; 6];
}
