//! Persistent WiFi credential storage

use heapless::String;

/// Longest SSID accepted by 802.11
pub const MAX_SSID_LEN: usize = 32;

/// Longest WPA2 passphrase
pub const MAX_PASSWORD_LEN: usize = 63;

/// Station credentials
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credentials {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
}

/// Errors from credential storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Underlying storage operation failed
    Storage,
    /// Stored record could not be decoded
    Corrupted,
}

/// Credential store trait
///
/// Implementations keep at most one credential record.
pub trait CredentialStore {
    /// Load the stored credentials, if any
    fn load(&mut self) -> impl core::future::Future<Output = Result<Option<Credentials>, StoreError>>;

    /// Replace the stored credentials
    fn store(&mut self, credentials: &Credentials) -> impl core::future::Future<Output = Result<(), StoreError>>;

    /// Remove the stored credentials
    fn erase(&mut self) -> impl core::future::Future<Output = Result<(), StoreError>>;
}
