//! Emulator configuration
//!
//! Loads the device configuration plus the simulation settings from TOML.
//! Falls back to the embedded `lucid.toml` when no path is given.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use lucid_core::config::{DeviceConfig, MAX_SUBSCRIBERS};
use serde::Deserialize;

/// Embedded default configuration
/// Edit lucid.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../lucid.toml");

/// Everything the emulator needs to boot one device
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmuConfig {
    pub device: DeviceConfig,
    pub sim: SimConfig,
}

/// Simulated environment around the device
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// File backing the credential store
    pub credentials_path: String,
    /// Value reported as free memory
    pub free_memory: u32,
    pub serial: SimSerialConfig,
    pub radio: SimRadioConfig,
    pub clients: Vec<ClientConfig>,
    pub script: ScriptConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            credentials_path: "lucid-credentials.toml".into(),
            free_memory: 180 * 1024,
            serial: SimSerialConfig::default(),
            radio: SimRadioConfig::default(),
            clients: Vec::new(),
            script: ScriptConfig::default(),
        }
    }
}

/// The device on the other end of the UART
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimSerialConfig {
    /// Echo transmitted bytes back into the receive side
    pub loopback: bool,
    /// Period of the peer's status line, 0 keeps the peer silent
    pub peer_interval_ms: u32,
}

impl Default for SimSerialConfig {
    fn default() -> Self {
        Self {
            loopback: true,
            peer_interval_ms: 2000,
        }
    }
}

/// Radio environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimRadioConfig {
    pub mac: [u8; 6],
    /// Time from a connection attempt to association
    pub association_ms: u32,
    /// Whether the stored network is in range
    pub reachable: bool,
    /// Address handed out by the station network
    pub station_ip: [u8; 4],
    pub rssi: i8,
    /// Drop the station link this long after it comes up
    pub link_drop_after_ms: Option<u32>,
    /// Stations joining the provisioning AP after it starts
    pub ap_stations: u8,
}

impl Default for SimRadioConfig {
    fn default() -> Self {
        Self {
            mac: [0x24, 0x0a, 0xc4, 0x12, 0xa1, 0xb2],
            association_ms: 1500,
            reachable: true,
            station_ip: [192, 168, 1, 42],
            rssi: -58,
            link_drop_after_ms: None,
            ap_stations: 0,
        }
    }
}

/// One simulated event-stream client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub name: String,
    /// Delay before the client subscribes
    #[serde(default)]
    pub join_after_ms: u32,
    /// Drop the connection after this many delivered messages
    #[serde(default)]
    pub fail_after: Option<u32>,
}

/// Scripted operator actions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Period of the `AT` command written to the UART, 0 disables it
    pub command_interval_ms: u32,
    pub connect: Option<ConnectRequest>,
    pub reset_to_ap_after_ms: Option<u32>,
    /// Shut down after this long, run forever when unset
    pub run_for_ms: Option<u32>,
}

/// Provisioning request issued by the script
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectRequest {
    pub ssid: String,
    pub password: String,
    #[serde(default)]
    pub after_ms: u32,
}

/// Load configuration from `path`, or the embedded defaults
pub fn load(path: Option<&Path>) -> anyhow::Result<EmuConfig> {
    let config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse(&text).with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => parse(EMBEDDED_CONFIG).context("invalid embedded configuration")?,
    };
    Ok(config)
}

/// Parse and validate a TOML configuration
pub fn parse(text: &str) -> anyhow::Result<EmuConfig> {
    let config: EmuConfig = toml::from_str(text)?;
    config
        .device
        .validate()
        .map_err(|e| anyhow!("device configuration rejected: {:?}", e))?;
    if config.sim.clients.len() > MAX_SUBSCRIBERS * 2 {
        bail!("at most {} simulated clients are supported", MAX_SUBSCRIBERS * 2);
    }
    Ok(config)
}
