//! Connectivity manager
//!
//! Owns the radio driver and the credential store, feeds events through
//! the state machine and executes the resulting effects. Requests and
//! driver events are serialized by one lock, so the state block has a
//! single writer.

use core::cell::RefCell;
use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use heapless::String;
use lucid_hal::credentials::{MAX_PASSWORD_LEN, MAX_SSID_LEN};
use lucid_hal::{ApSettings, CredentialStore, Credentials, NetworkDriver};

use super::events::{Effect, Event};
use super::machine::MachineParams;
use super::state::{ConnectivityState, WifiMode};
use crate::config::ConnectivityConfig;
use crate::text::truncated;

/// Shortest WPA2 passphrase
const MIN_PASSWORD_LEN: usize = 8;

/// Connectivity errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityError {
    /// `init` called after the boot decision was made
    AlreadyStarted,
    /// A radio operation failed
    Driver,
}

/// Reasons a connect request is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectError {
    /// SSID empty or longer than 32 bytes
    InvalidSsid,
    /// Passphrase neither empty nor 8 to 63 bytes
    InvalidPassword,
    /// Credentials could not be saved; nothing was changed
    Store,
    /// Credentials saved but the radio could not be started
    Driver,
}

/// Check and copy connect request fields
pub fn validate_credentials(ssid: &str, password: &str) -> Result<Credentials, ConnectError> {
    if ssid.is_empty() || ssid.len() > MAX_SSID_LEN {
        return Err(ConnectError::InvalidSsid);
    }
    if !password.is_empty() && !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len()) {
        return Err(ConnectError::InvalidPassword);
    }
    Ok(Credentials {
        ssid: truncated(ssid),
        password: truncated(password),
    })
}

/// Provisioning AP name: the prefix followed by the last two MAC bytes
pub fn ap_ssid(prefix: &str, mac: &[u8; 6]) -> String<MAX_SSID_LEN> {
    let mut ssid: String<MAX_SSID_LEN> = truncated(prefix);
    // A prefix that leaves no room for the suffix is caught by config validation
    let _ = write!(ssid, "{:02X}{:02X}", mac[4], mac[5]);
    ssid
}

struct Inner<D, S> {
    driver: D,
    store: S,
    state: ConnectivityState,
}

pub struct ConnectivityManager<M: RawMutex, D, S> {
    inner: Mutex<M, Inner<D, S>>,
    snapshot: BlockingMutex<M, RefCell<ConnectivityState>>,
    config: ConnectivityConfig,
    ap_ssid: String<MAX_SSID_LEN>,
}

impl<M: RawMutex, D: NetworkDriver, S: CredentialStore> ConnectivityManager<M, D, S> {
    pub fn new(driver: D, store: S, config: ConnectivityConfig) -> Self {
        let ap_ssid = ap_ssid(&config.ap_ssid_prefix, &driver.mac_address());
        Self {
            inner: Mutex::new(Inner {
                driver,
                store,
                state: ConnectivityState::new(),
            }),
            snapshot: BlockingMutex::new(RefCell::new(ConnectivityState::new())),
            config,
            ap_ssid,
        }
    }

    /// Name of the provisioning access point
    pub fn ap_ssid(&self) -> &str {
        &self.ap_ssid
    }

    /// Copy of the current state, safe to call from any context
    pub fn snapshot(&self) -> ConnectivityState {
        self.snapshot.lock(|state| state.borrow().clone())
    }

    fn params(&self) -> MachineParams {
        MachineParams {
            gateway: self.config.gateway(),
            reconnect: self.config.reconnect,
        }
    }

    /// Make the boot decision
    ///
    /// Joins the stored network when credentials exist and the station
    /// starts; otherwise serves the provisioning AP.
    pub async fn init(&self) -> Result<(), ConnectivityError> {
        let mut inner = self.inner.lock().await;
        if inner.state.mode != WifiMode::Init {
            warn!("Connectivity already initialized");
            return Err(ConnectivityError::AlreadyStarted);
        }

        let stored = match inner.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Credential load failed: {:?}", e);
                None
            }
        };
        let provisioned = stored.is_some();

        let station = match stored {
            Some(credentials) => {
                match inner
                    .driver
                    .start_sta(&credentials.ssid, &credentials.password)
                    .await
                {
                    Ok(()) => {
                        info!("Connecting to stored network {}", credentials.ssid);
                        Some(credentials.ssid)
                    }
                    Err(_) => {
                        warn!("Station start failed, falling back to AP mode");
                        if inner.driver.stop().await.is_err() {
                            warn!("Radio stop failed");
                        }
                        None
                    }
                }
            }
            None => {
                info!("No stored credentials, starting AP mode");
                None
            }
        };

        let event = Event::Boot {
            station,
            provisioned,
            ap_ssid: self.ap_ssid.clone(),
        };
        let result = self.apply(&mut inner, event).await;
        if result.is_err() {
            // Not started: a later init may retry
            warn!("Boot failed, connectivity left uninitialized");
            inner.state = ConnectivityState::new();
            self.publish(&inner.state);
        }
        result
    }

    /// Feed a driver event through the state machine
    pub async fn handle(&self, event: Event) -> Result<(), ConnectivityError> {
        let mut inner = self.inner.lock().await;
        self.apply(&mut inner, event).await
    }

    /// Save credentials and switch to station mode
    ///
    /// Credentials are persisted before anything else changes; a store
    /// failure leaves the state untouched.
    pub async fn request_connect(&self, ssid: &str, password: &str) -> Result<(), ConnectError> {
        let credentials = validate_credentials(ssid, password)?;
        let mut inner = self.inner.lock().await;
        if let Err(e) = inner.store.store(&credentials).await {
            error!("Credential save failed: {:?}", e);
            return Err(ConnectError::Store);
        }
        info!("Credentials saved, connecting to {}", credentials.ssid);
        self.apply(&mut inner, Event::Connect(credentials))
            .await
            .map_err(|_| ConnectError::Driver)
    }

    /// Drop any station link and serve the provisioning AP
    pub async fn reset_to_ap(&self) -> Result<(), ConnectivityError> {
        let mut inner = self.inner.lock().await;
        info!("Resetting to AP mode");
        let event = Event::ResetToAp {
            ap_ssid: self.ap_ssid.clone(),
        };
        self.apply(&mut inner, event).await
    }

    async fn apply(&self, inner: &mut Inner<D, S>, event: Event) -> Result<(), ConnectivityError> {
        let params = self.params();
        let mut result = Ok(());
        let mut pending = Some(event);

        while let Some(event) = pending.take() {
            let Some(transition) = inner.state.transition(&event, &params) else {
                debug!("Ignoring {} in {:?}", event.name(), inner.state.mode);
                continue;
            };
            if transition.state.mode != inner.state.mode {
                info!("WiFi {:?} -> {:?}", inner.state.mode, transition.state.mode);
            }
            inner.state = transition.state;
            self.publish(&inner.state);

            for effect in transition.effects {
                match self.execute(inner, effect).await {
                    Ok(Some(follow_up)) => pending = Some(follow_up),
                    Ok(None) => {}
                    Err(e) => {
                        if result.is_ok() {
                            result = Err(e);
                        }
                    }
                }
            }
        }

        result
    }

    fn publish(&self, state: &ConnectivityState) {
        self.snapshot.lock(|snapshot| *snapshot.borrow_mut() = state.clone());
    }

    async fn execute(&self, inner: &mut Inner<D, S>, effect: Effect) -> Result<Option<Event>, ConnectivityError> {
        match effect {
            Effect::StopRadio => {
                inner.driver.stop().await.map_err(|_| {
                    error!("Radio stop failed");
                    ConnectivityError::Driver
                })?;
            }
            Effect::Settle => Timer::after_millis(u64::from(self.config.settle_ms)).await,
            Effect::StartAp { ssid } => {
                let settings = ApSettings {
                    ssid: &ssid,
                    password: &self.config.ap_password,
                    channel: self.config.ap_channel,
                    max_connections: self.config.ap_max_connections,
                    gateway: self.config.gateway(),
                    netmask: self.config.netmask(),
                };
                inner.driver.start_ap(&settings).await.map_err(|_| {
                    error!("AP start failed");
                    ConnectivityError::Driver
                })?;
                info!("AP started: {}", ssid);
            }
            Effect::StartStation(credentials) => {
                inner
                    .driver
                    .start_sta(&credentials.ssid, &credentials.password)
                    .await
                    .map_err(|_| {
                        error!("Station start failed");
                        ConnectivityError::Driver
                    })?;
            }
            Effect::Reconnect { delay_ms } => {
                if delay_ms > 0 {
                    debug!("Reconnecting in {} ms", delay_ms);
                    Timer::after_millis(u64::from(delay_ms)).await;
                }
                if inner.driver.reconnect().await.is_err() {
                    warn!("Reconnect request failed");
                }
                return Ok(Some(Event::ReconnectIssued));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconnectPolicy;
    use crate::testing::{FakeRadio, MemoryStore, RadioOp};
    use core::net::Ipv4Addr;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type Manager = ConnectivityManager<CriticalSectionRawMutex, FakeRadio, MemoryStore>;

    fn config() -> ConnectivityConfig {
        ConnectivityConfig {
            settle_ms: 1,
            ..ConnectivityConfig::default()
        }
    }

    fn stored(ssid: &str, password: &str) -> Credentials {
        Credentials {
            ssid: truncated(ssid),
            password: truncated(password),
        }
    }

    #[test]
    fn test_ap_ssid_from_mac() {
        let ssid = ap_ssid("LUCIDUART_", &[0x24, 0x0a, 0xc4, 0x00, 0xa1, 0x0b]);
        assert_eq!(ssid.as_str(), "LUCIDUART_A10B");
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("homenet", "").is_ok());
        assert!(validate_credentials("homenet", "12345678").is_ok());
        assert_eq!(
            validate_credentials("", "12345678"),
            Err(ConnectError::InvalidSsid)
        );
        assert_eq!(
            validate_credentials("homenet", "short"),
            Err(ConnectError::InvalidPassword)
        );
        let long_ssid = "s".repeat(33);
        assert_eq!(
            validate_credentials(&long_ssid, ""),
            Err(ConnectError::InvalidSsid)
        );
    }

    #[test]
    fn test_boot_without_credentials() {
        let radio = FakeRadio::new();
        let manager = Manager::new(radio.clone(), MemoryStore::empty(), config());
        block_on(manager.init()).unwrap();

        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::ApMode);
        assert_eq!(state.mode.label(), "AP");
        assert_eq!(state.ip, Ipv4Addr::new(10, 10, 10, 1));
        assert!(!state.provisioned);

        let ops = radio.ops();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            RadioOp::StartAp { ssid, password, channel, max_connections } => {
                assert!(ssid.starts_with("LUCIDUART_"));
                assert_eq!(ssid.len(), 14);
                assert_eq!(password, "luciduart123");
                assert_eq!(*channel, 1);
                assert_eq!(*max_connections, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_boot_with_stored_credentials() {
        let radio = FakeRadio::new();
        let store = MemoryStore::with(stored("homenet", "hunter2hunter2"));
        let manager = Manager::new(radio.clone(), store, config());
        block_on(manager.init()).unwrap();

        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::StaConnecting);
        assert_eq!(state.ssid.as_str(), "homenet");
        assert!(state.provisioned);
        assert_eq!(
            radio.ops(),
            vec![RadioOp::StartSta {
                ssid: "homenet".into(),
                password: "hunter2hunter2".into()
            }]
        );
    }

    #[test]
    fn test_boot_falls_back_to_ap() {
        let radio = FakeRadio::new();
        radio.fail_station(true);
        let store = MemoryStore::with(stored("homenet", "hunter2hunter2"));
        let manager = Manager::new(radio.clone(), store, config());
        block_on(manager.init()).unwrap();

        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::ApMode);
        assert!(state.provisioned);
        assert!(matches!(radio.ops().last(), Some(RadioOp::StartAp { .. })));
    }

    #[test]
    fn test_fallback_tolerates_radio_stop_failure() {
        let radio = FakeRadio::new();
        radio.fail_station(true);
        radio.fail_stop(true);
        let store = MemoryStore::with(stored("homenet", "hunter2hunter2"));
        let manager = Manager::new(radio.clone(), store, config());
        block_on(manager.init()).unwrap();

        assert_eq!(manager.snapshot().mode, WifiMode::ApMode);
        let ops = radio.ops();
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], RadioOp::StartAp { .. }));
    }

    #[test]
    fn test_init_twice_fails() {
        let manager = Manager::new(FakeRadio::new(), MemoryStore::empty(), config());
        block_on(manager.init()).unwrap();
        assert_eq!(
            block_on(manager.init()),
            Err(ConnectivityError::AlreadyStarted)
        );
    }

    #[test]
    fn test_connect_request_persists_first() {
        let radio = FakeRadio::new();
        let store = MemoryStore::empty();
        let manager = Manager::new(radio.clone(), store.clone(), config());
        block_on(manager.init()).unwrap();

        block_on(manager.request_connect("homenet", "hunter2hunter2")).unwrap();
        assert_eq!(store.contents(), Some(stored("homenet", "hunter2hunter2")));
        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::StaConnecting);
        assert_eq!(state.ssid.as_str(), "homenet");
        assert_eq!(
            radio.ops()[1..],
            [
                RadioOp::Stop,
                RadioOp::StartSta {
                    ssid: "homenet".into(),
                    password: "hunter2hunter2".into()
                }
            ]
        );
    }

    #[test]
    fn test_connect_request_store_failure_changes_nothing() {
        let radio = FakeRadio::new();
        let store = MemoryStore::empty();
        let manager = Manager::new(radio.clone(), store.clone(), config());
        block_on(manager.init()).unwrap();
        let before = manager.snapshot();
        let ops_before = radio.ops().len();

        store.fail_writes(true);
        assert_eq!(
            block_on(manager.request_connect("homenet", "hunter2hunter2")),
            Err(ConnectError::Store)
        );
        assert_eq!(manager.snapshot(), before);
        assert_eq!(radio.ops().len(), ops_before);
    }

    #[test]
    fn test_connect_request_rejects_bad_input() {
        let store = MemoryStore::empty();
        let manager = Manager::new(FakeRadio::new(), store.clone(), config());
        assert_eq!(
            block_on(manager.request_connect("", "")),
            Err(ConnectError::InvalidSsid)
        );
        assert_eq!(store.contents(), None);
    }

    #[test]
    fn test_lost_link_reconnects_immediately() {
        let radio = FakeRadio::new();
        let store = MemoryStore::with(stored("homenet", "hunter2hunter2"));
        let manager = Manager::new(radio.clone(), store, config());
        block_on(manager.init()).unwrap();
        block_on(manager.handle(Event::GotIp {
            ip: Ipv4Addr::new(192, 168, 1, 40),
            rssi: -60,
        }))
        .unwrap();
        assert_eq!(manager.snapshot().mode, WifiMode::StaConnected);

        block_on(manager.handle(Event::Disconnected { reason: 8 })).unwrap();
        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::StaConnecting);
        assert_eq!(state.ip, Ipv4Addr::UNSPECIFIED);
        assert_eq!(radio.ops().last(), Some(&RadioOp::Reconnect));
    }

    #[test]
    fn test_backoff_policy_delays_reconnect() {
        let radio = FakeRadio::new();
        let store = MemoryStore::with(stored("homenet", "hunter2hunter2"));
        let config = ConnectivityConfig {
            reconnect: ReconnectPolicy::Backoff {
                initial_ms: 20,
                max_ms: 40,
            },
            ..config()
        };
        let manager = Manager::new(radio.clone(), store, config);
        block_on(manager.init()).unwrap();

        let started = embassy_time::Instant::now();
        block_on(manager.handle(Event::Disconnected { reason: 2 })).unwrap();
        assert!(started.elapsed() >= embassy_time::Duration::from_millis(20));
        assert_eq!(manager.snapshot().reconnect_attempts, 1);
    }

    #[test]
    fn test_reset_to_ap() {
        let radio = FakeRadio::new();
        let store = MemoryStore::with(stored("homenet", "hunter2hunter2"));
        let manager = Manager::new(radio.clone(), store, config());
        block_on(manager.init()).unwrap();

        block_on(manager.reset_to_ap()).unwrap();
        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::ApMode);
        assert_eq!(state.ip, Ipv4Addr::new(10, 10, 10, 1));
        assert_eq!(state.ssid.as_str(), manager.ap_ssid());
        let ops = radio.ops();
        assert_eq!(ops[ops.len() - 2], RadioOp::Stop);
        assert!(matches!(ops[ops.len() - 1], RadioOp::StartAp { .. }));
    }

    #[test]
    fn test_ap_client_tracking() {
        let manager = Manager::new(FakeRadio::new(), MemoryStore::empty(), config());
        block_on(manager.init()).unwrap();
        block_on(manager.handle(Event::StationJoined)).unwrap();
        block_on(manager.handle(Event::StationJoined)).unwrap();
        block_on(manager.handle(Event::StationLeft)).unwrap();
        assert_eq!(manager.snapshot().client_count, 1);
    }

    #[test]
    fn test_ap_start_failure_is_reported() {
        let radio = FakeRadio::new();
        radio.fail_ap(true);
        let manager = Manager::new(radio, MemoryStore::empty(), config());
        assert_eq!(block_on(manager.init()), Err(ConnectivityError::Driver));
    }

    #[test]
    fn test_failed_init_can_be_retried() {
        let radio = FakeRadio::new();
        radio.fail_ap(true);
        let manager = Manager::new(radio.clone(), MemoryStore::empty(), config());
        assert_eq!(block_on(manager.init()), Err(ConnectivityError::Driver));

        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::Init);
        assert_eq!(state.ip, Ipv4Addr::UNSPECIFIED);

        radio.fail_ap(false);
        block_on(manager.init()).unwrap();
        let state = manager.snapshot();
        assert_eq!(state.mode, WifiMode::ApMode);
        assert_eq!(state.ip, Ipv4Addr::new(10, 10, 10, 1));
    }
}
