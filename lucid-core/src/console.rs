//! Operational surface
//!
//! Ties the subsystems together for request handlers: status queries,
//! render submission, serial writes and connectivity requests.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Ticker};
use lucid_hal::{CredentialStore, NetworkDriver, SerialTransport, Subscriber, SystemInfo};

use crate::bridge::{BridgeError, SerialBridge};
use crate::broadcast::FanOut;
use crate::cancel::StopToken;
use crate::config::StatusConfig;
use crate::connectivity::{ConnectError, ConnectivityError, ConnectivityManager};
use crate::render::{EnqueueError, RenderCommand, RenderQueue};
use crate::status::SystemStatus;

/// Bridge whose received data goes to the fan-out
pub type FanOutBridge<'a, M, T, H, const N: usize> = SerialBridge<M, T, &'a FanOut<M, H, N>>;

/// Handles to every subsystem of one device
pub struct Console<'a, M: RawMutex, T: SerialTransport, D, C, H, const K: usize, const N: usize> {
    bridge: &'a FanOutBridge<'a, M, T, H, N>,
    render: &'a RenderQueue<M, K>,
    connectivity: &'a ConnectivityManager<M, D, C>,
    fanout: &'a FanOut<M, H, N>,
    system: &'a dyn SystemInfo,
}

impl<'a, M, T, D, C, H, const K: usize, const N: usize> Console<'a, M, T, D, C, H, K, N>
where
    M: RawMutex,
    T: SerialTransport,
    D: NetworkDriver,
    C: CredentialStore,
    H: Subscriber,
{
    pub fn new(
        bridge: &'a FanOutBridge<'a, M, T, H, N>,
        render: &'a RenderQueue<M, K>,
        connectivity: &'a ConnectivityManager<M, D, C>,
        fanout: &'a FanOut<M, H, N>,
        system: &'a dyn SystemInfo,
    ) -> Self {
        Self {
            bridge,
            render,
            connectivity,
            fanout,
            system,
        }
    }

    /// Current status of every subsystem
    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            uptime_s: Instant::now().as_secs() as u32,
            free_memory: self.system.free_memory(),
            connectivity: self.connectivity.snapshot(),
            bridge: self.bridge.statistics(),
            render: self.render.stats(),
            subscribers: self.fanout.subscriber_count() as u8,
        }
    }

    /// Queue a status screen built from the current status
    pub fn publish_status(&self) -> Result<(), EnqueueError> {
        self.render.enqueue_status(self.status().screen())
    }

    pub fn submit_render(&self, command: RenderCommand) -> Result<(), EnqueueError> {
        self.render.submit(command)
    }

    /// Write bytes to the serial link
    pub async fn send_serial(&self, data: &[u8]) -> Result<usize, BridgeError> {
        self.bridge.send(data).await
    }

    pub async fn request_connect(&self, ssid: &str, password: &str) -> Result<(), ConnectError> {
        self.connectivity.request_connect(ssid, password).await
    }

    pub async fn reset_to_ap(&self) -> Result<(), ConnectivityError> {
        self.connectivity.reset_to_ap().await
    }

    /// Queue a status screen every period until `stop` is requested
    ///
    /// A full render queue skips that period's screen.
    pub async fn run_status_screen(&self, config: &StatusConfig, stop: &StopToken) {
        info!("Status task started");
        let mut ticker = Ticker::every(Duration::from_millis(u64::from(config.period_ms)));
        while !stop.is_requested() {
            if self.publish_status().is_err() {
                debug!("Status screen skipped, render queue full");
            }
            ticker.next().await;
        }
        info!("Status task stopped");
    }
}
