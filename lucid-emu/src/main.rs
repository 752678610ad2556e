//! LucidConsole emulator
//!
//! Runs the bridge core on the host against simulated drivers: a UART
//! with a chatty peer, a WiFi radio, a terminal status display and a few
//! event-stream clients.
//!
//! Usage: `lucid-emu [config.toml]` (defaults to the embedded lucid.toml).
//! Log output follows `RUST_LOG`; `debug` shows display frames and
//! subscriber traffic.

use std::path::PathBuf;

use anyhow::anyhow;
use embassy_executor::{SpawnToken, Spawner};
use lucid_core::bridge::SerialBridge;
use lucid_core::broadcast::FanOut;
use lucid_core::connectivity::ConnectivityManager;
use lucid_core::Console;
use lucid_hal::ExclusiveBus;
use log::*;
use static_cell::StaticCell;

use crate::config::EmuConfig;
use crate::device::{Bridge, Connectivity, DeviceConsole, Fan, Raw, RENDER};
use crate::sim::{FileStore, SimBus, SimRadio, SimSerial, SimSystem, TerminalDisplay};

mod channels;
mod config;
mod device;
mod sim;
mod tasks;

// Static cells for everything the tasks borrow (must live forever)
static CONFIG: StaticCell<EmuConfig> = StaticCell::new();
static FANOUT: StaticCell<Fan> = StaticCell::new();
static BRIDGE: StaticCell<Bridge> = StaticCell::new();
static CONNECTIVITY: StaticCell<Connectivity> = StaticCell::new();
static SYSTEM: StaticCell<SimSystem> = StaticCell::new();
static CONSOLE: StaticCell<DeviceConsole> = StaticCell::new();
static DISPLAY_BUS: StaticCell<ExclusiveBus<Raw, SimBus>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("LucidConsole emulator starting...");

    if let Err(e) = start(spawner).await {
        error!("Startup failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn start(spawner: Spawner) -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config: &'static EmuConfig = CONFIG.init(config::load(path.as_deref())?);
    let device = &config.device;
    info!("Configuration loaded");

    // Fan-out and serial bridge
    let fanout: &'static Fan = FANOUT.init(FanOut::new(&device.broadcast));
    let bridge: &'static Bridge = BRIDGE.init(SerialBridge::new());
    let mut serial = SimSerial::new(config.sim.serial.loopback);
    bridge
        .init(&mut serial, device.serial)
        .await
        .map_err(|e| anyhow!("serial bridge init failed: {:?}", e))?;
    bridge
        .set_sink(fanout)
        .await
        .map_err(|e| anyhow!("serial bridge sink rejected: {:?}", e))?;
    bridge
        .start()
        .map_err(|e| anyhow!("serial bridge start failed: {:?}", e))?;
    info!("Serial bridge running at {} baud", device.serial.baud_rate);

    // Connectivity
    let connectivity: &'static Connectivity = CONNECTIVITY.init(ConnectivityManager::new(
        SimRadio::new(config.sim.radio.mac),
        FileStore::new(&config.sim.credentials_path),
        device.connectivity.clone(),
    ));
    spawn(&spawner, "radio", tasks::radio_task(&config.sim.radio))?;
    connectivity
        .init()
        .await
        .map_err(|e| anyhow!("connectivity init failed: {:?}", e))?;
    info!(
        "Connectivity up in {} mode (AP SSID {})",
        connectivity.snapshot().mode.label(),
        connectivity.ap_ssid()
    );

    let system: &'static SimSystem = SYSTEM.init(SimSystem::new(config.sim.free_memory));
    let console: &'static DeviceConsole =
        CONSOLE.init(Console::new(bridge, &RENDER, connectivity, fanout, system));

    // Boot splash until the first status screen
    if RENDER.enqueue_text_line(0, &device.status.title, true).is_err()
        || RENDER.enqueue_text_line(1, "Starting...", true).is_err()
    {
        warn!("Boot splash dropped");
    }

    let display = TerminalDisplay::new(DISPLAY_BUS.init(ExclusiveBus::new(SimBus::new())));

    spawn(&spawner, "bridge", tasks::bridge_task(bridge))?;
    spawn(&spawner, "connectivity", tasks::connectivity_task(connectivity))?;
    spawn(
        &spawner,
        "display",
        tasks::display_task(display, &device.render, device.status.title.as_str()),
    )?;
    spawn(&spawner, "status", tasks::status_task(console, &device.status))?;
    spawn(&spawner, "heartbeat", tasks::heartbeat_task(fanout, &device.broadcast))?;
    spawn(&spawner, "peer", tasks::peer_task(&config.sim.serial))?;
    spawn(&spawner, "clients", tasks::clients_task(fanout, &config.sim.clients))?;
    spawn(
        &spawner,
        "operator",
        tasks::operator_task(console, bridge, &config.sim.script),
    )?;

    info!("All tasks spawned");
    Ok(())
}

fn spawn<S>(spawner: &Spawner, name: &str, token: SpawnToken<S>) -> anyhow::Result<()> {
    spawner
        .spawn(token)
        .map_err(|e| anyhow!("failed to spawn {} task: {:?}", name, e))
}
