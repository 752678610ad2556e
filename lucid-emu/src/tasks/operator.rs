//! Scripted operator
//!
//! Issues the requests a user would make through the web interface:
//! periodic serial commands, provisioning, a reset to AP mode and finally
//! a shutdown.

use embassy_time::{Duration, Instant, Timer};
use log::*;
use lucid_core::render::RenderCommand;

use crate::channels::STOP;
use crate::config::{ConnectRequest, ScriptConfig};
use crate::device::{Bridge, DeviceConsole};

/// Serial command written on every command tick
const COMMAND: &[u8] = b"AT\r\n";

/// Time the display gets to drain its queue before shutdown
const DISPLAY_DRAIN_MS: u64 = 500;

enum Action {
    Connect(&'static ConnectRequest),
    ResetToAp,
    Shutdown,
}

#[embassy_executor::task]
pub async fn operator_task(console: &'static DeviceConsole, bridge: &'static Bridge, script: &'static ScriptConfig) {
    info!("Operator script started");

    let mut plan: Vec<(u32, Action)> = Vec::new();
    if let Some(request) = &script.connect {
        plan.push((request.after_ms, Action::Connect(request)));
    }
    if let Some(at) = script.reset_to_ap_after_ms {
        plan.push((at, Action::ResetToAp));
    }
    if let Some(at) = script.run_for_ms {
        plan.push((at, Action::Shutdown));
    }
    plan.sort_by_key(|(at, _)| *at);
    let mut plan = plan.into_iter().peekable();

    let interval = script.command_interval_ms;
    let mut next_command = (interval > 0).then_some(interval);
    let start = Instant::now();

    loop {
        let next_action = plan.peek().map(|(at, _)| *at);
        let due = match (next_action, next_command) {
            (Some(a), Some(c)) => a.min(c),
            (Some(a), None) => a,
            (None, Some(c)) => c,
            (None, None) => break,
        };
        Timer::at(start + Duration::from_millis(u64::from(due))).await;

        if next_command == Some(due) {
            send_command(console).await;
            next_command = Some(due.saturating_add(interval));
        }
        if next_action == Some(due) {
            if let Some((_, action)) = plan.next() {
                run(console, bridge, action).await;
            }
        }
    }

    info!("Operator script finished");
}

async fn send_command(console: &DeviceConsole) {
    match console.send_serial(COMMAND).await {
        Ok(written) => debug!("Sent {} bytes to the UART", written),
        Err(e) => warn!("Serial send failed: {:?}", e),
    }
}

async fn run(console: &DeviceConsole, bridge: &Bridge, action: Action) {
    match action {
        Action::Connect(request) => {
            info!("Provisioning network {}", request.ssid);
            if let Err(e) = console.request_connect(&request.ssid, &request.password).await {
                warn!("Connect request rejected: {:?}", e);
            }
        }
        Action::ResetToAp => {
            info!("Resetting to AP mode");
            if let Err(e) = console.reset_to_ap().await {
                warn!("Reset to AP failed: {:?}", e);
            }
        }
        Action::Shutdown => shutdown(console, bridge).await,
    }
}

async fn shutdown(console: &DeviceConsole, bridge: &Bridge) {
    info!("Shutting down");
    for command in [RenderCommand::ClearScreen, RenderCommand::DisplayPower(false)] {
        if let Err(e) = console.submit_render(command) {
            warn!("Display shutdown command dropped: {:?}", e);
        }
    }
    Timer::after_millis(DISPLAY_DRAIN_MS).await;

    STOP.request();
    bridge.stop().await;

    let status = console.status();
    info!(
        "Final: up {}s, rx {} B, tx {} B, rx errors {}, tx errors {}, render dropped {}, {} subscribers",
        status.uptime_s,
        status.bridge.rx_bytes,
        status.bridge.tx_bytes,
        status.bridge.rx_errors,
        status.bridge.tx_errors,
        status.render.dropped,
        status.subscribers
    );
    std::process::exit(0);
}
