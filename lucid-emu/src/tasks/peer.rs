//! Serial peer task
//!
//! Plays the device on the far end of the UART: prints a status line at a
//! fixed interval.

use embassy_time::{Duration, Instant, Ticker};
use log::*;

use crate::channels::{SERIAL_FIFO, STOP};
use crate::config::SimSerialConfig;
use crate::sim::serial::feed;

#[embassy_executor::task]
pub async fn peer_task(config: &'static SimSerialConfig) {
    if config.peer_interval_ms == 0 {
        info!("Serial peer silent");
        return;
    }
    info!("Serial peer started");

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(config.peer_interval_ms)));
    let mut line = 0u32;
    while !STOP.is_requested() {
        ticker.next().await;
        line += 1;
        let text = format!("peer: line {} uptime {}s\r\n", line, Instant::now().as_secs());
        feed(&SERIAL_FIFO, text.as_bytes());
    }
}
