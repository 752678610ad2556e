//! Status screen layout
//!
//! ```text
//! LucidConsole 1234s
//! STA: homenet -61dBm
//! IP: 192.168.1.40
//! 212K RX:1024 TX:96
//! ```

use core::fmt::Write;

use heapless::String;

use super::command::{LineText, StatusScreen};
use crate::connectivity::WifiMode;
use crate::text::truncated;

/// Number of rows the status screen occupies
pub const STATUS_ROWS: usize = 4;

/// Format a row, clipping it to the display width
macro_rules! row {
    ($($arg:tt)*) => {{
        let mut buf: String<64> = String::new();
        // Overflow only loses characters that would be clipped anyway
        let _ = write!(buf, $($arg)*);
        truncated::<{ super::command::MAX_LINE_LEN }>(&buf)
    }};
}

/// Lay out the status screen rows
pub fn status_lines(title: &str, status: &StatusScreen) -> [LineText; STATUS_ROWS] {
    let header = row!("{} {}s", title, status.uptime_s);

    let wifi = match status.mode {
        WifiMode::Init => row!("WiFi: Initializing"),
        WifiMode::ApMode => row!("AP: {}", status.ssid),
        WifiMode::StaConnecting => row!("Conn: {}", status.ssid),
        WifiMode::StaConnected => row!("STA: {} {}dBm", status.ssid, status.rssi),
        WifiMode::StaDisconnected => row!("WiFi: Disconnected"),
    };

    let address = if status.mode == WifiMode::ApMode {
        let plural = if status.client_count == 1 { "" } else { "s" };
        row!("{} ({} client{})", status.ip, status.client_count, plural)
    } else {
        row!("IP: {}", status.ip)
    };

    let traffic = row!(
        "{}K RX:{} TX:{}",
        status.free_memory / 1024,
        status.rx_bytes,
        status.tx_bytes
    );

    [header, wifi, address, traffic]
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::net::Ipv4Addr;

    fn screen(mode: WifiMode) -> StatusScreen {
        StatusScreen {
            uptime_s: 42,
            free_memory: 200 * 1024,
            rx_bytes: 1024,
            tx_bytes: 96,
            mode,
            ssid: truncated("homenet"),
            ip: Ipv4Addr::new(192, 168, 1, 40),
            rssi: -61,
            client_count: 0,
        }
    }

    #[test]
    fn test_station_layout() {
        let lines = status_lines("LucidConsole", &screen(WifiMode::StaConnected));
        assert_eq!(lines[0].as_str(), "LucidConsole 42s");
        assert_eq!(lines[1].as_str(), "STA: homenet -61dBm");
        assert_eq!(lines[2].as_str(), "IP: 192.168.1.40");
        assert_eq!(lines[3].as_str(), "200K RX:1024 TX:96");
    }

    #[test]
    fn test_ap_layout_counts_clients() {
        let mut status = screen(WifiMode::ApMode);
        status.ssid = truncated("LUCIDUART_A1B2");
        status.ip = Ipv4Addr::new(10, 10, 10, 1);
        status.client_count = 1;
        let lines = status_lines("LucidConsole", &status);
        assert_eq!(lines[1].as_str(), "AP: LUCIDUART_A1B2");
        assert_eq!(lines[2].as_str(), "10.10.10.1 (1 client)");

        status.ip = Ipv4Addr::new(10, 0, 0, 1);
        status.client_count = 3;
        let lines = status_lines("LucidConsole", &status);
        assert_eq!(lines[2].as_str(), "10.0.0.1 (3 clients)");
    }

    #[test]
    fn test_transitional_modes() {
        let lines = status_lines("LucidConsole", &screen(WifiMode::Init));
        assert_eq!(lines[1].as_str(), "WiFi: Initializing");
        let lines = status_lines("LucidConsole", &screen(WifiMode::StaConnecting));
        assert_eq!(lines[1].as_str(), "Conn: homenet");
        let lines = status_lines("LucidConsole", &screen(WifiMode::StaDisconnected));
        assert_eq!(lines[1].as_str(), "WiFi: Disconnected");
    }

    #[test]
    fn test_long_values_are_clipped() {
        let mut status = screen(WifiMode::StaConnected);
        status.ssid = truncated("a-very-long-network-name");
        let lines = status_lines("LucidConsole", &status);
        assert_eq!(lines[1].len(), 21);
        assert_eq!(lines[1].as_str(), "STA: a-very-long-netw");
    }
}
