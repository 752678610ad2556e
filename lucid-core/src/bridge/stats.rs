//! Bridge traffic counters

use portable_atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Snapshot of the bridge counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStatistics {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_errors: u32,
    pub tx_errors: u32,
    /// Seconds since the last start (frozen while stopped)
    pub uptime_s: u32,
    pub active: bool,
    pub baud_rate: u32,
}

/// Lock-free counters updated by the bridge loop and the send path
///
/// Timestamps are passed in by the caller so the counters themselves do
/// not depend on a time driver.
pub struct BridgeCounters {
    rx_bytes: AtomicU64,
    tx_bytes: AtomicU64,
    rx_errors: AtomicU32,
    tx_errors: AtomicU32,
    active: AtomicBool,
    baud_rate: AtomicU32,
    started_at_ms: AtomicU64,
    /// Uptime captured at the last stop
    frozen_uptime_s: AtomicU32,
}

impl BridgeCounters {
    pub const fn new() -> Self {
        Self {
            rx_bytes: AtomicU64::new(0),
            tx_bytes: AtomicU64::new(0),
            rx_errors: AtomicU32::new(0),
            tx_errors: AtomicU32::new(0),
            active: AtomicBool::new(false),
            baud_rate: AtomicU32::new(0),
            started_at_ms: AtomicU64::new(0),
            frozen_uptime_s: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_rx(&self, bytes: usize) {
        add_saturating(&self.rx_bytes, bytes);
    }

    pub(crate) fn record_tx(&self, bytes: usize) {
        add_saturating(&self.tx_bytes, bytes);
    }

    pub(crate) fn record_rx_error(&self) {
        self.rx_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tx_error(&self) {
        self.tx_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_baud_rate(&self, baud_rate: u32) {
        self.baud_rate.store(baud_rate, Ordering::Relaxed);
    }

    pub(crate) fn mark_started(&self, now_ms: u64) {
        self.started_at_ms.store(now_ms, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    pub(crate) fn mark_stopped(&self, now_ms: u64) {
        let uptime = self.running_uptime_s(now_ms);
        self.frozen_uptime_s.store(uptime, Ordering::Relaxed);
        self.active.store(false, Ordering::Release);
    }

    /// Zero every counter and restart the uptime clock
    pub(crate) fn reset(&self, now_ms: u64) {
        self.rx_bytes.store(0, Ordering::Relaxed);
        self.tx_bytes.store(0, Ordering::Relaxed);
        self.rx_errors.store(0, Ordering::Relaxed);
        self.tx_errors.store(0, Ordering::Relaxed);
        self.started_at_ms.store(now_ms, Ordering::Relaxed);
        self.frozen_uptime_s.store(0, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn rx_bytes(&self) -> u64 {
        self.rx_bytes.load(Ordering::Relaxed)
    }

    pub fn tx_bytes(&self) -> u64 {
        self.tx_bytes.load(Ordering::Relaxed)
    }

    fn running_uptime_s(&self, now_ms: u64) -> u32 {
        let started = self.started_at_ms.load(Ordering::Relaxed);
        (now_ms.saturating_sub(started) / 1000) as u32
    }

    pub fn snapshot(&self, now_ms: u64) -> BridgeStatistics {
        let active = self.is_active();
        BridgeStatistics {
            rx_bytes: self.rx_bytes(),
            tx_bytes: self.tx_bytes(),
            rx_errors: self.rx_errors.load(Ordering::Relaxed),
            tx_errors: self.tx_errors.load(Ordering::Relaxed),
            uptime_s: if active {
                self.running_uptime_s(now_ms)
            } else {
                self.frozen_uptime_s.load(Ordering::Relaxed)
            },
            active,
            baud_rate: self.baud_rate.load(Ordering::Relaxed),
        }
    }
}

/// Byte counters stick at the maximum instead of wrapping
fn add_saturating(counter: &AtomicU64, bytes: usize) {
    let bytes = u64::try_from(bytes).unwrap_or(u64::MAX);
    let _ = counter.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
        Some(count.saturating_add(bytes))
    });
}

impl Default for BridgeCounters {
    fn default() -> Self {
        Self::new()
    }
}
