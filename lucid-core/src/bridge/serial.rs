//! Bidirectional serial bridge
//!
//! Bytes received on the UART are handed to a [`BridgeSink`] from the
//! bridge loop. Writes come from request handlers through
//! [`SerialBridge::send`] and never touch the receive half.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use lucid_hal::{RxEvent, SerialRx, SerialTransport, SerialTx};

use super::stats::{BridgeCounters, BridgeStatistics};
use crate::cancel::StopToken;
use crate::config::{SerialConfig, RX_CHUNK_CAPACITY};

/// Consumer of received serial data
pub trait BridgeSink {
    /// Deliver one received chunk
    ///
    /// Called from the bridge loop only, in arrival order.
    fn deliver(&mut self, chunk: &[u8]) -> impl core::future::Future<Output = ()>;
}

/// Serial bridge errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// `init` called twice without `deinit`
    AlreadyInitialized,
    /// Operation not allowed in the current lifecycle phase
    InvalidState,
    /// Nothing to send
    EmptyPayload,
    /// UART driver could not be installed
    Transport,
    /// Driver rejected the write or accepted only part of it
    WriteFailed,
}

/// Bridge lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgePhase {
    Uninitialized,
    /// Driver installed, loop parked
    Stopped,
    /// Loop pumping received data to the sink
    Running,
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// UART bridge shared between the bridge task and request handlers
///
/// The bridge task must poll [`run`](Self::run) for the whole lifetime of
/// the bridge: [`stop`](Self::stop) waits for the loop to acknowledge.
pub struct SerialBridge<M: RawMutex, T: SerialTransport, S> {
    phase: BlockingMutex<M, Cell<BridgePhase>>,
    config: BlockingMutex<M, Cell<SerialConfig>>,
    rx: Mutex<M, Option<T::Rx>>,
    tx: Mutex<M, Option<T::Tx>>,
    sink: Mutex<M, Option<S>>,
    counters: BridgeCounters,
    stop: StopToken,
    /// Held by [`stop`](Self::stop) so one caller waits on the loop at a time
    stopping: Mutex<M, ()>,
    start: Signal<M, ()>,
    stopped: Signal<M, ()>,
}

impl<M: RawMutex, T: SerialTransport, S: BridgeSink> SerialBridge<M, T, S> {
    pub fn new() -> Self {
        Self {
            phase: BlockingMutex::new(Cell::new(BridgePhase::Uninitialized)),
            config: BlockingMutex::new(Cell::new(SerialConfig::default())),
            rx: Mutex::new(None),
            tx: Mutex::new(None),
            sink: Mutex::new(None),
            counters: BridgeCounters::new(),
            stop: StopToken::new(),
            stopping: Mutex::new(()),
            start: Signal::new(),
            stopped: Signal::new(),
        }
    }

    pub fn phase(&self) -> BridgePhase {
        self.phase.lock(|phase| phase.get())
    }

    fn set_phase(&self, phase: BridgePhase) {
        self.phase.lock(|current| current.set(phase));
    }

    /// Current line settings
    pub fn config(&self) -> SerialConfig {
        self.config.lock(|config| config.get())
    }

    /// Install the UART driver and zero the counters
    pub async fn init(&self, transport: &mut T, config: SerialConfig) -> Result<(), BridgeError> {
        if self.phase() != BridgePhase::Uninitialized {
            warn!("Bridge already initialized");
            return Err(BridgeError::AlreadyInitialized);
        }
        self.install(transport, config).await?;
        self.counters.reset(now_ms());
        info!("Bridge initialized at {} baud", config.baud_rate);
        Ok(())
    }

    async fn install(&self, transport: &mut T, config: SerialConfig) -> Result<(), BridgeError> {
        let (rx, tx) = transport.open(&config.uart()).map_err(|_| {
            error!("UART driver install failed");
            BridgeError::Transport
        })?;
        *self.rx.lock().await = Some(rx);
        *self.tx.lock().await = Some(tx);
        self.config.lock(|current| current.set(config));
        self.counters.set_baud_rate(config.baud_rate);
        self.set_phase(BridgePhase::Stopped);
        Ok(())
    }

    /// Set where received chunks go
    ///
    /// Rejected while the loop is running.
    pub async fn set_sink(&self, sink: S) -> Result<(), BridgeError> {
        if self.phase() == BridgePhase::Running {
            warn!("Bridge sink cannot change while running");
            return Err(BridgeError::InvalidState);
        }
        *self.sink.lock().await = Some(sink);
        Ok(())
    }

    /// Release the bridge loop
    pub fn start(&self) -> Result<(), BridgeError> {
        let phase = self.phase();
        if phase != BridgePhase::Stopped {
            warn!("Bridge start rejected in {:?}", phase);
            return Err(BridgeError::InvalidState);
        }
        self.stop.clear();
        self.stopped.reset();
        self.counters.mark_started(now_ms());
        self.set_phase(BridgePhase::Running);
        self.start.signal(());
        info!("Bridge started");
        Ok(())
    }

    /// Ask the loop to exit and wait until it has
    ///
    /// Returns within one event wait of the request. Does nothing if the
    /// bridge is not running; concurrent callers all return once the loop
    /// has acknowledged.
    pub async fn stop(&self) {
        let _stopping = self.stopping.lock().await;
        if self.phase() != BridgePhase::Running {
            return;
        }
        self.stop.request();
        self.stopped.wait().await;
        self.counters.mark_stopped(now_ms());
        self.set_phase(BridgePhase::Stopped);
        info!("Bridge stopped");
    }

    /// Stop the loop and release the driver
    pub async fn deinit(&self) {
        self.stop().await;
        if self.phase() == BridgePhase::Uninitialized {
            return;
        }
        self.rx.lock().await.take();
        self.tx.lock().await.take();
        self.set_phase(BridgePhase::Uninitialized);
        info!("Bridge deinitialized");
    }

    /// Apply new line settings, restarting the loop if it was running
    pub async fn reconfigure(&self, transport: &mut T, config: SerialConfig) -> Result<(), BridgeError> {
        let was_running = match self.phase() {
            BridgePhase::Uninitialized => return Err(BridgeError::InvalidState),
            BridgePhase::Stopped => false,
            BridgePhase::Running => true,
        };
        self.stop().await;
        if let Err(e) = self.install(transport, config).await {
            self.rx.lock().await.take();
            self.tx.lock().await.take();
            self.set_phase(BridgePhase::Uninitialized);
            return Err(e);
        }
        info!("Bridge reconfigured to {} baud", config.baud_rate);
        if was_running {
            self.start()?;
        }
        Ok(())
    }

    /// Write bytes to the UART
    ///
    /// Returns the number of bytes written. A write the driver only
    /// partially accepts counts the accepted bytes and still fails.
    pub async fn send(&self, data: &[u8]) -> Result<usize, BridgeError> {
        if data.is_empty() {
            return Err(BridgeError::EmptyPayload);
        }
        if self.phase() != BridgePhase::Running {
            return Err(BridgeError::InvalidState);
        }
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(BridgeError::InvalidState)?;
        match tx.write(data).await {
            Ok(written) if written == data.len() => {
                self.counters.record_tx(written);
                trace!("UART tx {} bytes", written);
                Ok(written)
            }
            Ok(written) => {
                self.counters.record_tx(written);
                self.counters.record_tx_error();
                warn!("UART short write: {} of {} bytes", written, data.len());
                Err(BridgeError::WriteFailed)
            }
            Err(_) => {
                self.counters.record_tx_error();
                warn!("UART write failed");
                Err(BridgeError::WriteFailed)
            }
        }
    }

    pub fn statistics(&self) -> BridgeStatistics {
        self.counters.snapshot(now_ms())
    }

    /// Zero the counters and restart the uptime clock
    pub fn reset_stats(&self) {
        self.counters.reset(now_ms());
    }

    pub fn is_active(&self) -> bool {
        self.counters.is_active()
    }

    pub fn rx_count(&self) -> u64 {
        self.counters.rx_bytes()
    }

    pub fn tx_count(&self) -> u64 {
        self.counters.tx_bytes()
    }

    /// Bridge task body
    ///
    /// Parks until [`start`](Self::start), pumps received data until a stop
    /// is requested, acknowledges, and parks again. Never returns.
    pub async fn run(&self) {
        info!("Bridge task started");
        loop {
            self.start.wait().await;
            self.pump().await;
            self.stopped.signal(());
        }
    }

    async fn pump(&self) {
        let mut rx_guard = self.rx.lock().await;
        let Some(rx) = rx_guard.as_mut() else {
            warn!("Bridge started without a receiver");
            return;
        };
        let mut sink = self.sink.lock().await;
        let config = self.config();
        let wait = Duration::from_millis(u64::from(config.event_wait_ms));
        let mut buf = [0u8; RX_CHUNK_CAPACITY];
        let chunk_len = usize::from(config.rx_chunk_len).clamp(1, RX_CHUNK_CAPACITY);
        let chunk = &mut buf[..chunk_len];

        debug!("Bridge loop running");
        while !self.stop.is_requested() {
            let event = rx.read_event(chunk, wait).await;
            match event {
                RxEvent::Data(len) => {
                    let len = len.min(chunk.len());
                    if len == 0 {
                        continue;
                    }
                    self.counters.record_rx(len);
                    trace!("UART rx {} bytes", len);
                    if let Some(sink) = sink.as_mut() {
                        sink.deliver(&chunk[..len]).await;
                    }
                }
                RxEvent::FifoOverflow
                | RxEvent::BufferFull
                | RxEvent::ParityError
                | RxEvent::FrameError => {
                    warn!("UART rx error: {:?}", event);
                    self.counters.record_rx_error();
                    rx.flush_input();
                    rx.clear_events();
                }
                RxEvent::Idle => {}
                RxEvent::Other(code) => debug!("UART event {}", code),
            }
        }
        debug!("Bridge loop exiting");
    }
}

impl<M: RawMutex, T: SerialTransport, S: BridgeSink> Default for SerialBridge<M, T, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CollectSink, FakeSerial};
    use embassy_futures::join::join;
    use embassy_futures::select::{select, Either};
    use embassy_futures::{block_on, yield_now};
    use embassy_time::with_timeout;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    type TestBridge = SerialBridge<CriticalSectionRawMutex, FakeSerial, CollectSink>;

    fn running_bridge(serial: &mut FakeSerial) -> TestBridge {
        let bridge = TestBridge::new();
        block_on(bridge.init(serial, SerialConfig::default())).unwrap();
        bridge.start().unwrap();
        bridge
    }

    /// Run the bridge loop next to `control` until `control` finishes
    fn drive<F: core::future::Future>(bridge: &TestBridge, control: F) -> F::Output {
        match block_on(select(bridge.run(), control)) {
            Either::First(()) => unreachable!("bridge loop returned"),
            Either::Second(out) => out,
        }
    }

    #[test]
    fn test_init_twice_fails() {
        let mut serial = FakeSerial::new();
        let bridge = TestBridge::new();
        block_on(bridge.init(&mut serial, SerialConfig::default())).unwrap();
        let second = block_on(bridge.init(&mut serial, SerialConfig::default()));
        assert_eq!(second, Err(BridgeError::AlreadyInitialized));
    }

    #[test]
    fn test_start_before_init_fails() {
        let bridge = TestBridge::new();
        assert_eq!(bridge.start(), Err(BridgeError::InvalidState));
        assert!(!bridge.is_active());
    }

    #[test]
    fn test_start_twice_fails() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        assert_eq!(bridge.start(), Err(BridgeError::InvalidState));
        assert!(bridge.is_active());
    }

    #[test]
    fn test_open_failure_leaves_bridge_uninitialized() {
        let mut serial = FakeSerial::new();
        serial.fail_open = true;
        let bridge = TestBridge::new();
        let result = block_on(bridge.init(&mut serial, SerialConfig::default()));
        assert_eq!(result, Err(BridgeError::Transport));
        assert_eq!(bridge.phase(), BridgePhase::Uninitialized);
    }

    #[test]
    fn test_init_uses_configured_line_settings() {
        let mut serial = FakeSerial::new();
        let bridge = TestBridge::new();
        let config = SerialConfig {
            baud_rate: 9600,
            ..SerialConfig::default()
        };
        block_on(bridge.init(&mut serial, config)).unwrap();
        assert_eq!(serial.log.borrow().opened[0].baudrate, 9600);
        assert_eq!(bridge.statistics().baud_rate, 9600);
    }

    #[test]
    fn test_send_requires_running_bridge() {
        let mut serial = FakeSerial::new();
        let bridge = TestBridge::new();
        block_on(bridge.init(&mut serial, SerialConfig::default())).unwrap();
        assert_eq!(block_on(bridge.send(b"AT\r\n")), Err(BridgeError::InvalidState));
        assert!(serial.log.borrow().written.is_empty());
    }

    #[test]
    fn test_send_empty_payload_fails() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        assert_eq!(block_on(bridge.send(b"")), Err(BridgeError::EmptyPayload));
        assert_eq!(bridge.statistics().tx_errors, 0);
    }

    #[test]
    fn test_send_counts_bytes() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        assert_eq!(block_on(bridge.send(b"AT\r\n")), Ok(4));
        assert_eq!(block_on(bridge.send(b"ATI\r\n")), Ok(5));
        assert_eq!(bridge.tx_count(), 9);
        assert_eq!(serial.log.borrow().written.as_slice(), b"AT\r\nATI\r\n");
    }

    #[test]
    fn test_short_write_is_an_error() {
        let mut serial = FakeSerial::new();
        serial.log.borrow_mut().write_limit = Some(3);
        let bridge = running_bridge(&mut serial);
        assert_eq!(block_on(bridge.send(b"hello")), Err(BridgeError::WriteFailed));
        let stats = bridge.statistics();
        assert_eq!(stats.tx_bytes, 3);
        assert_eq!(stats.tx_errors, 1);
    }

    #[test]
    fn test_driver_write_error() {
        let mut serial = FakeSerial::new();
        serial.log.borrow_mut().fail_writes = true;
        let bridge = running_bridge(&mut serial);
        assert_eq!(block_on(bridge.send(b"x")), Err(BridgeError::WriteFailed));
        let stats = bridge.statistics();
        assert_eq!(stats.tx_bytes, 0);
        assert_eq!(stats.tx_errors, 1);
    }

    #[test]
    fn test_overflow_between_data_chunks() {
        let mut serial = FakeSerial::new();
        serial.push_data(b"hello");
        serial.push_event(RxEvent::FifoOverflow);
        serial.push_data(b"world");
        let sink = CollectSink::new();
        let bridge = TestBridge::new();
        block_on(bridge.init(&mut serial, SerialConfig::default())).unwrap();
        block_on(bridge.set_sink(sink.clone())).unwrap();
        bridge.start().unwrap();

        drive(&bridge, async {
            for _ in 0..1000 {
                if bridge.rx_count() >= 10 {
                    break;
                }
                yield_now().await;
            }
            bridge.stop().await;
        });

        let stats = bridge.statistics();
        assert_eq!(stats.rx_bytes, 10);
        assert_eq!(stats.rx_errors, 1);
        assert!(!stats.active);
        assert_eq!(sink.chunks(), vec![b"hello".to_vec(), b"world".to_vec()]);
        let log = serial.log.borrow();
        assert_eq!(log.input_flushes, 1);
        assert_eq!(log.event_clears, 1);
    }

    #[test]
    fn test_line_errors_are_counted() {
        let mut serial = FakeSerial::new();
        serial.push_event(RxEvent::ParityError);
        serial.push_event(RxEvent::FrameError);
        serial.push_event(RxEvent::BufferFull);
        serial.push_event(RxEvent::Other(9));
        serial.push_data(b"ok");
        let bridge = running_bridge(&mut serial);

        drive(&bridge, async {
            for _ in 0..1000 {
                if bridge.rx_count() >= 2 {
                    break;
                }
                yield_now().await;
            }
            bridge.stop().await;
        });

        assert_eq!(bridge.statistics().rx_errors, 3);
        assert_eq!(serial.log.borrow().input_flushes, 3);
    }

    #[test]
    fn test_stop_then_restart() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        drive(&bridge, bridge.stop());
        assert_eq!(bridge.phase(), BridgePhase::Stopped);
        assert_eq!(block_on(bridge.send(b"x")), Err(BridgeError::InvalidState));

        bridge.start().unwrap();
        assert!(bridge.is_active());
        assert_eq!(block_on(bridge.send(b"x")), Ok(1));
    }

    #[test]
    fn test_concurrent_stops_both_return() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        let both = drive(
            &bridge,
            with_timeout(Duration::from_secs(2), join(bridge.stop(), bridge.stop())),
        );
        assert!(both.is_ok());
        assert_eq!(bridge.phase(), BridgePhase::Stopped);

        bridge.start().unwrap();
        assert!(bridge.is_active());
    }

    #[test]
    fn test_stop_when_not_running_returns() {
        let mut serial = FakeSerial::new();
        let bridge = TestBridge::new();
        block_on(bridge.stop());
        block_on(bridge.init(&mut serial, SerialConfig::default())).unwrap();
        block_on(bridge.stop());
        assert_eq!(bridge.phase(), BridgePhase::Stopped);
    }

    #[test]
    fn test_sink_locked_while_running() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        let result = block_on(bridge.set_sink(CollectSink::new()));
        assert_eq!(result, Err(BridgeError::InvalidState));
    }

    #[test]
    fn test_deinit_releases_driver() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        drive(&bridge, bridge.deinit());
        assert_eq!(bridge.phase(), BridgePhase::Uninitialized);
        assert_eq!(bridge.start(), Err(BridgeError::InvalidState));
        block_on(bridge.init(&mut serial, SerialConfig::default())).unwrap();
    }

    #[test]
    fn test_reconfigure_restarts_running_bridge() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        let config = SerialConfig {
            baud_rate: 57600,
            ..SerialConfig::default()
        };
        drive(&bridge, async {
            bridge.reconfigure(&mut serial, config).await.unwrap();
        });
        assert!(bridge.is_active());
        assert_eq!(bridge.config().baud_rate, 57600);
        assert_eq!(serial.log.borrow().opened.len(), 2);
    }

    #[test]
    fn test_reset_stats() {
        let mut serial = FakeSerial::new();
        let bridge = running_bridge(&mut serial);
        block_on(bridge.send(b"abc")).unwrap();
        bridge.reset_stats();
        assert_eq!(bridge.tx_count(), 0);
        assert_eq!(bridge.rx_count(), 0);
    }
}
