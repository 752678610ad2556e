//! Test doubles for the driver traits
//!
//! Each fake shares its recorded state through `Rc` handles, so a test can
//! keep a clone after moving the fake into the component under test.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use embassy_futures::yield_now;
use embassy_time::Duration;
use lucid_hal::credentials::StoreError;
use lucid_hal::{
    ApSettings, CredentialStore, Credentials, DisplayBackend, DisplayError, Message, NetworkDriver, RxEvent,
    SerialRx, SerialTransport, SerialTx, Subscriber, SystemInfo, UartConfig,
};

use crate::bridge::BridgeSink;

// Serial

#[derive(Default)]
pub struct SerialLog {
    pub opened: Vec<UartConfig>,
    pub written: Vec<u8>,
    pub input_flushes: usize,
    pub event_clears: usize,
    /// Accept at most this many bytes per write
    pub write_limit: Option<usize>,
    pub fail_writes: bool,
    script: VecDeque<(RxEvent, Vec<u8>)>,
}

pub struct FakeSerial {
    pub log: Rc<RefCell<SerialLog>>,
    pub fail_open: bool,
}

impl FakeSerial {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(SerialLog::default())),
            fail_open: false,
        }
    }

    /// Queue a data event carrying `data`
    pub fn push_data(&self, data: &[u8]) {
        self.log
            .borrow_mut()
            .script
            .push_back((RxEvent::Data(data.len()), data.to_vec()));
    }

    pub fn push_event(&self, event: RxEvent) {
        self.log.borrow_mut().script.push_back((event, Vec::new()));
    }
}

impl SerialTransport for FakeSerial {
    type Rx = FakeRx;
    type Tx = FakeTx;
    type Error = ();

    fn open(&mut self, config: &UartConfig) -> Result<(FakeRx, FakeTx), ()> {
        if self.fail_open {
            return Err(());
        }
        self.log.borrow_mut().opened.push(*config);
        Ok((
            FakeRx {
                log: self.log.clone(),
            },
            FakeTx {
                log: self.log.clone(),
            },
        ))
    }
}

pub struct FakeRx {
    log: Rc<RefCell<SerialLog>>,
}

impl SerialRx for FakeRx {
    async fn read_event(&mut self, buf: &mut [u8], _timeout: Duration) -> RxEvent {
        // Always yield so a scripted loop cannot starve the test's control future
        yield_now().await;
        let next = self.log.borrow_mut().script.pop_front();
        match next {
            Some((RxEvent::Data(_), data)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                RxEvent::Data(len)
            }
            Some((event, _)) => event,
            None => RxEvent::Idle,
        }
    }

    fn flush_input(&mut self) {
        self.log.borrow_mut().input_flushes += 1;
    }

    fn clear_events(&mut self) {
        self.log.borrow_mut().event_clears += 1;
    }
}

pub struct FakeTx {
    log: Rc<RefCell<SerialLog>>,
}

impl SerialTx for FakeTx {
    type Error = ();

    async fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        let mut log = self.log.borrow_mut();
        if log.fail_writes {
            return Err(());
        }
        let len = log.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        log.written.extend_from_slice(&data[..len]);
        Ok(len)
    }
}

#[derive(Clone, Default)]
pub struct CollectSink {
    chunks: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.borrow().clone()
    }
}

impl BridgeSink for CollectSink {
    async fn deliver(&mut self, chunk: &[u8]) {
        self.chunks.borrow_mut().push(chunk.to_vec());
    }
}

// Display

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    Clear,
    Text { row: u8, col: u8, text: String },
    FillRect { x: u16, y: u16, width: u16, height: u16, on: bool },
    Power(bool),
    Flush,
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    ops: Rc<RefCell<Vec<DrawOp>>>,
    failures: Rc<Cell<usize>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.borrow().clone()
    }

    pub fn flushes(&self) -> usize {
        self.ops.borrow().iter().filter(|op| **op == DrawOp::Flush).count()
    }

    /// Fail the next `count` primitive calls
    pub fn fail_next(&self, count: usize) {
        self.failures.set(count);
    }

    fn record(&self, op: DrawOp) -> Result<(), DisplayError> {
        let failures = self.failures.get();
        if failures > 0 {
            self.failures.set(failures - 1);
            return Err(DisplayError::Communication);
        }
        self.ops.borrow_mut().push(op);
        Ok(())
    }
}

impl DisplayBackend for RecordingDisplay {
    async fn clear(&mut self) -> Result<(), DisplayError> {
        self.record(DrawOp::Clear)
    }

    async fn draw_text(&mut self, row: u8, col: u8, text: &str) -> Result<(), DisplayError> {
        self.record(DrawOp::Text {
            row,
            col,
            text: text.to_string(),
        })
    }

    async fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, on: bool) -> Result<(), DisplayError> {
        self.record(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            on,
        })
    }

    async fn set_power(&mut self, on: bool) -> Result<(), DisplayError> {
        self.record(DrawOp::Power(on))
    }

    async fn flush(&mut self) -> Result<(), DisplayError> {
        self.record(DrawOp::Flush)
    }

    fn dimensions(&self) -> (u8, u8) {
        (21, 8)
    }
}

// Radio and storage

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioOp {
    StartAp {
        ssid: String,
        password: String,
        channel: u8,
        max_connections: u8,
    },
    StartSta {
        ssid: String,
        password: String,
    },
    Reconnect,
    Stop,
}

#[derive(Clone, Default)]
pub struct FakeRadio {
    ops: Rc<RefCell<Vec<RadioOp>>>,
    station_failure: Rc<Cell<bool>>,
    ap_failure: Rc<Cell<bool>>,
    stop_failure: Rc<Cell<bool>>,
}

impl FakeRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<RadioOp> {
        self.ops.borrow().clone()
    }

    pub fn fail_station(&self, fail: bool) {
        self.station_failure.set(fail);
    }

    pub fn fail_ap(&self, fail: bool) {
        self.ap_failure.set(fail);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.stop_failure.set(fail);
    }
}

impl NetworkDriver for FakeRadio {
    type Error = ();

    async fn start_ap(&mut self, settings: &ApSettings<'_>) -> Result<(), ()> {
        if self.ap_failure.get() {
            return Err(());
        }
        self.ops.borrow_mut().push(RadioOp::StartAp {
            ssid: settings.ssid.to_string(),
            password: settings.password.to_string(),
            channel: settings.channel,
            max_connections: settings.max_connections,
        });
        Ok(())
    }

    async fn start_sta(&mut self, ssid: &str, password: &str) -> Result<(), ()> {
        if self.station_failure.get() {
            return Err(());
        }
        self.ops.borrow_mut().push(RadioOp::StartSta {
            ssid: ssid.to_string(),
            password: password.to_string(),
        });
        Ok(())
    }

    async fn reconnect(&mut self) -> Result<(), ()> {
        self.ops.borrow_mut().push(RadioOp::Reconnect);
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), ()> {
        if self.stop_failure.get() {
            return Err(());
        }
        self.ops.borrow_mut().push(RadioOp::Stop);
        Ok(())
    }

    fn mac_address(&self) -> [u8; 6] {
        [0x24, 0x0a, 0xc4, 0x12, 0xa1, 0xb2]
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    record: Rc<RefCell<Option<Credentials>>>,
    write_failure: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(credentials: Credentials) -> Self {
        let store = Self::default();
        *store.record.borrow_mut() = Some(credentials);
        store
    }

    pub fn contents(&self) -> Option<Credentials> {
        self.record.borrow().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.write_failure.set(fail);
    }
}

impl CredentialStore for MemoryStore {
    async fn load(&mut self) -> Result<Option<Credentials>, StoreError> {
        Ok(self.record.borrow().clone())
    }

    async fn store(&mut self, credentials: &Credentials) -> Result<(), StoreError> {
        if self.write_failure.get() {
            return Err(StoreError::Storage);
        }
        *self.record.borrow_mut() = Some(credentials.clone());
        Ok(())
    }

    async fn erase(&mut self) -> Result<(), StoreError> {
        *self.record.borrow_mut() = None;
        Ok(())
    }
}

// Subscribers and platform

#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    frames: Rc<RefCell<Vec<String>>>,
    failing: Rc<Cell<bool>>,
    stalled: Rc<Cell<bool>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame received, in wire format
    pub fn frames(&self) -> Vec<String> {
        self.frames.borrow().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.failing.set(fail);
    }

    /// Make sends hang forever
    pub fn stall(&self, stall: bool) {
        self.stalled.set(stall);
    }

    pub fn same_as(&self, other: &FakeClient) -> bool {
        Rc::ptr_eq(&self.frames, &other.frames)
    }
}

impl Subscriber for FakeClient {
    type Error = ();

    async fn send(&mut self, message: &Message<'_>) -> Result<(), ()> {
        if self.stalled.get() {
            core::future::pending::<()>().await;
        }
        if self.failing.get() {
            return Err(());
        }
        self.frames.borrow_mut().push(message.to_string());
        Ok(())
    }
}

pub struct FakeSystem(pub u32);

impl SystemInfo for FakeSystem {
    fn free_memory(&self) -> u32 {
        self.0
    }
}
