//! Simulated UART
//!
//! The receive side reads from [`SERIAL_FIFO`]; writes are logged and, in
//! loopback mode, fed straight back into the FIFO.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{with_timeout, Duration};
use log::*;
use lucid_hal::{RxEvent, SerialRx, SerialTransport, SerialTx, UartConfig};
use portable_atomic::Ordering;

use crate::channels::{SERIAL_FIFO, SERIAL_FIFO_SIZE, SERIAL_OVERRUN};

type Fifo = Pipe<CriticalSectionRawMutex, SERIAL_FIFO_SIZE>;

pub struct SimSerial {
    loopback: bool,
}

impl SimSerial {
    pub fn new(loopback: bool) -> Self {
        Self { loopback }
    }
}

impl SerialTransport for SimSerial {
    type Rx = SimRx;
    type Tx = SimTx;
    type Error = Infallible;

    fn open(&mut self, config: &UartConfig) -> Result<(SimRx, SimTx), Infallible> {
        info!(
            "UART opened: {} baud, {:?} {:?} {:?}, flow control {}",
            config.baudrate, config.data_bits, config.parity, config.stop_bits, config.flow_control
        );
        Ok((
            SimRx { fifo: &SERIAL_FIFO },
            SimTx {
                fifo: &SERIAL_FIFO,
                loopback: self.loopback,
            },
        ))
    }
}

pub struct SimRx {
    fifo: &'static Fifo,
}

impl SerialRx for SimRx {
    async fn read_event(&mut self, buf: &mut [u8], timeout: Duration) -> RxEvent {
        if SERIAL_OVERRUN.swap(false, Ordering::AcqRel) {
            return RxEvent::FifoOverflow;
        }
        match with_timeout(timeout, self.fifo.read(buf)).await {
            Ok(len) => RxEvent::Data(len),
            Err(_) => RxEvent::Idle,
        }
    }

    fn flush_input(&mut self) {
        let mut scratch = [0u8; 64];
        while self.fifo.try_read(&mut scratch).is_ok() {}
    }

    fn clear_events(&mut self) {
        SERIAL_OVERRUN.store(false, Ordering::Release);
    }
}

pub struct SimTx {
    fifo: &'static Fifo,
    loopback: bool,
}

impl SerialTx for SimTx {
    type Error = Infallible;

    async fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        debug!("UART TX {:?}", String::from_utf8_lossy(data));
        if self.loopback {
            feed(self.fifo, data);
        }
        Ok(data.len())
    }
}

/// Push bytes into the receive FIFO, flagging an overrun if they don't fit
pub fn feed(fifo: &Fifo, data: &[u8]) {
    let accepted = fifo.try_write(data).unwrap_or(0);
    if accepted < data.len() {
        warn!("UART RX FIFO overrun, {} bytes lost", data.len() - accepted);
        SERIAL_OVERRUN.store(true, Ordering::Release);
    }
}
