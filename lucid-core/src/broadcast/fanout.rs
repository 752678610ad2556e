//! Subscriber fan-out
//!
//! A fixed table of live subscriber connections. Every send is bounded by
//! a timeout, and a subscriber whose send fails or times out loses its
//! slot on the spot. That is the only way slots are reclaimed besides an
//! explicit unsubscribe.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Ticker};
use lucid_hal::{Message, Subscriber};
use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use super::encode::{encode_chunk, ENCODED_CAPACITY, MAX_RAW_CHUNK};
use crate::bridge::BridgeSink;
use crate::cancel::StopToken;
use crate::config::BroadcastConfig;

/// Index of an occupied subscriber slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotId(pub u8);

/// Why a subscription was refused
#[derive(Debug)]
pub enum SubscribeError<H> {
    /// Every slot is taken; the handle is returned unused
    Full(H),
    /// The welcome message could not be delivered
    Unreachable,
}

pub struct FanOut<M: RawMutex, H, const N: usize> {
    slots: Mutex<M, [Option<H>; N]>,
    occupied: AtomicU8,
    evicted: AtomicU32,
    send_timeout: Duration,
}

impl<M: RawMutex, H: Subscriber, const N: usize> FanOut<M, H, N> {
    pub fn new(config: &BroadcastConfig) -> Self {
        Self {
            slots: Mutex::new(core::array::from_fn(|_| None)),
            occupied: AtomicU8::new(0),
            evicted: AtomicU32::new(0),
            send_timeout: Duration::from_millis(u64::from(config.send_timeout_ms)),
        }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        usize::from(self.occupied.load(Ordering::Relaxed))
    }

    /// Subscribers dropped after a failed send
    pub fn evictions(&self) -> u32 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Take a free slot and greet the new subscriber
    pub async fn subscribe(&self, mut handle: H) -> Result<SlotId, SubscribeError<H>> {
        let mut slots = self.slots.lock().await;
        let Some(index) = slots.iter().position(Option::is_none) else {
            warn!("Subscriber table full");
            return Err(SubscribeError::Full(handle));
        };
        if !self.send_bounded(&mut handle, &Message::Connected).await {
            warn!("Subscriber gone before welcome");
            return Err(SubscribeError::Unreachable);
        }
        slots[index] = Some(handle);
        self.occupied.fetch_add(1, Ordering::Relaxed);
        info!("Subscriber {} connected", index);
        Ok(SlotId(index as u8))
    }

    /// Release a slot, handing back its connection
    pub async fn unsubscribe(&self, slot: SlotId) -> Option<H> {
        let mut slots = self.slots.lock().await;
        let handle = slots.get_mut(usize::from(slot.0))?.take()?;
        self.occupied.fetch_sub(1, Ordering::Relaxed);
        info!("Subscriber {} disconnected", slot.0);
        Some(handle)
    }

    pub async fn is_subscribed(&self, slot: SlotId) -> bool {
        let slots = self.slots.lock().await;
        matches!(slots.get(usize::from(slot.0)), Some(Some(_)))
    }

    /// Send serial data to every subscriber
    ///
    /// Payloads longer than one message are split. Returns the number of
    /// successful deliveries.
    pub async fn broadcast(&self, payload: &[u8]) -> usize {
        if payload.is_empty() {
            return 0;
        }
        let mut slots = self.slots.lock().await;
        if slots.iter().all(Option::is_none) {
            return 0;
        }

        let mut buf = [0u8; ENCODED_CAPACITY];
        let mut delivered = 0;
        for raw in payload.chunks(MAX_RAW_CHUNK) {
            let Some(encoded) = encode_chunk(raw, &mut buf) else {
                continue;
            };
            let message = Message::Data {
                encoded,
                len: raw.len(),
            };
            delivered += self.deliver_all(&mut slots, &message).await;
        }
        delivered
    }

    /// Send a keep-alive to every subscriber, dropping dead ones
    pub async fn heartbeat(&self) -> usize {
        let mut slots = self.slots.lock().await;
        self.deliver_all(&mut slots, &Message::Heartbeat).await
    }

    /// Keep-alive loop, one heartbeat per period until `stop` is requested
    pub async fn run_heartbeat(&self, config: &BroadcastConfig, stop: &StopToken) {
        info!("Heartbeat task started");
        let mut ticker = Ticker::every(Duration::from_millis(u64::from(config.heartbeat_ms)));
        while !stop.is_requested() {
            ticker.next().await;
            let alive = self.heartbeat().await;
            trace!("Heartbeat reached {} subscribers", alive);
        }
        info!("Heartbeat task stopped");
    }

    async fn deliver_all(&self, slots: &mut [Option<H>; N], message: &Message<'_>) -> usize {
        let mut delivered = 0;
        for (index, slot) in slots.iter_mut().enumerate() {
            let Some(handle) = slot.as_mut() else {
                continue;
            };
            if self.send_bounded(handle, message).await {
                delivered += 1;
            } else {
                *slot = None;
                self.occupied.fetch_sub(1, Ordering::Relaxed);
                self.evicted.fetch_add(1, Ordering::Relaxed);
                info!("Subscriber {} dropped after failed send", index);
            }
        }
        delivered
    }

    async fn send_bounded(&self, handle: &mut H, message: &Message<'_>) -> bool {
        matches!(
            with_timeout(self.send_timeout, handle.send(message)).await,
            Ok(Ok(()))
        )
    }
}

impl<M: RawMutex, H: Subscriber, const N: usize> BridgeSink for &FanOut<M, H, N> {
    async fn deliver(&mut self, chunk: &[u8]) {
        self.broadcast(chunk).await;
    }
}
