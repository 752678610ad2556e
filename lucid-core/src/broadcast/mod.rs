//! Broadcast fan-out to live event-stream subscribers

pub mod encode;
pub mod fanout;

pub use encode::{encode_chunk, ENCODED_CAPACITY, MAX_RAW_CHUNK};
pub use fanout::{FanOut, SlotId, SubscribeError};
