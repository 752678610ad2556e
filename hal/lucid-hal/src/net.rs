//! Live event-stream subscriber abstractions
//!
//! A subscriber is one open server-sent-events connection. The fan-out
//! owns the handle while the connection lives and drops it on the first
//! failed send.

use core::fmt;

/// One event delivered to a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    /// Sent once right after the subscription is accepted
    Connected,
    /// A chunk of serial data, base64 encoded, with its raw length
    Data { encoded: &'a str, len: usize },
    /// Keep-alive comment
    Heartbeat,
}

impl fmt::Display for Message<'_> {
    /// Wire framing of the message as a complete event-stream frame
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Connected => f.write_str("data: {\"connected\": true}\n\n"),
            Message::Data { encoded, len } => {
                write!(f, "data: {{\"uart_b64\":\"{}\",\"len\":{}}}\n\n", encoded, len)
            }
            Message::Heartbeat => f.write_str(": heartbeat\n\n"),
        }
    }
}

/// An open subscriber connection
pub trait Subscriber {
    /// Error type for send failures
    type Error;

    /// Send one event to the client
    fn send(&mut self, message: &Message<'_>) -> impl core::future::Future<Output = Result<(), Self::Error>>;
}
