//! Simulated event-stream client

use log::*;
use lucid_hal::{Message, Subscriber};

/// The client went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientGone;

/// Logs every frame it receives; optionally hangs up after a number of them
pub struct SimClient {
    name: String,
    received: u32,
    fail_after: Option<u32>,
}

impl SimClient {
    pub fn new(name: &str, fail_after: Option<u32>) -> Self {
        Self {
            name: name.into(),
            received: 0,
            fail_after,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Subscriber for SimClient {
    type Error = ClientGone;

    async fn send(&mut self, message: &Message<'_>) -> Result<(), ClientGone> {
        if self.fail_after.is_some_and(|limit| self.received >= limit) {
            info!("[{}] connection closed after {} messages", self.name, self.received);
            return Err(ClientGone);
        }
        self.received += 1;
        debug!("[{}] {}", self.name, message.to_string().trim_end());
        Ok(())
    }
}
