//! Base64 framing of serial chunks

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Raw bytes carried by one event-stream message
pub const MAX_RAW_CHUNK: usize = 384;

/// Encoded size of a full raw chunk
pub const ENCODED_CAPACITY: usize = MAX_RAW_CHUNK / 3 * 4;

/// Encode at most [`MAX_RAW_CHUNK`] bytes into `buf`
///
/// Returns `None` if `raw` is longer than one chunk.
pub fn encode_chunk<'b>(raw: &[u8], buf: &'b mut [u8; ENCODED_CAPACITY]) -> Option<&'b str> {
    if raw.len() > MAX_RAW_CHUNK {
        return None;
    }
    let written = STANDARD.encode_slice(raw, &mut buf[..]).ok()?;
    core::str::from_utf8(&buf[..written]).ok()
}
