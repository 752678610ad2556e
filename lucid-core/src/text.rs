//! Bounded string helpers

use heapless::String;

/// Copy `s` into a bounded string, dropping whatever does not fit
///
/// Truncation happens on a character boundary, so the result is always
/// valid UTF-8 and never longer than `N` bytes.
pub fn truncated<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
