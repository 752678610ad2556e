//! Platform statistics

/// Runtime information provided by the platform
pub trait SystemInfo {
    /// Free heap or pool memory in bytes
    fn free_memory(&self) -> u32;
}
