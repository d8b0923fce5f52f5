//! Buffer storage flags and hints.

use bitflags::bitflags;

bitflags! {
    /// Flags for immutable buffer storage allocation.
    ///
    /// Immutable storage fixes the backing memory size for the handle's
    /// lifetime; these flags choose what remains legal afterwards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StorageFlags: u32 {
        /// Contents may be replaced through sub-data updates.
        const DYNAMIC_STORAGE = 1 << 0;
        /// The buffer may be mapped for reading.
        const MAP_READ = 1 << 1;
        /// The buffer may be mapped for writing.
        const MAP_WRITE = 1 << 2;
        /// A mapping may stay valid while the device uses the buffer.
        const MAP_PERSISTENT = 1 << 3;
        /// Persistent mappings are kept coherent without explicit flushes.
        const MAP_COHERENT = 1 << 4;
        /// Prefer host-visible memory.
        const CLIENT_STORAGE = 1 << 5;
    }
}

bitflags! {
    /// Flags for mapping a buffer range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapFlags: u32 {
        /// Map for reading.
        const READ = 1 << 0;
        /// Map for writing.
        const WRITE = 1 << 1;
        /// Keep the mapping valid while the device uses the buffer.
        const PERSISTENT = 1 << 2;
        /// Writes are device-visible without explicit flushes.
        const COHERENT = 1 << 3;
        /// Writes become device-visible only on explicit flush.
        const FLUSH_EXPLICIT = 1 << 4;
        /// Previous contents of the range may be discarded.
        const INVALIDATE_RANGE = 1 << 5;
    }
}

/// Usage hint for mutable (re-reservable) buffer storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageHint {
    /// Written once, used many times.
    #[default]
    StaticDraw,
    /// Rewritten frequently by the application.
    DynamicDraw,
    /// Rewritten every frame.
    StreamDraw,
    /// Read back to the host.
    StreamRead,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistent_flags_combine() {
        let flags = StorageFlags::MAP_READ | StorageFlags::MAP_WRITE | StorageFlags::MAP_PERSISTENT;
        assert!(flags.contains(StorageFlags::MAP_PERSISTENT));
        assert!(!flags.contains(StorageFlags::MAP_COHERENT));
    }
}
