//! Demuxer configuration.

/// Largest chunk payload that can be held in one allocation on this platform.
///
/// RIFF lengths are 32-bit, so this is `u32::MAX` unless `isize` is smaller.
pub const PLATFORM_MAX_CHUNK_SIZE: u64 = if (isize::MAX as u64) < (u32::MAX as u64) {
    isize::MAX as u64
} else {
    u32::MAX as u64
};

/// Options that influence how strictly a container is read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DemuxOptions {
    /// Largest accepted chunk payload in bytes.
    ///
    /// - Default value: [`PLATFORM_MAX_CHUNK_SIZE`]
    max_chunk_size: u64,
    /// Whether bytes after the RIFF payload are an error.
    ///
    /// - Default value: `true`
    reject_trailing_data: bool,
}

impl Default for DemuxOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: PLATFORM_MAX_CHUNK_SIZE,
            reject_trailing_data: true,
        }
    }
}

impl DemuxOptions {
    pub const fn get_max_chunk_size(&self) -> u64 {
        self.max_chunk_size
    }

    pub const fn get_reject_trailing_data(&self) -> bool {
        self.reject_trailing_data
    }

    /// Set the largest chunk payload the demuxer will materialize.
    ///
    /// Values above [`PLATFORM_MAX_CHUNK_SIZE`] are clamped to it.
    pub fn set_max_chunk_size(mut self, size: u64) -> Self {
        self.max_chunk_size = size.min(PLATFORM_MAX_CHUNK_SIZE);
        self
    }

    /// Set whether data following the RIFF payload fails the demux.
    ///
    /// Some producers append junk after the container; turning this off
    /// leaves those bytes unread in the source.
    pub fn set_reject_trailing_data(mut self, yes: bool) -> Self {
        self.reject_trailing_data = yes;
        self
    }
}
