//! Wire-level constants shared by every strategy.

/// Reply to negotiation: parameters accepted.
pub const SYNC_OK_FLAG: u8 = 0x01;

/// Reply to negotiation: parameters rejected.
pub const SYNC_FAIL_FLAG: u8 = 0x02;

/// Frame size limits.
pub mod limits {
    /// Bytes in a TCP frame header (big-endian u32 length).
    pub const FRAME_HEADER_LEN: usize = 4;
    /// Initial inbound buffer of a TCP connection.
    pub const READ_CHUNK_LEN: usize = 8 * 1024;
    /// Largest payload a single frame can carry.
    pub const MAX_FRAME_LEN: usize = u32::MAX as usize;
    /// Upper bound on capacity reserved from a peer-supplied count.
    pub const MAX_PREALLOC: usize = 1024;
    /// Frames buffered per direction in an in-memory link.
    pub const MEMORY_CHANNEL_CAPACITY: usize = 1024;
}
