//! Frame decoding errors.
//!
//! Truncated input is never an error in this crate: incomplete frames are
//! reported as `Ok(None)` and truncated header blocks simply stop early.
//! Undersized frames are skipped and an oversized header block is clamped to
//! the frame. [`FrameError`] covers the zero-length prelude, which no decoder
//! can step past, plus the opt-in size limit and checksum verification.

/// Errors for frames that are structurally invalid or fail verification.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Frame is too short to hold a prelude and trailer.
    ///
    /// Raised for a zero `total_length` prelude, and by
    /// [`verify_checksums`](crate::verify_checksums) for a short slice.
    #[error("invalid frame length: {total_length} bytes is below the 16 byte minimum")]
    InvalidLength { total_length: u32 },

    /// Declared total length exceeds the configured maximum.
    #[error("frame of {total_length} bytes exceeds the maximum of {max} bytes")]
    FrameTooLarge { total_length: u32, max: u32 },

    /// Prelude CRC32 does not match bytes 0..8.
    #[error("prelude checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    PreludeChecksum { expected: u32, actual: u32 },

    /// Message CRC32 does not match the frame contents.
    #[error("message checksum mismatch: expected 0x{expected:08x}, got 0x{actual:08x}")]
    MessageChecksum { expected: u32, actual: u32 },
}
