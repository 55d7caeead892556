//! CRC32 helpers for the prelude and message trailer.
//!
//! Both checksums are CRC32 (IEEE). The prelude checksum covers bytes `0..8`
//! and the message checksum covers everything before the trailer.

use crate::error::FrameError;
use crate::frame::{MIN_FRAME_SIZE, TRAILER_SIZE};

/// Bytes covered by the prelude checksum.
pub const PRELUDE_CRC_OFFSET: usize = 8;

/// Compute the prelude checksum over the first 8 bytes of a frame.
///
/// Returns `None` if `frame` is shorter than 8 bytes.
pub fn prelude_crc(frame: &[u8]) -> Option<u32> {
    frame.get(..PRELUDE_CRC_OFFSET).map(crc32fast::hash)
}

/// Compute the message checksum over a complete frame, excluding its trailer.
///
/// Returns `None` if `frame` is shorter than the trailer.
pub fn message_crc(frame: &[u8]) -> Option<u32> {
    let end = frame.len().checked_sub(TRAILER_SIZE)?;
    Some(crc32fast::hash(&frame[..end]))
}

/// Verify both checksums of a complete frame.
///
/// `frame` must be exactly one frame.
pub fn verify_checksums(frame: &[u8]) -> Result<(), FrameError> {
    let too_short = || FrameError::InvalidLength {
        total_length: frame.len() as u32,
    };
    if frame.len() < MIN_FRAME_SIZE {
        return Err(too_short());
    }

    let expected = read_u32(frame, PRELUDE_CRC_OFFSET);
    let actual = prelude_crc(frame).ok_or_else(too_short)?;
    if expected != actual {
        return Err(FrameError::PreludeChecksum { expected, actual });
    }

    let expected = read_u32(frame, frame.len() - TRAILER_SIZE);
    let actual = message_crc(frame).ok_or_else(too_short)?;
    if expected != actual {
        return Err(FrameError::MessageChecksum { expected, actual });
    }

    Ok(())
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
