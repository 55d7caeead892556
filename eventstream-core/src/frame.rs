//! Frame prelude parsing and single-frame decoding.
//!
//! Every frame is self-delimiting:
//!
//! ```text
//! [total_length:4][header_block_length:4][prelude_crc:4][headers][payload][message_crc:4]
//! ```
//!
//! All integers are big-endian. `total_length` counts the whole frame,
//! including its own four bytes and the trailing message CRC.

use std::ops::Range;

use bytes::Bytes;

use crate::checksum::verify_checksums;
use crate::error::FrameError;
use crate::headers::decode_header_block;
use crate::message::{Message, Payload};

/// Prelude size: total length, header-block length and prelude CRC.
pub const PRELUDE_SIZE: usize = 12;

/// Trailer size: the message CRC.
pub const TRAILER_SIZE: usize = 4;

/// Smallest valid frame: a prelude and a trailer with nothing between.
pub const MIN_FRAME_SIZE: usize = PRELUDE_SIZE + TRAILER_SIZE;

/// The fixed 12-byte frame prelude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prelude {
    /// Length of the whole frame in bytes.
    pub total_length: u32,
    /// Length of the encoded header block in bytes.
    pub header_block_length: u32,
    /// CRC32 of the first eight bytes, as sent.
    pub prelude_crc: u32,
}

impl Prelude {
    /// Parse the prelude from the start of `data`.
    ///
    /// Returns `None` if fewer than [`PRELUDE_SIZE`] bytes are available.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < PRELUDE_SIZE {
            return None;
        }

        Some(Self {
            total_length: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            header_block_length: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            prelude_crc: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
        })
    }

    /// Check that the buffer can advance past this frame.
    ///
    /// # Errors
    /// [`FrameError::InvalidLength`] if `total_length` is zero. Any other
    /// length consumes at least one byte.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.total_length == 0 {
            return Err(FrameError::InvalidLength { total_length: 0 });
        }
        Ok(())
    }

    /// Whether the frame is too short to carry a prelude and trailer.
    ///
    /// Such frames decode to nothing and are skipped.
    pub fn is_undersized(&self) -> bool {
        (self.total_length as usize) < MIN_FRAME_SIZE
    }

    /// Byte range of the header block within the frame.
    ///
    /// Clamped to the frame, so a header block declared longer than the
    /// frame ends at `total_length`.
    pub fn header_block_range(&self) -> Range<usize> {
        let end = PRELUDE_SIZE
            .saturating_add(self.header_block_length as usize)
            .min(self.total_length as usize)
            .max(PRELUDE_SIZE);
        PRELUDE_SIZE..end
    }

    /// Byte range of the payload within the frame.
    ///
    /// Empty when the header block reaches into the trailer.
    pub fn payload_range(&self) -> Range<usize> {
        let start = self.header_block_range().end;
        let end = (self.total_length as usize)
            .saturating_sub(TRAILER_SIZE)
            .max(start);
        start..end
    }
}

/// Decode one frame from the start of `data`, skipping both checksums.
///
/// Bytes past `total_length` are ignored. A header block declared longer
/// than the frame is cut off at the end of the frame, and the payload is
/// then empty.
///
/// # Returns
/// - `Ok(Some(message))` if a complete frame was decoded
/// - `Ok(None)` if more data is needed, or if the frame is shorter than
///   [`MIN_FRAME_SIZE`] and carries no message
/// - `Err(e)` if the prelude declares a zero total length
///
/// # Example
///
/// ```
/// use eventstream_core::decode_message;
///
/// let payload = br#"{"a":1}"#;
/// let total = (12 + payload.len() + 4) as u32;
/// let mut frame = Vec::new();
/// frame.extend_from_slice(&total.to_be_bytes());
/// frame.extend_from_slice(&0u32.to_be_bytes());
/// frame.extend_from_slice(&[0; 4]);
/// frame.extend_from_slice(payload);
/// frame.extend_from_slice(&[0; 4]);
///
/// let message = decode_message(&frame).unwrap().unwrap();
/// assert_eq!(message.total_length(), total);
/// assert_eq!(message.payload().as_json().unwrap()["a"], 1);
///
/// // One byte short: not an error, just incomplete.
/// assert!(decode_message(&frame[..frame.len() - 1]).unwrap().is_none());
/// ```
pub fn decode_message(data: &[u8]) -> Result<Option<Message>, FrameError> {
    decode_frame(data, false)
}

/// Decode one frame from the start of `data`, verifying both checksums.
///
/// Behaves like [`decode_message`], and additionally fails with
/// [`FrameError::PreludeChecksum`] or [`FrameError::MessageChecksum`] when a
/// CRC does not match.
pub fn decode_message_verified(data: &[u8]) -> Result<Option<Message>, FrameError> {
    decode_frame(data, true)
}

fn decode_frame(data: &[u8], verify: bool) -> Result<Option<Message>, FrameError> {
    let Some(prelude) = Prelude::parse(data) else {
        return Ok(None);
    };
    prelude.validate()?;

    let total = prelude.total_length as usize;
    if data.len() < total || prelude.is_undersized() {
        return Ok(None);
    }

    let frame = &data[..total];
    if verify {
        verify_checksums(frame)?;
    }

    let headers = decode_header_block(&frame[prelude.header_block_range()]);
    let payload = Payload::from_bytes(Bytes::copy_from_slice(&frame[prelude.payload_range()]));

    Ok(Some(Message::new(headers, payload, prelude.total_length)))
}
