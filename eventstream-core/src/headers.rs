//! Tagged header-block decoding.
//!
//! A header block is a flat run of entries:
//!
//! ```text
//! [name_len:1][name:name_len][type:1][value:type-specific]
//! ```
//!
//! Only string values are materialized. Every other type is skipped by
//! length so later entries stay aligned. Decoding is tolerant: truncation or
//! an unknown type tag ends the block and keeps whatever was decoded before.

use std::collections::HashMap;

/// Decoded header map, header name to string value.
pub type Headers = HashMap<String, String>;

/// Header value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeaderType {
    BoolTrue = 0,
    BoolFalse = 1,
    Byte = 2,
    Int16 = 3,
    Int32 = 4,
    Int64 = 5,
    ByteArray = 6,
    String = 7,
    Timestamp = 8,
    Uuid = 9,
}

impl HeaderType {
    /// Map a wire tag to a header type. Returns `None` for unknown tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(HeaderType::BoolTrue),
            1 => Some(HeaderType::BoolFalse),
            2 => Some(HeaderType::Byte),
            3 => Some(HeaderType::Int16),
            4 => Some(HeaderType::Int32),
            5 => Some(HeaderType::Int64),
            6 => Some(HeaderType::ByteArray),
            7 => Some(HeaderType::String),
            8 => Some(HeaderType::Timestamp),
            9 => Some(HeaderType::Uuid),
            _ => None,
        }
    }

    /// The wire tag for this type.
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Size of the value in bytes, or `None` for the two types that carry a
    /// 2-byte big-endian length prefix.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            HeaderType::BoolTrue | HeaderType::BoolFalse => Some(0),
            HeaderType::Byte => Some(1),
            HeaderType::Int16 => Some(2),
            HeaderType::Int32 => Some(4),
            HeaderType::Int64 | HeaderType::Timestamp => Some(8),
            HeaderType::Uuid => Some(16),
            HeaderType::ByteArray | HeaderType::String => None,
        }
    }
}

impl TryFrom<u8> for HeaderType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        HeaderType::from_tag(tag).ok_or(tag)
    }
}

/// A single entry read from a header block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderEntry {
    /// Header name, decoded lossily as UTF-8.
    pub name: String,
    /// Declared value type.
    pub header_type: HeaderType,
    /// The value, present only for [`HeaderType::String`].
    pub value: Option<String>,
}

/// Iterator over the entries of a header block.
///
/// Created by [`header_entries`]. Ends at the end of the block, at the first
/// truncated entry, or at the first unknown type tag.
#[derive(Debug, Clone)]
pub struct HeaderEntries<'a> {
    data: &'a [u8],
    offset: usize,
    done: bool,
}

/// Iterate over the entries of a header block.
pub fn header_entries(data: &[u8]) -> HeaderEntries<'_> {
    HeaderEntries {
        data,
        offset: 0,
        done: false,
    }
}

/// Decode a header block into a map of its string-valued headers.
///
/// Duplicate names keep the last value. An empty block yields an empty map.
///
/// # Example
///
/// ```
/// use eventstream_core::decode_header_block;
///
/// // ":event-type" = "chunk"
/// let mut block = vec![11];
/// block.extend_from_slice(b":event-type");
/// block.push(7);
/// block.extend_from_slice(&5u16.to_be_bytes());
/// block.extend_from_slice(b"chunk");
///
/// let headers = decode_header_block(&block);
/// assert_eq!(headers.get(":event-type").map(String::as_str), Some("chunk"));
/// ```
pub fn decode_header_block(data: &[u8]) -> Headers {
    header_entries(data)
        .filter_map(|entry| entry.value.map(|value| (entry.name, value)))
        .collect()
}

impl<'a> HeaderEntries<'a> {
    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let bytes = self.data.get(self.offset..end)?;
        self.offset = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_entry(&mut self) -> Option<HeaderEntry> {
        let name_len = self.read_u8()? as usize;
        let name = String::from_utf8_lossy(self.take(name_len)?).into_owned();

        let tag = self.read_u8()?;
        let Some(header_type) = HeaderType::from_tag(tag) else {
            #[cfg(feature = "tracing")]
            tracing::trace!(tag, offset = self.offset, "unknown header type, ending header block");
            return None;
        };

        let value = match header_type.fixed_len() {
            Some(len) => {
                self.take(len)?;
                None
            }
            None => {
                let len = self.read_u16()? as usize;
                let bytes = self.take(len)?;
                (header_type == HeaderType::String)
                    .then(|| String::from_utf8_lossy(bytes).into_owned())
            }
        };

        Some(HeaderEntry {
            name,
            header_type,
            value,
        })
    }
}

impl Iterator for HeaderEntries<'_> {
    type Item = HeaderEntry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }

        let entry = self.read_entry();
        if entry.is_none() {
            self.done = true;
            #[cfg(feature = "tracing")]
            tracing::trace!(
                offset = self.offset,
                len = self.data.len(),
                "header block ended early"
            );
        }
        entry
    }
}
