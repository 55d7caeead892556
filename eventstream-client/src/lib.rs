//! Streaming decoder for binary event streams.
//!
//! This crate turns a chunked byte source, such as a streaming HTTP response
//! body, into a stream of decoded event messages. Frame and header-block
//! decoding live in `eventstream-core`; this crate adds the incremental
//! buffering on top.
//!
//! ## Features
//!
//! - Chunk-boundary independent decoding of length-prefixed frames
//! - JSON payloads parsed automatically, other payloads kept as raw bytes
//! - Optional CRC32 verification of prelude and message checksums
//! - Optional reporting of partial frames left when the source ends
//! - Adapter for any [`http_body::Body`]
//!
//! ## Example
//!
//! ```ignore
//! use eventstream_client::{StreamDecoder, EventInfo};
//! use futures::StreamExt;
//!
//! let mut decoder = StreamDecoder::new(byte_stream);
//!
//! while let Some(result) = decoder.next().await {
//!     let info = EventInfo::from(result?);
//!     match info.event_type.as_deref() {
//!         Some("chunk") => println!("{:?}", info.payload),
//!         other => println!("ignoring {:?}", other),
//!     }
//! }
//! ```
//!
//! ## Cancellation
//!
//! Dropping a [`StreamDecoder`] drops its source. There are no internal
//! timeouts; wrap `next()` in `tokio::time::timeout` (or similar) to bound
//! the wait for the next chunk.
//!
//! ## Tracing
//!
//! Enable the `tracing` feature to log emitted frames, dropped trailing bytes
//! and source failures.

mod body;
mod config;
mod decoder;
mod error;

pub use body::{body_to_stream, decode_body};
pub use config::{DEFAULT_INITIAL_CAPACITY, DecoderConfig};
pub use decoder::{StreamDecoder, decode_stream};
pub use error::StreamError;

// Re-export core types
pub use eventstream_core::{
    EventInfo, FrameError, HeaderType, Headers, Message, Payload, extract_event_info,
};
