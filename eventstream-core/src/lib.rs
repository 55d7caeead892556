//! Core decoding types for the binary event stream format.
//!
//! This crate provides the synchronous half of the decoder, shared by the
//! streaming adapter in `eventstream-client`.
//!
//! ## Modules
//!
//! - [`error`]: Frame decoding errors
//! - [`headers`]: Tagged header-block decoding
//! - [`frame`]: Prelude parsing and single-frame decoding
//! - [`message`]: Decoded messages, payloads and well-known header lookup
//! - [`checksum`]: CRC32 helpers for the prelude and message trailer

mod checksum;
mod error;
mod frame;
mod headers;
mod message;

pub use checksum::*;
pub use error::*;
pub use frame::*;
pub use headers::*;
pub use message::*;
