//! Decoder configuration.
//!
//! This module provides [`DecoderConfig`] for tuning a
//! [`StreamDecoder`](crate::StreamDecoder). The defaults match the lenient
//! behavior of the wire format's reference decoders: checksums are skipped,
//! trailing partial data is dropped silently and frames have no size limit.

/// Default initial capacity of the frame buffer.
pub const DEFAULT_INITIAL_CAPACITY: usize = 8 * 1024;

/// Options for a [`StreamDecoder`](crate::StreamDecoder).
///
/// # Example
///
/// ```
/// use eventstream_client::DecoderConfig;
///
/// let config = DecoderConfig::new()
///     .verify_checksums(true)
///     .strict_trailing_data(true)
///     .max_frame_size(16 * 1024 * 1024);
///
/// assert!(config.get_verify_checksums());
/// assert_eq!(config.get_max_frame_size(), Some(16 * 1024 * 1024));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    pub(crate) verify_checksums: bool,
    pub(crate) strict_trailing_data: bool,
    pub(crate) max_frame_size: Option<u32>,
    pub(crate) initial_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            strict_trailing_data: false,
            max_frame_size: None,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl DecoderConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the prelude and message CRC32 of every frame.
    ///
    /// A mismatch ends the stream with a
    /// [`FrameError`](eventstream_core::FrameError).
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Report bytes left over when the source ends mid-frame.
    ///
    /// When enabled, the stream yields
    /// [`StreamError::IncompleteTrailingData`](crate::StreamError::IncompleteTrailingData)
    /// before ending. When disabled, the bytes are dropped.
    pub fn strict_trailing_data(mut self, enabled: bool) -> Self {
        self.strict_trailing_data = enabled;
        self
    }

    /// Reject frames whose declared length exceeds `max` bytes.
    ///
    /// The check runs on the prelude, before the rest of the frame is
    /// buffered.
    pub fn max_frame_size(mut self, max: u32) -> Self {
        self.max_frame_size = Some(max);
        self
    }

    /// Initial capacity of the frame buffer. The buffer grows as needed.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Whether checksums are verified.
    pub fn get_verify_checksums(&self) -> bool {
        self.verify_checksums
    }

    /// Whether trailing partial data is reported.
    pub fn get_strict_trailing_data(&self) -> bool {
        self.strict_trailing_data
    }

    /// Get the frame size limit, if any.
    pub fn get_max_frame_size(&self) -> Option<u32> {
        self.max_frame_size
    }

    /// Get the initial buffer capacity.
    pub fn get_initial_capacity(&self) -> usize {
        self.initial_capacity
    }
}
