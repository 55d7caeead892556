//! Incremental frame decoding over a chunked byte source.
//!
//! This module provides [`StreamDecoder`]: a stream adapter that buffers
//! chunks from a byte source, splits complete frames off the front of the
//! buffer, and yields decoded [`Message`]s in arrival order.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use eventstream_core::{FrameError, Message, Prelude, decode_message, decode_message_verified};
use futures::Stream;

use crate::config::DecoderConfig;
use crate::error::StreamError;

/// Stream adapter that decodes event stream frames.
///
/// Wraps a byte stream (for example a response body, see
/// [`body_to_stream`](crate::body_to_stream)) and yields one [`Message`] per
/// frame. Chunk boundaries do not need to line up with frame boundaries.
///
/// # Frame Format
///
/// ```text
/// [total_length:4][header_block_length:4][prelude_crc:4][headers][payload][message_crc:4]
/// ```
///
/// # Source lifetime
///
/// The decoder owns its source and drops it exactly once: when the source is
/// exhausted, when the stream yields an error, or when the decoder itself is
/// dropped. Stopping iteration early releases the source with the decoder.
///
/// # Example
///
/// ```ignore
/// use eventstream_client::StreamDecoder;
/// use futures::StreamExt;
///
/// let mut decoder = StreamDecoder::new(byte_stream);
///
/// while let Some(result) = decoder.next().await {
///     let message = result?;
///     println!("{:?}: {:?}", message.header(":event-type"), message.payload());
/// }
/// ```
pub struct StreamDecoder<S> {
    /// The underlying byte source, `None` once released.
    source: Option<S>,
    /// Buffer for incomplete frames.
    buffer: BytesMut,
    /// Decoding options.
    config: DecoderConfig,
    /// Whether the stream has finished (source ended or error).
    finished: bool,
}

impl<S> StreamDecoder<S> {
    /// Create a decoder with the default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Create a decoder with the given configuration.
    pub fn with_config(source: S, config: DecoderConfig) -> Self {
        Self {
            source: Some(source),
            buffer: BytesMut::with_capacity(config.initial_capacity),
            config,
            finished: false,
        }
    }

    /// Get the decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Check if the stream has finished.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Release the source and discard buffered bytes.
    ///
    /// Returns the number of bytes discarded.
    fn finish(&mut self) -> usize {
        self.finished = true;
        self.source = None;
        let remaining = self.buffer.len();
        self.buffer = BytesMut::new();
        remaining
    }

    /// Try to split a complete frame off the buffer and decode it.
    ///
    /// Frames shorter than a prelude plus trailer are consumed and skipped.
    ///
    /// Returns:
    /// - `Ok(Some(message))` if a complete frame was decoded
    /// - `Ok(None)` if more data is needed
    /// - `Err(e)` if the frame cannot be consumed
    fn try_parse_frame(&mut self) -> Result<Option<Message>, FrameError> {
        loop {
            // Need at least the prelude
            let Some(prelude) = Prelude::parse(&self.buffer) else {
                return Ok(None);
            };

            // A zero length would never advance the buffer
            prelude.validate()?;
            if let Some(max) = self.config.max_frame_size {
                if prelude.total_length > max {
                    return Err(FrameError::FrameTooLarge {
                        total_length: prelude.total_length,
                        max,
                    });
                }
            }

            let frame_size = prelude.total_length as usize;
            if self.buffer.len() < frame_size {
                return Ok(None);
            }

            let frame = self.buffer.split_to(frame_size);
            if prelude.is_undersized() {
                #[cfg(feature = "tracing")]
                tracing::trace!(total_length = prelude.total_length, "skipped undersized frame");
                continue;
            }

            return if self.config.verify_checksums {
                decode_message_verified(&frame)
            } else {
                decode_message(&frame)
            };
        }
    }
}

/// Decode frames from `source` with the default configuration.
///
/// Each call builds a fresh decoder with its own empty buffer.
pub fn decode_stream<S>(source: S) -> StreamDecoder<S> {
    StreamDecoder::new(source)
}

impl<S, B, E> Stream for StreamDecoder<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<StreamError>,
{
    type Item = Result<Message, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            match this.try_parse_frame() {
                Ok(Some(message)) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        total_length = message.total_length(),
                        headers = message.headers().len(),
                        "decoded frame"
                    );
                    return Poll::Ready(Some(Ok(message)));
                }
                Ok(None) => {
                    // Need more data, poll the source
                }
                Err(e) => {
                    this.finish();
                    return Poll::Ready(Some(Err(e.into())));
                }
            }

            let Some(source) = this.source.as_mut() else {
                this.finish();
                return Poll::Ready(None);
            };

            match Pin::new(source).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.buffer.extend_from_slice(chunk.as_ref());
                }
                Poll::Ready(Some(Err(e))) => {
                    let err: StreamError = e.into();
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %err, "byte source failed");
                    this.finish();
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    let remaining = this.finish();
                    if remaining == 0 {
                        return Poll::Ready(None);
                    }

                    #[cfg(feature = "tracing")]
                    tracing::debug!(remaining, "source ended with a partial frame");
                    if this.config.strict_trailing_data {
                        return Poll::Ready(Some(Err(StreamError::IncompleteTrailingData {
                            remaining,
                        })));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use eventstream_core::{HeaderType, Payload};
    use futures::channel::mpsc;
    use futures::{FutureExt, StreamExt, stream};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Helper to create a frame with string headers and valid checksums
    fn make_frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
        let mut block = Vec::new();
        for (name, value) in headers {
            block.push(name.len() as u8);
            block.extend_from_slice(name.as_bytes());
            block.push(HeaderType::String.tag());
            block.extend_from_slice(&(value.len() as u16).to_be_bytes());
            block.extend_from_slice(value.as_bytes());
        }

        let total = (12 + block.len() + payload.len() + 4) as u32;
        let mut frame = Vec::new();
        frame.extend_from_slice(&total.to_be_bytes());
        frame.extend_from_slice(&(block.len() as u32).to_be_bytes());
        let crc = crc32fast::hash(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());
        frame.extend_from_slice(&block);
        frame.extend_from_slice(payload);
        let crc = crc32fast::hash(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());
        frame
    }

    fn chunks(data: &[u8], size: usize) -> Vec<Result<Bytes, StreamError>> {
        data.chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect()
    }

    /// Source that records when it is dropped.
    struct TrackedSource<S> {
        inner: S,
        released: Arc<AtomicBool>,
    }

    impl<S> TrackedSource<S> {
        fn new(inner: S) -> (Self, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            (
                Self {
                    inner,
                    released: released.clone(),
                },
                released,
            )
        }
    }

    impl<S> Drop for TrackedSource<S> {
        fn drop(&mut self) {
            assert!(!self.released.swap(true, Ordering::SeqCst), "released twice");
        }
    }

    impl<S: Stream + Unpin> Stream for TrackedSource<S> {
        type Item = S::Item;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
            Pin::new(&mut self.inner).poll_next(cx)
        }
    }

    #[tokio::test]
    async fn test_decode_single_frame() {
        let frame = make_frame(&[(":event-type", "chunk")], br#"{"a":1}"#);
        let source = stream::iter(vec![Ok::<_, StreamError>(Bytes::from(frame.clone()))]);
        let mut decoder = StreamDecoder::new(source);

        let message = decoder.next().await.unwrap().unwrap();
        assert_eq!(message, decode_message(&frame).unwrap().unwrap());
        assert_eq!(message.header(":event-type"), Some("chunk"));

        assert!(decoder.next().await.is_none());
        assert!(decoder.is_finished());
    }

    #[tokio::test]
    async fn test_decode_multiple_frames_in_one_chunk() {
        let mut data = make_frame(&[], b"1");
        data.extend(make_frame(&[], b"2"));
        data.extend(make_frame(&[], b"3"));

        let source = stream::iter(vec![Ok::<_, StreamError>(data)]);
        let payloads: Vec<_> = StreamDecoder::new(source)
            .map(|r| r.unwrap().payload().as_json().cloned().unwrap())
            .collect()
            .await;

        let expected: Vec<serde_json::Value> = vec![1.into(), 2.into(), 3.into()];
        assert_eq!(payloads, expected);
    }

    #[tokio::test]
    async fn test_chunked_data() {
        // Split frames across chunks of every small size
        let mut data = make_frame(&[("k", "v")], br#"{"x":1}"#);
        data.extend(make_frame(&[("k", "w")], &[0xFF, 0x00]));

        let expected: Vec<_> = StreamDecoder::new(stream::iter(chunks(&data, data.len())))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(expected.len(), 2);

        for size in 1..=13 {
            let decoded: Vec<_> = StreamDecoder::new(stream::iter(chunks(&data, size)))
                .map(Result::unwrap)
                .collect()
                .await;
            assert_eq!(decoded, expected, "chunk size {}", size);
        }
    }

    #[tokio::test]
    async fn test_frame_waits_for_remaining_bytes() {
        let frame = make_frame(&[("k", "v")], b"{}");
        let (tx, rx) = mpsc::unbounded::<Result<Bytes, StreamError>>();
        let mut decoder = StreamDecoder::new(rx);

        tx.unbounded_send(Ok(Bytes::copy_from_slice(&frame[..frame.len() - 2])))
            .unwrap();
        assert!(decoder.next().now_or_never().is_none());
        assert_eq!(decoder.buffered_len(), frame.len() - 2);

        tx.unbounded_send(Ok(Bytes::copy_from_slice(&frame[frame.len() - 2..])))
            .unwrap();
        let message = decoder.next().await.unwrap().unwrap();
        assert_eq!(message.header("k"), Some("v"));
        assert_eq!(decoder.buffered_len(), 0);

        drop(tx);
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn test_trailing_partial_frame_is_dropped() {
        let mut data = make_frame(&[], b"1");
        data.extend_from_slice(&[0, 0, 0, 40, 0]);

        let source = stream::iter(vec![Ok::<_, StreamError>(Bytes::from(data))]);
        let mut decoder = StreamDecoder::new(source);

        assert!(decoder.next().await.unwrap().is_ok());
        assert!(decoder.next().await.is_none());
        assert_eq!(decoder.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_strict_trailing_data() {
        let mut data = make_frame(&[], b"1");
        data.extend_from_slice(&[0, 0, 0, 40, 0]);

        let source = stream::iter(vec![Ok::<_, StreamError>(Bytes::from(data))]);
        let config = DecoderConfig::new().strict_trailing_data(true);
        let mut decoder = StreamDecoder::with_config(source, config);

        assert!(decoder.next().await.unwrap().is_ok());
        let err = decoder.next().await.unwrap().unwrap_err();
        assert_eq!(err, StreamError::IncompleteTrailingData { remaining: 5 });
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn test_strict_mode_clean_end() {
        let source = stream::iter(vec![Ok::<_, StreamError>(make_frame(&[], b""))]);
        let config = DecoderConfig::new().strict_trailing_data(true);
        let mut decoder = StreamDecoder::with_config(source, config);

        let message = decoder.next().await.unwrap().unwrap();
        assert_eq!(message.payload(), &Payload::Empty);
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let frame = make_frame(&[], b"1");
        let (source, released) = TrackedSource::new(stream::iter(vec![
            Ok(Bytes::from(frame)),
            Err(StreamError::Transport("connection reset".into())),
            Ok(Bytes::from(make_frame(&[], b"2"))),
        ]));
        let mut decoder = StreamDecoder::new(source);

        assert!(decoder.next().await.unwrap().is_ok());
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(err.is_transport());
        assert!(released.load(Ordering::SeqCst));

        // No frames after the error
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn test_source_released_on_exhaustion() {
        let (source, released) =
            TrackedSource::new(stream::iter(chunks(&make_frame(&[], b"1"), 4)));
        let mut decoder = StreamDecoder::new(source);

        assert!(decoder.next().await.unwrap().is_ok());
        assert!(!released.load(Ordering::SeqCst));
        assert!(decoder.next().await.is_none());
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_source_released_on_early_drop() {
        let mut data = make_frame(&[], b"1");
        data.extend(make_frame(&[], b"2"));
        let (source, released) = TrackedSource::new(stream::iter(chunks(&data, 3)));
        let mut decoder = StreamDecoder::new(source);

        assert!(decoder.next().await.unwrap().is_ok());
        assert!(!released.load(Ordering::SeqCst));

        drop(decoder);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_zero_length_ends_stream() {
        let mut data = vec![0u8; 12];
        data.extend(make_frame(&[], b"1"));
        let (source, released) =
            TrackedSource::new(stream::iter(vec![Ok::<_, StreamError>(Bytes::from(data))]));
        let mut decoder = StreamDecoder::new(source);

        let err = decoder.next().await.unwrap().unwrap_err();
        assert_eq!(
            err.frame_error(),
            Some(&FrameError::InvalidLength { total_length: 0 })
        );
        assert!(released.load(Ordering::SeqCst));
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn test_undersized_frame_is_skipped() {
        // 14 declared bytes: a prelude and two stray bytes, no trailer
        let mut data = 14u32.to_be_bytes().to_vec();
        data.extend_from_slice(&[0; 10]);
        data.extend(make_frame(&[], br#"{"x":1}"#));

        for size in [1, 5, data.len()] {
            let messages: Vec<_> = StreamDecoder::new(stream::iter(chunks(&data, size)))
                .map(Result::unwrap)
                .collect()
                .await;
            assert_eq!(messages.len(), 1, "chunk size {}", size);
            assert_eq!(messages[0].payload().as_json().unwrap()["x"], 1);
        }
    }

    #[tokio::test]
    async fn test_tiny_lengths_are_skipped() {
        // lengths below the prelude size still consume their bytes
        let mut data = vec![0, 0, 0, 8, 0xAA, 0xBB, 0xCC, 0xDD];
        data.extend(make_frame(&[("k", "v")], b"2"));

        let messages: Vec<_> = StreamDecoder::new(stream::iter(chunks(&data, 3)))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].header("k"), Some("v"));
    }

    #[tokio::test]
    async fn test_header_block_overflow_is_clamped() {
        let mut bad = make_frame(&[], b"abcd");
        assert_eq!(bad.len(), 20);
        bad[4..8].copy_from_slice(&10u32.to_be_bytes());

        let mut data = bad;
        data.extend(make_frame(&[], br#"{"x":1}"#));

        let messages: Vec<_> = StreamDecoder::new(stream::iter(vec![Ok::<_, StreamError>(data)]))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].payload(), &Payload::Empty);
        assert_eq!(messages[0].total_length(), 20);
        assert_eq!(messages[1].payload().as_json().unwrap()["x"], 1);
    }

    #[tokio::test]
    async fn test_max_frame_size() {
        let frame = make_frame(&[], &[b'a'; 100]);
        // only the prelude has arrived
        let source = stream::iter(vec![Ok::<_, StreamError>(Bytes::copy_from_slice(
            &frame[..12],
        ))]);
        let config = DecoderConfig::new().max_frame_size(64);
        let mut decoder = StreamDecoder::with_config(source, config);

        let err = decoder.next().await.unwrap().unwrap_err();
        assert_eq!(
            err,
            StreamError::Frame(FrameError::FrameTooLarge {
                total_length: 116,
                max: 64,
            })
        );
    }

    #[tokio::test]
    async fn test_verify_checksums() {
        let good = make_frame(&[], b"1");
        let mut bad = make_frame(&[], b"2");
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;

        let mut data = good.clone();
        data.extend(bad.clone());

        // skipped by default
        let lenient: Vec<_> = StreamDecoder::new(stream::iter(vec![Ok::<_, StreamError>(
            data.clone(),
        )]))
        .collect()
        .await;
        assert_eq!(lenient.len(), 2);
        assert!(lenient.iter().all(Result::is_ok));

        let config = DecoderConfig::new().verify_checksums(true);
        let mut decoder =
            StreamDecoder::with_config(stream::iter(vec![Ok::<_, StreamError>(data)]), config);
        assert!(decoder.next().await.unwrap().is_ok());
        let err = decoder.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err.frame_error(),
            Some(FrameError::MessageChecksum { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_source() {
        let source = stream::iter(Vec::<Result<Bytes, StreamError>>::new());
        let mut decoder = decode_stream(source);
        assert!(decoder.next().await.is_none());
        assert!(decoder.is_finished());
    }

    #[tokio::test]
    async fn test_io_error_source() {
        let source = stream::iter(vec![
            Ok(b"\x00\x00".to_vec()),
            Err(std::io::Error::other("broken pipe")),
        ]);
        let mut decoder = StreamDecoder::new(source);

        let err = decoder.next().await.unwrap().unwrap_err();
        assert_eq!(err, StreamError::Transport("broken pipe".into()));
    }
}
