//! HTTP response body adapter.
//!
//! This module provides [`body_to_stream`], which turns any
//! [`http_body::Body`] into the chunked byte source a
//! [`StreamDecoder`](crate::StreamDecoder) consumes.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body::Body;
use http_body_util::BodyExt;

use crate::config::DecoderConfig;
use crate::decoder::StreamDecoder;
use crate::error::StreamError;

/// Convert a response body into a stream of data chunks.
///
/// Trailer frames and empty chunks are skipped. Body errors become
/// [`StreamError::Transport`].
pub fn body_to_stream<B>(body: B) -> impl Stream<Item = Result<Bytes, StreamError>> + Unpin
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    Box::pin(
        futures::stream::unfold(body, |mut body| async move {
            let item = match body.frame().await? {
                // trailers become an empty chunk
                Ok(frame) => Ok(frame.into_data().unwrap_or_default()),
                Err(e) => Err(StreamError::Transport(format!("body error: {}", e))),
            };
            Some((item, body))
        })
        .filter(|item| futures::future::ready(!matches!(item, Ok(data) if data.is_empty()))),
    )
}

/// Decode the frames carried by a response body.
///
/// # Example
///
/// ```ignore
/// use eventstream_client::{DecoderConfig, decode_body};
/// use futures::StreamExt;
///
/// let response = client.request(request).await?;
/// let mut messages = decode_body(response.into_body(), DecoderConfig::default());
///
/// while let Some(message) = messages.next().await {
///     let info = eventstream_core::EventInfo::from(message?);
///     println!("{:?}", info.event_type);
/// }
/// ```
pub fn decode_body<B>(
    body: B,
    config: DecoderConfig,
) -> StreamDecoder<impl Stream<Item = Result<Bytes, StreamError>> + Unpin>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    StreamDecoder::with_config(body_to_stream(body), config)
}
