//! Streaming response driver
//!
//! Turns the raw byte stream of a chunked SSE response into a lazy,
//! pull-based sequence of typed chunks. Nothing is read ahead of consumer
//! demand beyond what a single inbound transport event delivers, and
//! dropping the sequence drops the underlying connection.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};
use crate::sse::FrameDecoder;

/// Terminal SSE payload sent by the provider after the last chunk
pub(crate) const DONE_SENTINEL: &str = "[DONE]";

/// Decode one SSE payload into a typed chunk
///
/// Returns `None` for the `[DONE]` sentinel and for payloads that fail JSON
/// decoding; a malformed frame is skipped, never fatal. Unknown fields are
/// tolerated so provider schema additions keep decoding.
pub(crate) fn normalize<T: DeserializeOwned>(data: &str) -> Option<T> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return None;
    }

    match serde_json::from_str(data) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!(error = %e, data, "skipping unparseable SSE payload");
            None
        }
    }
}

/// Internal driver state threaded through the unfold
struct Driver<S, T> {
    bytes: S,
    decoder: FrameDecoder,
    pending: VecDeque<T>,
    chunk_timeout: Duration,
    finished: bool,
}

/// Lazy sequence of typed chunks decoded from an SSE byte stream
///
/// Single-consumer and pull-based: the next transport event is awaited only
/// when the consumer asks for a chunk and none is pending from the previous
/// event. The stream ends cleanly on the `[DONE]` sentinel or end-of-body,
/// and ends in an error state on a transport failure or when no event
/// arrives within the configured chunk timeout. Exactly one item can be an
/// error, and it is always the last.
pub struct ChunkStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<T>> + Send>>,
}

impl<T> ChunkStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Drive `bytes` through the frame decoder and normalizer
    pub(crate) fn new<S>(bytes: S, chunk_timeout: Duration) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
    {
        let driver = Driver {
            bytes,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            chunk_timeout,
            finished: false,
        };

        let inner = stream::unfold(driver, |mut d| async move {
            loop {
                if let Some(chunk) = d.pending.pop_front() {
                    return Some((Ok(chunk), d));
                }
                if d.finished {
                    return None;
                }

                match tokio::time::timeout(d.chunk_timeout, d.bytes.next()).await {
                    Err(_) => {
                        d.finished = true;
                        return Some((
                            Err(ClientError::Stream(format!(
                                "no data received within {:?}",
                                d.chunk_timeout
                            ))),
                            d,
                        ));
                    }
                    // End-of-body without a sentinel: some providers close
                    // the connection instead, treat it as a clean end
                    Ok(None) => d.finished = true,
                    Ok(Some(Err(e))) => {
                        d.finished = true;
                        return Some((Err(e), d));
                    }
                    Ok(Some(Ok(buf))) => {
                        for frame in d.decoder.feed(&buf) {
                            if frame.data.trim() == DONE_SENTINEL {
                                d.finished = true;
                                break;
                            }
                            if let Some(chunk) = normalize::<T>(&frame.data) {
                                d.pending.push_back(chunk);
                            }
                        }
                    }
                }
            }
        });

        Self {
            inner: Box::pin(inner),
        }
    }
}

impl<T> Stream for ChunkStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DeltaChunk;

    fn byte_stream(
        parts: Vec<String>,
    ) -> impl Stream<Item = Result<Bytes>> + Send + Unpin + 'static {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from(p.into_bytes()))))
    }

    fn delta_event(content: &str) -> String {
        format!(
            "data: {{\"id\":\"c1\",\"model\":\"m\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n"
        )
    }

    #[test]
    fn missing_content_defaults_to_empty_string() {
        let chunk: DeltaChunk =
            normalize(r#"{"id":"c1","model":"m","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#)
                .unwrap();
        assert_eq!(chunk.choices[0].delta.content, "");
        assert_eq!(chunk.choices[0].delta.role.as_deref(), Some("assistant"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn sentinel_normalizes_to_none() {
        assert!(normalize::<DeltaChunk>("[DONE]").is_none());
        assert!(normalize::<DeltaChunk>(" [DONE] ").is_none());
    }

    #[test]
    fn malformed_payload_normalizes_to_none() {
        assert!(normalize::<DeltaChunk>("{not json").is_none());
    }

    #[test]
    fn finish_reason_passes_through() {
        let chunk: DeltaChunk =
            normalize(r#"{"id":"c1","model":"m","choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#)
                .unwrap();
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn chunks_arrive_in_frame_order_and_end_on_sentinel() {
        let body = format!(
            "{}{}{}data: [DONE]\n\ndata: after\n\n",
            delta_event("a"),
            delta_event("b"),
            delta_event("c")
        );

        let mut chunks =
            ChunkStream::<DeltaChunk>::new(byte_stream(vec![body]), Duration::from_secs(1));

        let mut contents = Vec::new();
        while let Some(item) = chunks.next().await {
            contents.push(item.unwrap().choices[0].delta.content.clone());
        }
        // Nothing after the sentinel is delivered
        assert_eq!(contents, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn frames_split_across_reads_are_reassembled() {
        let event = delta_event("hello");
        let (head, tail) = event.split_at(17);

        let mut chunks = ChunkStream::<DeltaChunk>::new(
            byte_stream(vec![
                head.to_owned(),
                tail.to_owned(),
                "data: [DONE]\n\n".to_owned(),
            ]),
            Duration::from_secs(1),
        );

        let first = chunks.next().await.unwrap().unwrap();
        assert_eq!(first.choices[0].delta.content, "hello");
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped_mid_stream() {
        let body = format!("data: {{oops\n\n{}data: [DONE]\n\n", delta_event("ok"));

        let mut chunks =
            ChunkStream::<DeltaChunk>::new(byte_stream(vec![body]), Duration::from_secs(1));

        let only = chunks.next().await.unwrap().unwrap();
        assert_eq!(only.choices[0].delta.content, "ok");
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn end_of_body_without_sentinel_ends_cleanly() {
        let mut chunks = ChunkStream::<DeltaChunk>::new(
            byte_stream(vec![delta_event("x")]),
            Duration::from_secs(1),
        );

        assert!(chunks.next().await.unwrap().is_ok());
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn silence_past_the_chunk_timeout_is_a_stream_error() {
        let mut chunks = ChunkStream::<DeltaChunk>::new(
            stream::pending::<Result<Bytes>>(),
            Duration::from_millis(20),
        );

        let err = chunks.next().await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Stream(_)));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream_in_error_state() {
        let parts: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from(delta_event("x").into_bytes())),
            Err(ClientError::Stream("connection reset".to_owned())),
        ];
        let mut chunks =
            ChunkStream::<DeltaChunk>::new(stream::iter(parts), Duration::from_secs(1));

        assert!(chunks.next().await.unwrap().is_ok());
        assert!(chunks.next().await.unwrap().is_err());
        assert!(chunks.next().await.is_none());
    }
}
