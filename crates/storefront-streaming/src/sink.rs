//! Live response sink.

use std::fmt::{self, Display};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::{mpsc, oneshot};
use futures::{Sink, SinkExt, Stream, StreamExt};
use http::{HeaderMap, StatusCode};
use storefront_core::TimingContext;

use crate::error::SinkError;

type ByteSink = Pin<Box<dyn Sink<Vec<u8>, Error = SinkError> + Send>>;

/// Status and headers of a streamed response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHead {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Head with the given status and no headers.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

/// State of the response sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Nothing written yet.
    Initial,
    /// Head written, body chunks may follow.
    Streaming,
    /// Sink closed, the response is complete.
    Closed,
}

/// Live response sink handed to a streaming entrypoint.
///
/// Ownership moves to the entrypoint at dispatch time; the entrypoint
/// writes the head and body chunks on its own schedule and signals
/// completion with [`ResponseSink::close`].
pub struct ResponseSink {
    inner: ByteSink,
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    state: SinkState,
    timing: TimingContext,
    chunks_sent: usize,
    bytes_sent: usize,
}

impl ResponseSink {
    /// Wrap any byte sink. The head is tracked but not transmitted.
    pub fn from_sink<S>(sink: S) -> Self
    where
        S: Sink<Vec<u8>> + Send + 'static,
        S::Error: Display,
    {
        Self {
            inner: Box::pin(sink.sink_map_err(|e| SinkError::Transport(e.to_string()))),
            head_tx: None,
            state: SinkState::Initial,
            timing: TimingContext::new(),
            chunks_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Create a channel-backed sink and the body the server adapter reads.
    ///
    /// `buffer` bounds the number of in-flight chunks.
    pub fn channel(buffer: usize) -> (Self, StreamingBody) {
        let (head_tx, head_rx) = oneshot::channel();
        let (chunk_tx, chunk_rx) = mpsc::channel(buffer);

        let mut sink = Self::from_sink(chunk_tx);
        sink.head_tx = Some(head_tx);

        let body = StreamingBody {
            head: Some(head_rx),
            chunks: chunk_rx,
        };
        (sink, body)
    }

    /// Write status and headers. Must precede any body chunk.
    pub fn write_head(&mut self, head: ResponseHead) -> Result<(), SinkError> {
        match self.state {
            SinkState::Initial => {}
            SinkState::Streaming => return Err(SinkError::HeadAlreadyWritten),
            SinkState::Closed => return Err(SinkError::Closed),
        }

        if let Some(tx) = self.head_tx.take() {
            // The reader may already be gone; the body write will surface that.
            let _ = tx.send(head);
        }
        self.timing.mark("head_sent");
        self.state = SinkState::Streaming;
        Ok(())
    }

    /// Write a body chunk. A default `200` head is written first if none was.
    pub async fn write(&mut self, chunk: impl Into<Vec<u8>>) -> Result<(), SinkError> {
        if self.state == SinkState::Initial {
            self.write_head(ResponseHead::default())?;
        }
        if self.state == SinkState::Closed {
            return Err(SinkError::Closed);
        }

        let chunk = chunk.into();
        let len = chunk.len();
        self.inner.send(chunk).await?;

        if self.chunks_sent == 0 {
            self.timing.mark("first_chunk_sent");
        }
        self.chunks_sent += 1;
        self.bytes_sent += len;
        Ok(())
    }

    /// Complete the response.
    pub async fn close(&mut self) -> Result<(), SinkError> {
        if self.state == SinkState::Closed {
            return Err(SinkError::Closed);
        }

        self.state = SinkState::Closed;
        self.head_tx = None;
        self.inner.close().await?;
        self.timing.mark("closed");
        Ok(())
    }

    /// Check if the head was written.
    pub fn head_written(&self) -> bool {
        self.state != SinkState::Initial
    }

    /// Check if the sink was closed.
    pub fn is_closed(&self) -> bool {
        self.state == SinkState::Closed
    }

    /// Number of body chunks written.
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// Number of body bytes written.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }
}

impl fmt::Debug for ResponseSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSink")
            .field("state", &self.state)
            .field("chunks_sent", &self.chunks_sent)
            .field("bytes_sent", &self.bytes_sent)
            .finish()
    }
}

/// Receiving half of a channel-backed [`ResponseSink`].
#[derive(Debug)]
pub struct StreamingBody {
    head: Option<oneshot::Receiver<ResponseHead>>,
    chunks: mpsc::Receiver<Vec<u8>>,
}

impl StreamingBody {
    /// Wait for the response head. `None` if the sink was dropped or closed
    /// without writing one, or if the head was already taken.
    pub async fn head(&mut self) -> Option<ResponseHead> {
        let rx = self.head.take()?;
        rx.await.ok()
    }

    /// Read the whole response: head first, then every chunk until the sink
    /// closes.
    pub async fn collect(mut self) -> (Option<ResponseHead>, Vec<u8>) {
        let head = self.head().await;
        let mut body = Vec::new();
        while let Some(chunk) = self.chunks.next().await {
            body.extend_from_slice(&chunk);
        }
        (head, body)
    }
}

impl Stream for StreamingBody {
    type Item = Vec<u8>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.chunks.poll_next_unpin(cx)
    }
}
