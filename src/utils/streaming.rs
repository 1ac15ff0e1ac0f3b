//! Paced streaming of a completed answer.
//!
//! The text being streamed already exists in full; [`StreamSession`] cuts it
//! into word tokens and releases them on a fixed cadence so a subscriber sees
//! the answer build up. [`paced`] adds a second, independent delay in front of
//! every chunk a subscriber receives.

use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::convert::Infallible;
use tokio::time::{sleep, Duration};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

/// Chunk sent before any answer text
pub const PROCESSING_NOTICE: &str = "Processing your request...";

/// Terminal marker on normal completion
pub const DONE_MARKER: &str = "[DONE]";

/// Terminal marker after an error chunk
pub const ERROR_MARKER: &str = "[ERROR]";

/// One unit delivered to a stream subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Initial "processing started" notice
    Notice,
    /// Word token, with a leading space after the first
    Token(String),
    /// Error message emitted in-band
    Error(String),
    /// Normal end of stream
    Done,
    /// End of stream after an error
    ErrorEnd,
}

impl StreamChunk {
    /// Text carried by this chunk
    pub fn text(&self) -> String {
        match self {
            StreamChunk::Notice => PROCESSING_NOTICE.to_string(),
            StreamChunk::Token(token) => token.clone(),
            StreamChunk::Error(message) => format!("Error: {}", message),
            StreamChunk::Done => DONE_MARKER.to_string(),
            StreamChunk::ErrorEnd => ERROR_MARKER.to_string(),
        }
    }

    /// Frame as `data: <chunk>\n\n`
    pub fn frame(&self) -> String {
        format!("data: {}\n\n", self.text())
    }

    /// Whether this chunk ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Done | StreamChunk::ErrorEnd)
    }
}

/// Lifecycle of a [`StreamSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Tokens are being emitted
    Open,
    /// Tokens exhausted, terminal marker pending
    Draining,
    /// Nothing more will be emitted
    Closed,
}

/// Cancels a [`StreamSession`] from outside, e.g. when its subscriber leaves.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a handle that is not yet cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Guard that requests cancellation when dropped
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

/// Split text into word tokens, prefixing every token after the first with a
/// single space.
///
/// Runs of whitespace collapse to one space, so the original spacing is not
/// reproduced exactly.
pub fn tokenize(text: &str) -> VecDeque<String> {
    text.split_whitespace()
        .enumerate()
        .map(|(index, word)| {
            if index == 0 {
                word.to_string()
            } else {
                format!(" {}", word)
            }
        })
        .collect()
}

/// A finite, non-restartable pacing of one completed text.
///
/// `emit_next` yields tokens in order, then a single [`StreamChunk::Done`],
/// then `None` forever. After cancellation it yields `None` and never the
/// terminal marker.
#[derive(Debug)]
pub struct StreamSession {
    tokens: VecDeque<String>,
    emitted: usize,
    state: StreamState,
    token_delay: Duration,
    cancel: CancelHandle,
}

impl StreamSession {
    /// Start a session over `full_text`
    pub fn start(full_text: &str, token_delay: Duration) -> Self {
        Self::with_cancel(full_text, token_delay, CancelHandle::new())
    }

    /// Start a session that stops when `cancel` fires
    pub fn with_cancel(full_text: &str, token_delay: Duration, cancel: CancelHandle) -> Self {
        let tokens = tokenize(full_text);
        debug!("Streaming session started with {} tokens", tokens.len());

        Self {
            tokens,
            emitted: 0,
            state: StreamState::Open,
            token_delay,
            cancel,
        }
    }

    /// Current state
    pub fn state(&self) -> StreamState {
        if self.cancel.is_cancelled() {
            StreamState::Closed
        } else {
            self.state
        }
    }

    /// Number of tokens emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of tokens not yet emitted
    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }

    /// Handle that cancels this session
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Stop the session without emitting the terminal marker
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.state = StreamState::Closed;
        self.tokens.clear();
    }

    /// Emit the next chunk, waiting out the token cadence first.
    ///
    /// The first token goes out immediately; each later token and the
    /// terminal marker follow the previous token by `token_delay`.
    pub async fn emit_next(&mut self) -> Option<StreamChunk> {
        if self.state() == StreamState::Closed {
            self.state = StreamState::Closed;
            return None;
        }

        if self.tokens.is_empty() {
            self.state = StreamState::Draining;
        }

        if self.emitted > 0 && !self.wait(self.token_delay).await {
            self.cancel();
            return None;
        }

        match self.state {
            StreamState::Open => {
                let token = self.tokens.pop_front()?;
                self.emitted += 1;
                Some(StreamChunk::Token(token))
            }
            StreamState::Draining => {
                self.state = StreamState::Closed;
                Some(StreamChunk::Done)
            }
            StreamState::Closed => None,
        }
    }

    /// Drain the session into a stream of chunks
    pub fn into_stream(self) -> impl Stream<Item = StreamChunk> {
        futures_util::stream::unfold(self, |mut session| async move {
            session.emit_next().await.map(|chunk| (chunk, session))
        })
    }

    /// Sleep unless cancelled first; false means cancelled
    async fn wait(&self, delay: Duration) -> bool {
        if delay.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(delay) => true,
        }
    }
}

/// Delay every item of `stream` by `delay` before handing it on.
///
/// Stops early, without yielding anything further, once `cancel` fires.
pub fn paced<S>(stream: S, delay: Duration, cancel: CancelHandle) -> impl Stream<Item = S::Item>
where
    S: Stream,
{
    async_stream::stream! {
        futures_util::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            if !delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(delay) => {}
                }
            }
            if cancel.is_cancelled() {
                break;
            }
            yield item;
        }
    }
}

/// Render chunks as `data:` frames for a response body.
///
/// The returned stream owns a guard on `cancel`: dropping it, as a server
/// does when the subscriber disconnects, cancels the session feeding it.
pub fn into_frames<S>(
    chunks: S,
    cancel: &CancelHandle,
) -> impl Stream<Item = Result<String, Infallible>>
where
    S: Stream<Item = StreamChunk>,
{
    let guard = cancel.drop_guard();
    chunks.map(move |chunk| {
        let _guard = &guard;
        Ok::<_, Infallible>(chunk.frame())
    })
}
