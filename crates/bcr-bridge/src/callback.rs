//! Host callback channel.
//!
//! Each request carries a [`CallbackContext`]. Most actions answer once; a
//! `read` request keeps its context alive and answers repeatedly, flagging
//! each result with `keep_callback` until a final result closes it. The host
//! side consumes answers through a [`ResponseStream`].
//!
//! # Examples
//!
//! ```
//! use bcr_bridge::callback::CallbackContext;
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (callback, mut responses) = CallbackContext::channel();
//! callback.error("Init Failed");
//!
//! let result = responses.next().await.unwrap();
//! assert_eq!(result.message(), Some("Init Failed"));
//! assert!(responses.next().await.is_none());
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outcome of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

/// Body of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    Message(String),
}

/// A single response delivered to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginResult {
    pub status: Status,
    pub payload: Payload,
    /// Whether the host must keep listening on this callback.
    pub keep_callback: bool,
}

impl PluginResult {
    /// Empty success.
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            payload: Payload::Empty,
            keep_callback: false,
        }
    }

    /// Success carrying a JSON body.
    pub fn ok_json(value: Value) -> Self {
        Self {
            status: Status::Ok,
            payload: Payload::Json(value),
            keep_callback: false,
        }
    }

    /// Failure carrying a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            payload: Payload::Message(message.into()),
            keep_callback: false,
        }
    }

    pub fn with_keep_callback(mut self, keep: bool) -> Self {
        self.keep_callback = keep;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// JSON body, if any.
    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Message body, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            Payload::Message(message) => Some(message),
            _ => None,
        }
    }
}

/// Sending side of a request's callback.
///
/// Clones share the same callback. Once a result without `keep_callback`
/// has been sent the callback is finished and later sends are dropped.
#[derive(Debug, Clone)]
pub struct CallbackContext {
    tx: mpsc::UnboundedSender<PluginResult>,
    finished: Arc<AtomicBool>,
}

impl CallbackContext {
    /// Create a callback and the stream its results arrive on.
    pub fn channel() -> (Self, ResponseStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let context = Self {
            tx,
            finished: Arc::new(AtomicBool::new(false)),
        };
        (context, ResponseStream { rx, done: false })
    }

    /// Deliver `result`. Returns `false` if it was dropped.
    pub fn send(&self, result: PluginResult) -> bool {
        if !result.keep_callback {
            if self.finished.swap(true, Ordering::SeqCst) {
                warn!(?result, "Attempted to send a second final callback");
                return false;
            }
        } else if self.finished.load(Ordering::SeqCst) {
            warn!(?result, "Attempted to send on a finished callback");
            return false;
        }

        if self.tx.send(result).is_err() {
            debug!("Host dropped the callback receiver");
            return false;
        }
        true
    }

    /// Final empty success.
    pub fn success(&self) -> bool {
        self.send(PluginResult::ok())
    }

    /// Final success with a JSON body.
    pub fn success_with(&self, value: Value) -> bool {
        self.send(PluginResult::ok_json(value))
    }

    /// Final failure.
    pub fn error(&self, message: impl Into<String>) -> bool {
        self.send(PluginResult::error(message))
    }

    /// Whether a final result was sent.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Receiving side of a request's callback.
///
/// Yields every result sent on the callback and ends after the first final
/// result (one without `keep_callback`).
#[derive(Debug)]
pub struct ResponseStream {
    rx: mpsc::UnboundedReceiver<PluginResult>,
    done: bool,
}

impl ResponseStream {
    /// Take a result that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<PluginResult> {
        if self.done {
            return None;
        }
        let result = self.rx.try_recv().ok()?;
        self.done = !result.keep_callback;
        Some(result)
    }
}

impl Stream for ResponseStream {
    type Item = PluginResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(result)) => {
                self.done = !result.keep_callback;
                Poll::Ready(Some(result))
            }
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
