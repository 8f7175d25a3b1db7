//! Call scope
//!
//! Carries the two ambient capabilities an upload needs from its host: a
//! log sink for user-visible diagnostic lines and a cancellation token.
//!
//! # Example
//!
//! ```
//! use http_uploadr::scope::{MemorySink, Scope};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! let scope = Scope::new(sink.clone());
//! scope.log("upload_http: hello");
//! assert_eq!(sink.lines(), vec!["upload_http: hello".to_string()]);
//! ```

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Destination for diagnostic lines emitted during a call
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

/// Sink that forwards every line to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::info!(target: "http_uploadr::scope", "{}", message);
    }
}

/// Sink that keeps every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines logged so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether any logged line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

/// Per-call context handed to uploads and host functions
#[derive(Clone)]
pub struct Scope {
    sink: Arc<dyn LogSink>,
    cancel: CancellationToken,
}

impl Scope {
    /// Create a scope with a fresh, uncancelled token
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::with_cancellation(sink, CancellationToken::new())
    }

    /// Create a scope bound to an existing cancellation token
    pub fn with_cancellation(sink: Arc<dyn LogSink>, cancel: CancellationToken) -> Self {
        Self { sink, cancel }
    }

    /// Derive a scope sharing the sink whose token is cancelled with ours
    pub fn child(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn log(&self, message: impl fmt::Display) {
        self.sink.log(&message.to_string());
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
