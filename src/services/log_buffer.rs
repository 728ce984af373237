//! Session-scoped log capture
//!
//! Each pipeline invocation accumulates its log lines in memory and uploads
//! them as one text artifact at session end. The buffer holds the entirety of
//! one session's output; it is not rotated or size-bounded.
//!
//! `SessionLogger` is the handle components log through. It is addressed by
//! session identity, so two invocations running concurrently never interleave
//! lines into each other's buffer, and it mirrors every line to `tracing` so
//! process logs stay complete.

use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};

/// Timestamp layout used in captured log lines
const LINE_TIMESTAMP_FORMAT: &str = "%d/%b/%Y %H:%M:%S";

/// In-memory accumulator of formatted log lines for one session
#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: Mutex<Vec<String>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one formatted line
    pub fn append(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    /// Drain the buffer, returning all lines joined with newlines
    ///
    /// Returns the empty string when nothing was buffered; a second
    /// consecutive flush therefore returns the empty string.
    pub fn flush(&self) -> String {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.is_empty() {
            return String::new();
        }
        lines.drain(..).collect::<Vec<_>>().join("\n")
    }

    /// Number of buffered lines
    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cheap-to-clone logging handle carrying the session identity
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: i64,
    interview_id: i64,
    buffer: Arc<LogBuffer>,
}

impl SessionLogger {
    pub fn new(session_id: i64, interview_id: i64) -> Self {
        Self {
            session_id,
            interview_id,
            buffer: Arc::new(LogBuffer::new()),
        }
    }

    /// The underlying buffer, shared with all clones of this handle
    pub fn buffer(&self) -> &Arc<LogBuffer> {
        &self.buffer
    }

    /// Record an informational line
    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!(
            session_id = self.session_id,
            interview_id = self.interview_id,
            "{message}"
        );
        self.buffer.append(self.format_line("INFO", message));
    }

    /// Record an error line
    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!(
            session_id = self.session_id,
            interview_id = self.interview_id,
            "{message}"
        );
        self.buffer.append(self.format_line("ERROR", message));
    }

    fn format_line(&self, level: &str, message: &str) -> String {
        format!(
            "[{}] {} [session {}] {}",
            Utc::now().format(LINE_TIMESTAMP_FORMAT),
            level,
            self.session_id,
            message
        )
    }
}
