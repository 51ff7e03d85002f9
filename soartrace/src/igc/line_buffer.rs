//! Bounded ring of formatted log lines awaiting flush.

use std::collections::VecDeque;

use super::{sanitize_record, IgcError};

/// Default number of lines held before a flush is required.
const DEFAULT_CAPACITY: usize = 32;

/// A bounded ring of sanitized ASCII lines.
///
/// Filled by the writer's record formatters, drained to empty by a
/// successful flush. A failed flush leaves the contents intact so the
/// caller can retry.
#[derive(Debug)]
pub struct LineBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LineBuffer {
    /// Create a buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` lines.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, sanitizing it to the IGC repertoire and truncating
    /// to the maximum record length.
    ///
    /// A line containing CR or LF is a contract violation and is rejected
    /// rather than silently sanitized.
    pub fn push(&mut self, line: &str) -> Result<(), IgcError> {
        if line.contains(['\r', '\n']) {
            return Err(IgcError::EmbeddedTerminator);
        }
        if self.is_full() {
            return Err(IgcError::BufferFull);
        }
        self.lines.push_back(sanitize_record(line));
        Ok(())
    }

    /// True if no more lines can be appended.
    pub fn is_full(&self) -> bool {
        self.lines.len() >= self.capacity
    }

    /// True if there is nothing to flush.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Iterate the buffered lines in append order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Drop all buffered lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
