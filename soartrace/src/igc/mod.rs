//! IGC flight log production.
//!
//! Builds the standardized line records of an IGC flight log (header,
//! declaration, fix, event and security records), buffers them in a
//! bounded ring, flushes them durably to disk, and signs the finished
//! file with a two-phase digest protocol that detects post-hoc
//! tampering.

mod frecord;
mod grecord;
mod line_buffer;
mod writer;

pub use frecord::FRecord;
pub use grecord::{GRecord, SecurityDigest};
pub use line_buffer::LineBuffer;
pub use writer::{HeaderData, IgcFix, IgcWriter, SignOutcome};

use thiserror::Error;

/// Maximum length of one stored record, in bytes.
pub const MAX_RECORD_LEN: usize = 90;

/// Errors from flight log production.
#[derive(Debug, Error)]
pub enum IgcError {
    /// I/O failure while flushing or signing. Buffered lines are kept
    /// for retry.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The line buffer is at capacity; flush before appending.
    #[error("flight log line buffer is full")]
    BufferFull,

    /// A record may not contain CR or LF.
    #[error("record contains an embedded line terminator")]
    EmbeddedTerminator,

    /// Logger ids are exactly three ASCII alphanumeric characters.
    #[error("invalid logger id: {0:?}")]
    InvalidLoggerId(String),

    /// The header date is outside any plausible logging period.
    #[error("implausible log date: {0}")]
    ImplausibleDate(chrono::NaiveDate),
}

/// True if `c` belongs to the IGC character repertoire: printable ASCII
/// minus the characters the format reserves.
pub(crate) fn is_valid_igc_char(c: char) -> bool {
    matches!(c, ' '..='~') && !matches!(c, '$' | '*' | '!' | '\\' | '^' | '~')
}

/// Truncate a record to `MAX_RECORD_LEN` and replace every character
/// outside the repertoire with a space.
pub(crate) fn sanitize_record(line: &str) -> String {
    line.chars()
        .take(MAX_RECORD_LEN)
        .map(|c| if is_valid_igc_char(c) { c } else { ' ' })
        .collect()
}
