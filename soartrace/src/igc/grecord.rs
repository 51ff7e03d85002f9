//! Security record digest engine.
//!
//! The flight log is signed in two phases. While the file is written,
//! every flushed record is absorbed into an accumulating digest. At sign
//! time that digest is finalized ("expected"), and a second digest is
//! derived independently by re-reading the file from disk ("observed").
//! Only if the two match is the file considered untampered; the trailing
//! `G` record reflects the result. Deriving the observed digest from the
//! bytes actually on disk, rather than from what the writer believes it
//! wrote, is what makes corruption between write and sign detectable.

use std::fmt;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Security record emitted when the expected and observed digests
/// disagree. A valid record is always `G` followed by 64 hex digits, so
/// the marker cannot be mistaken for a signature.
pub(crate) const INVALID_DIGEST_RECORD: &str = "GINVALIDSECURITYDIGEST";

/// A finalized flight log digest.
///
/// Renders as 64 uppercase hex digits, the payload of a valid `G` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityDigest([u8; 32]);

impl fmt::Display for SecurityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Accumulating digest over a flight log's security-relevant records.
///
/// The engine is consumed by `finalize`, making the
/// accumulating-to-finalized transition explicit in the type: a finalized
/// digest can no longer absorb records.
#[derive(Debug)]
pub struct GRecord {
    hasher: Sha256,
}

impl GRecord {
    /// Create an empty accumulating engine.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// True if a record participates in the digest. Security records
    /// themselves (`G`) and free-text logger notes (`L`) do not, so the
    /// trailing signature and harmless annotations never invalidate it.
    pub fn is_signed_record(line: &str) -> bool {
        !line.starts_with('G') && !line.starts_with('L')
    }

    /// Absorb one record (without its line terminator).
    pub fn absorb_record(&mut self, line: &str) {
        if Self::is_signed_record(line) {
            self.hasher.update(line.as_bytes());
        }
    }

    /// Finalize the digest, consuming the engine.
    pub fn finalize(self) -> SecurityDigest {
        SecurityDigest(self.hasher.finalize().into())
    }

    /// Independently derive the digest of the file at `path`, record by
    /// record, exactly as the incremental path would have absorbed it.
    pub fn digest_file(path: &Path) -> io::Result<SecurityDigest> {
        let content = std::fs::read(path)?;
        let mut hasher = Sha256::new();
        for line in content.split(|&b| b == b'\n') {
            let line = match line.last() {
                Some(&b'\r') => &line[..line.len() - 1],
                _ => line,
            };
            if line.is_empty() {
                continue;
            }
            if line[0] != b'G' && line[0] != b'L' {
                hasher.update(line);
            }
        }
        Ok(SecurityDigest(hasher.finalize().into()))
    }
}

impl Default for GRecord {
    fn default() -> Self {
        Self::new()
    }
}
