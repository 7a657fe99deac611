//! Row digests: deterministic identification of a written set of indicator rows.
//!
//! BLAKE3 over a canonical byte encoding, so two runs over identical bars
//! produce identical digests across builds and platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::IndicatorRow;

/// Hex-encoded BLAKE3 digest of a sequence of rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowsDigest(pub String);

impl RowsDigest {
    /// Digest of no rows.
    pub fn empty() -> Self {
        RowsDigestBuilder::new().finish()
    }

    pub fn of(rows: &[IndicatorRow]) -> Self {
        let mut builder = RowsDigestBuilder::new();
        for row in rows {
            builder.push(row);
        }
        builder.finish()
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RowsDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Incremental digest over rows in the order they are pushed.
///
/// Undefined fields hash as a single tag byte, defined ones as a tag byte
/// followed by the little-endian IEEE-754 bits.
pub struct RowsDigestBuilder {
    hasher: blake3::Hasher,
    rows: u64,
}

impl Default for RowsDigestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RowsDigestBuilder {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
            rows: 0,
        }
    }

    pub fn push(&mut self, row: &IndicatorRow) {
        self.hasher.update(&row.instrument_id.0.to_le_bytes());
        self.hasher.update(row.date.format("%Y-%m-%d").to_string().as_bytes());
        for value in row.values() {
            match value {
                Some(v) => {
                    self.hasher.update(&[1]);
                    self.hasher.update(&v.to_bits().to_le_bytes());
                }
                None => {
                    self.hasher.update(&[0]);
                }
            }
        }
        self.rows += 1;
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(mut self) -> RowsDigest {
        self.hasher.update(&self.rows.to_le_bytes());
        RowsDigest(self.hasher.finalize().to_hex().to_string())
    }
}
