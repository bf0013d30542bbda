//! Shannon entropy estimation
//!
//! Entropy measures the randomness of data. Normal files (text, documents)
//! have low entropy (3-5 bits/byte). Encrypted/compressed files have high
//! entropy (7.9-8.0 bits/byte).
//!
//! Large files are not read in full: past three windows' worth of bytes
//! only the head, the middle and the tail window are hashed.

use crate::error::ReadFailure;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Default window size in bytes
pub const SAMPLE_SIZE: usize = 4096;

/// Calculate Shannon entropy of data
///
/// Returns a value between 0.0 (all same bytes) and 8.0 (perfectly random)
///
/// Single pass over the data with a fixed 256-bucket frequency table.
#[inline]
pub fn calculate(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    // Count byte frequencies
    let mut frequency = [0u64; 256];
    for &byte in data {
        frequency[byte as usize] += 1;
    }

    let len = data.len() as f64;
    let mut entropy = 0.0;

    for &count in &frequency {
        if count > 0 {
            let probability = count as f64 / len;
            entropy -= probability * probability.log2();
        }
    }

    entropy
}

/// Outcome of estimating one file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyResult {
    /// Bits per byte, in [0, 8]
    pub value: f64,
    /// Only the head/middle/tail windows were read
    pub sampled: bool,
}

/// Size-adaptive entropy estimator
#[derive(Debug, Clone, Copy)]
pub struct EntropyEstimator {
    sample_size: usize,
}

impl Default for EntropyEstimator {
    fn default() -> Self {
        Self::new(SAMPLE_SIZE)
    }
}

impl EntropyEstimator {
    /// Create an estimator with the given window size
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size: sample_size.max(1),
        }
    }

    /// Window size in bytes
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Estimate the entropy of the file at `path`
    pub fn estimate(&self, path: &Path) -> Result<EntropyResult, ReadFailure> {
        let fail = |source| ReadFailure {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(fail)?;
        let size = file.metadata().map_err(fail)?.len();
        let window = self.sample_size as u64;

        if size <= window * 3 {
            // Never more than three windows, even if the file grew after the stat
            let mut data = Vec::with_capacity(size as usize);
            read_window(&mut file, 0, window * 3, &mut data).map_err(fail)?;
            return Ok(EntropyResult {
                value: calculate(&data),
                sampled: false,
            });
        }

        let middle = (size / 2).saturating_sub(window / 2).max(window);
        let tail = size.saturating_sub(window);

        let mut data = Vec::with_capacity(self.sample_size * 3);
        for offset in [0, middle, tail] {
            read_window(&mut file, offset, window, &mut data).map_err(fail)?;
        }

        Ok(EntropyResult {
            value: calculate(&data),
            sampled: true,
        })
    }
}

/// Append up to `len` bytes starting at `offset` to `buf`
fn read_window(file: &mut File, offset: u64, len: u64, buf: &mut Vec<u8>) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.by_ref().take(len).read_to_end(buf)?;
    Ok(())
}
