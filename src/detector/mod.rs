//! Entropy-based classification

pub mod entropy;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use entropy::{EntropyEstimator, EntropyResult};

/// Verdict attached to a logged observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Entropy below the threshold
    Safe,
    /// Entropy at or above the threshold
    Suspicious,
    /// No judgment made (deleted or unreadable file)
    Info,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Safe => "SAFE",
            Status::Suspicious => "SUSPICIOUS",
            Status::Info => "INFO",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an entropy value to a verdict. The boundary belongs to the
/// suspicious side.
#[inline]
pub fn classify(entropy: f64, threshold: f64) -> Status {
    if entropy >= threshold {
        Status::Suspicious
    } else {
        Status::Safe
    }
}

/// Fixed-threshold classifier
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    threshold: f64,
}

impl Classifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, entropy: f64) -> Status {
        classify(entropy, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_suspicious() {
        assert_eq!(classify(7.0, 7.0), Status::Suspicious);
        assert_eq!(classify(7.0 - f64::EPSILON * 8.0, 7.0), Status::Safe);
    }

    #[test]
    fn test_classifier() {
        let classifier = Classifier::new(7.5);
        assert_eq!(classifier.classify(0.0), Status::Safe);
        assert_eq!(classifier.classify(7.49), Status::Safe);
        assert_eq!(classifier.classify(7.5), Status::Suspicious);
        assert_eq!(classifier.classify(8.0), Status::Suspicious);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&Status::Suspicious).unwrap(), "\"SUSPICIOUS\"");
        assert_eq!(Status::Info.to_string(), "INFO");
    }
}
