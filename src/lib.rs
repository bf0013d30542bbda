//! entrowatch - entropy-based detection of encrypted or packed files
//!
//! Files whose byte distribution is close to uniform are typical of
//! encryption, compression and packing, and of ransomware output in
//! particular. This library estimates Shannon entropy per file, flags
//! files at or above a threshold, can move flagged files into a
//! quarantine directory, and records every observation in an append-only
//! JSON-lines log.
//!
//! # Features
//!
//! - **Sampled entropy** - bounded I/O on large files (head, middle, tail)
//! - **One-shot scan** - recursive walk with a deny-list of system trees
//! - **Live watch** - inotify create/modify/delete notifications
//! - **Quarantine** - collision-safe moves into an isolation directory
//!
//! # Example
//!
//! ```rust,no_run
//! use entrowatch::{Config, DirectoryScanner, Pipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let pipeline = Pipeline::new(&config, config.detection.scan_threshold);
//!
//!     let summary = DirectoryScanner::new(&config)
//!         .scan(std::path::Path::new("/home/user/Documents"), &pipeline)?;
//!     println!("{} suspicious", summary.suspicious_count());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod eventlog;
pub mod pipeline;
pub mod response;
pub mod scanner;
pub mod session;
pub mod watcher;

pub use config::Config;
pub use detector::{classify, entropy, Classifier, EntropyEstimator, EntropyResult, Status};
pub use error::{MoveFailure, ReadFailure, WriteFailure};
pub use eventlog::{ClassificationRecord, EventLog};
pub use pipeline::Pipeline;
pub use response::{QuarantineManager, ResponseAction};
pub use scanner::{DirectoryScanner, SessionSummary};
pub use watcher::{EventKind, Observation, Watcher};
