//! Observation processing shared by scan and watch
//!
//! estimate -> classify -> respond -> append to the event log, one
//! observation at a time.

use crate::config::{resolve_path, Config};
use crate::detector::{Classifier, EntropyEstimator, Status};
use crate::eventlog::{ClassificationRecord, EventLog};
use crate::response::{self, QuarantineManager};
use crate::watcher::{EventKind, Observation};
use std::path::PathBuf;
use tracing::{debug, error};

/// The classification pipeline
pub struct Pipeline {
    config: Config,
    estimator: EntropyEstimator,
    classifier: Classifier,
    quarantine: Option<QuarantineManager>,
    log: EventLog,
    /// Log file with symlinks resolved, as observations carry it
    own_log: PathBuf,
    /// Quarantine directory with symlinks resolved
    own_quarantine: PathBuf,
}

impl Pipeline {
    /// Build a pipeline classifying against `threshold`. Quarantine is
    /// wired in when `config.quarantine.enabled` is set.
    pub fn new(config: &Config, threshold: f64) -> Self {
        let quarantine = config
            .quarantine
            .enabled
            .then(|| QuarantineManager::new(&config.quarantine.dir));

        Self {
            config: config.clone(),
            estimator: EntropyEstimator::new(config.detection.sample_size),
            classifier: Classifier::new(threshold),
            quarantine,
            log: EventLog::new(&config.log.file),
            own_log: resolve_path(&config.log.file),
            own_quarantine: resolve_path(&config.quarantine.dir),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.classifier.threshold()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Whether an observation is outside the pipeline's remit
    pub fn is_ignored(&self, observation: &Observation) -> bool {
        let path = &observation.path;
        path == &self.own_log
            || path.starts_with(&self.own_quarantine)
            || self.config.is_own_output(path)
            || self.config.is_excluded(path)
    }

    /// Process one observation and log the result. Returns `None` when
    /// the observation is ignored.
    pub fn process(&self, observation: Observation) -> Option<ClassificationRecord> {
        if self.is_ignored(&observation) {
            debug!("Ignoring {:?}", observation.path);
            return None;
        }

        let record = self.classify(observation);

        if let Err(e) = self.log.append(&record) {
            error!("Logging failed: {}", e);
        }

        Some(record)
    }

    fn classify(&self, observation: Observation) -> ClassificationRecord {
        if observation.kind == EventKind::Delete {
            return ClassificationRecord::new(observation, None, Status::Info);
        }

        if observation.size == Some(0) {
            return ClassificationRecord::new(observation, None, Status::Info)
                .with_message("empty file");
        }

        let entropy = match self.estimator.estimate(&observation.path) {
            Ok(result) => result,
            Err(e) => {
                debug!("{}", e);
                let message = e.to_string();
                return ClassificationRecord::new(observation, None, Status::Info)
                    .with_message(message);
            }
        };

        let status = self.classifier.classify(entropy.value);
        let action = response::handle(status, &observation.path, self.quarantine.as_ref());

        let mut record = ClassificationRecord::new(observation, Some(entropy.value), status)
            .with_action(action.to_string());
        if entropy.sampled {
            record = record.with_message("sampled");
        }
        record
    }
}
