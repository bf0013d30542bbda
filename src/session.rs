//! Scan and watch sessions
//!
//! A session owns one pipeline for its lifetime. Console output here only
//! renders what the pipeline already logged.

use crate::config::Config;
use crate::detector::Status;
use crate::eventlog::ClassificationRecord;
use crate::pipeline::Pipeline;
use crate::scanner::{DirectoryScanner, SessionSummary};
use crate::watcher::{Observation, Watcher};
use std::fmt;
use std::future::Future;
use std::path::Path;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::info;

/// Safe paths listed in the console summary
const SAFE_SAMPLE: usize = 5;

/// Run a one-shot scan of `root` and print the summary
pub fn run_scan(config: &Config, root: &Path) -> anyhow::Result<SessionSummary> {
    let pipeline = Pipeline::new(config, config.detection.scan_threshold);
    info!(
        "Scanning {:?} (threshold {:.2}, quarantine {})",
        root,
        pipeline.threshold(),
        if config.quarantine.enabled { "on" } else { "off" }
    );

    let summary = DirectoryScanner::new(config).scan(root, &pipeline)?;

    print!("{}", format_summary(&summary));
    println!("\nResults also saved in: {}", pipeline.log().path().display());

    Ok(summary)
}

/// Human-readable scan summary
pub fn format_summary(summary: &SessionSummary) -> String {
    Summary(summary).to_string()
}

struct Summary<'a>(&'a SessionSummary);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        writeln!(f, "\n=== Scan Summary ===")?;
        writeln!(f, "Scanned: {} files", summary.scanned)?;
        writeln!(
            f,
            "Safe: {} | Suspicious: {} | Unreadable: {}",
            summary.safe_count(),
            summary.suspicious_count(),
            summary.unreadable
        )?;

        if !summary.safe.is_empty() {
            writeln!(f, "\nSafe files:")?;
            for (path, entropy) in summary.safe.iter().take(SAFE_SAMPLE) {
                writeln!(f, "  {} (Entropy: {:.2})", path.display(), entropy)?;
            }
            if summary.safe.len() > SAFE_SAMPLE {
                writeln!(f, "  ... {} more", summary.safe.len() - SAFE_SAMPLE)?;
            }
        }

        if !summary.suspicious.is_empty() {
            writeln!(f, "\nSuspicious files:")?;
            for (path, entropy) in &summary.suspicious {
                writeln!(f, "  {} (Entropy: {:.2})", path.display(), entropy)?;
            }
        }

        Ok(())
    }
}

/// One console line for a live-watch record
pub fn format_record(record: &ClassificationRecord) -> String {
    let path = record.observation.path.display();
    let kind = record.observation.kind;
    match (record.status, record.entropy) {
        (Status::Suspicious, Some(e)) => {
            let line = format!("[!] {}: {} (entropy={:.2}) -> SUSPICIOUS", kind, path, e);
            if record.action == "-" {
                line
            } else {
                format!("{} [{}]", line, record.action)
            }
        }
        (Status::Safe, Some(e)) => format!("[OK] {}: {} (entropy={:.2}) -> SAFE", kind, path, e),
        _ if record.message != "-" => format!("[{}] {} ({})", kind, path, record.message),
        _ => format!("[{}] {}", kind, path),
    }
}

/// Watch the configured directory until SIGINT or SIGTERM
pub async fn run_watch(config: &Config) -> anyhow::Result<()> {
    if !config.watch.dir.exists() {
        std::fs::create_dir_all(&config.watch.dir)?;
        info!("Created watch directory: {:?}", config.watch.dir);
    }

    let pipeline = Pipeline::new(config, config.detection.watch_threshold);
    let watcher = Watcher::new(config)?;

    let (tx, rx) = mpsc::channel(config.watch.queue.max(1));
    let source = watcher.spawn(tx);

    println!("Watching {} for file changes...", config.watch.dir.display());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
        }
    };

    let handled = watch_loop(&pipeline, rx, shutdown).await;

    source.abort();
    let _ = source.await;
    info!("Watcher stopped after {} events", handled);

    Ok(())
}

/// Drive observations from `rx` through the pipeline one at a time until
/// `shutdown` resolves or the source goes away. Returns the number of
/// records produced.
pub async fn watch_loop<F>(pipeline: &Pipeline, mut rx: mpsc::Receiver<Observation>, shutdown: F) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut handled = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = rx.recv() => match next {
                Some(observation) => {
                    if let Some(record) = pipeline.process(observation) {
                        println!("{}", format_record(&record));
                        handled += 1;
                    }
                }
                None => {
                    info!("Notification source closed");
                    break;
                }
            },
        }
    }

    handled
}
