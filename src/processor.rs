use crate::config::AppConfig;
use crate::error::{AppError, ExtractError};
use crate::extractor::{panic_message, Extractor};
use crate::metadata::{Record, ResultSet};
use crate::walker;
use crossbeam_channel::Receiver;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_WORKERS: usize = 4;

/// Fans extraction out over a fixed-width worker pool.
pub struct BulkProcessor {
    extractor: Arc<Extractor>,
    pool: ThreadPool,
    num_workers: usize,
}

impl BulkProcessor {
    pub fn new(extractor: Extractor, num_workers: usize) -> Result<Self, AppError> {
        let num_workers = num_workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("extract-{}", i))
            .build()?;
        Ok(Self {
            extractor: Arc::new(extractor),
            pool,
            num_workers,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(Extractor::from_config(config), config.num_workers)
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn process_files<P: AsRef<Path>>(&self, paths: &[P]) -> ResultSet {
        self.process_files_with_progress(paths, |_, _| {})
    }

    /// Extracts every supported path and reports `(completed, total)` after
    /// each unit of work, in completion order, from the calling thread.
    pub fn process_files_with_progress<P, F>(&self, paths: &[P], mut on_progress: F) -> ResultSet
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize),
    {
        let mut results = ResultSet::new();
        if paths.is_empty() {
            return results;
        }

        let mut batch = self.stream(paths);
        let total = batch.total();
        log::info!(
            "Processing {} of {} files with {} workers",
            total,
            paths.len(),
            self.num_workers
        );

        while let Some((path, record)) = batch.next() {
            if let Some(error) = record.error() {
                log::warn!("Failed to process {:?}: {}", path, error);
            } else {
                log::debug!("Processed {:?}", path);
            }
            results.insert(path, record);
            on_progress(batch.completed(), total);
        }

        log::info!("All files processed.");
        results
    }

    /// Submits every supported path and returns a handle yielding records as
    /// they complete. Unsupported paths are dropped silently.
    pub fn stream<P: AsRef<Path>>(&self, paths: &[P]) -> Batch {
        let supported: Vec<PathBuf> = paths
            .iter()
            .map(|p| p.as_ref().to_path_buf())
            .filter(|p| self.extractor.is_supported(p))
            .collect();
        let total = supported.len();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (records_tx, records_rx) = crossbeam_channel::unbounded();

        for path in supported {
            let records_tx = records_tx.clone();
            let extractor = Arc::clone(&self.extractor);
            let cancelled = Arc::clone(&cancelled);
            self.pool.spawn(move || {
                if cancelled.load(Ordering::Relaxed) {
                    log::trace!("Batch cancelled, skipping {:?}", path);
                    return;
                }
                log::trace!("Processing started for: {:?}", path);
                let record = run_task(|| extractor.extract(&path));
                // The receiver is gone once the caller drops the batch.
                let _ = records_tx.send((path, record));
            });
        }

        Batch {
            records_rx,
            total,
            completed: 0,
            cancelled,
        }
    }

    pub fn scan_directory(&self, dir: &Path, recursive: bool) -> Vec<PathBuf> {
        walker::scan_directory(dir, recursive)
    }
}

pub fn filter_geotagged(results: &ResultSet) -> ResultSet {
    results.filter_geotagged()
}

/// Runs one unit of work; a panic escaping it becomes a failed record.
fn run_task<F: FnOnce() -> Record>(task: F) -> Record {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(record) => record,
        Err(payload) => Record::failed(ExtractError::Task(panic_message(payload.as_ref()))),
    }
}

/// In-flight batch. Iterating yields `(path, record)` in completion order;
/// dropping it cancels tasks that have not started yet without waiting for
/// the ones already running.
pub struct Batch {
    records_rx: Receiver<(PathBuf, Record)>,
    total: usize,
    completed: usize,
    cancelled: Arc<AtomicBool>,
}

impl Batch {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Iterator for Batch {
    type Item = (PathBuf, Record);

    fn next(&mut self) -> Option<Self::Item> {
        if self.completed >= self.total {
            return None;
        }
        // Disconnects once every task has either sent or been skipped.
        let item = self.records_rx.recv().ok()?;
        self.completed += 1;
        Some(item)
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        self.cancel();
    }
}
