use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use engine_logging::{engine_error, engine_info};
use thiserror::Error;

use crate::persist::AtomicFileWriter;
use crate::scan::immediate_subdirs;
use crate::tool::{CommandTemplate, ToolError, ToolInvoker};
use crate::types::{BatchSummary, EngineEvent, EventSink, JobFailure, JobId, JobOutcome, Operation};

/// Metadata dump produced in each subfolder by the extraction batch.
pub const EXTRACT_OUTPUT_FILENAME: &str = "output.json";
/// Error summary persisted in the root when any job failed.
pub const BATCH_ERROR_FILENAME: &str = "errors.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    pub command_template: String,
    pub output_filename: String,
}

impl ExtractSettings {
    pub fn new(command_template: impl Into<String>) -> Self {
        Self {
            command_template: command_template.into(),
            output_filename: EXTRACT_OUTPUT_FILENAME.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to list subfolders of {root}: {source}")]
    ListRoot { root: PathBuf, source: io::Error },
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Single-fire completion latch shared by every worker of one batch.
///
/// Workers record failures and call [`BatchTracker::complete_one`] when done;
/// exactly one call (the one that brings the finished count up to the
/// submitted total) observes `true`, regardless of finishing order. The
/// finished count and error list are the only state shared across workers.
pub struct BatchTracker {
    total: usize,
    finished: AtomicUsize,
    failed: AtomicUsize,
    errors: Mutex<Vec<String>>,
}

impl BatchTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            finished: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn record_error(&self, message: String) {
        self.failed.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(message);
        }
    }

    /// Marks one job finished. Returns `true` for exactly the call that
    /// completes the batch.
    pub fn complete_one(&self) -> bool {
        let done = self.finished.fetch_add(1, Ordering::AcqRel) + 1;
        debug_assert!(done <= self.total, "more completions than submitted jobs");
        done == self.total
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::Acquire)
    }

    /// Drains the collected error messages.
    pub fn take_errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .map(|mut errors| std::mem::take(&mut *errors))
            .unwrap_or_default()
    }
}

/// Per-batch shared state handed to every worker.
pub(crate) struct BatchContext {
    pub(crate) tracker: BatchTracker,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) root: PathBuf,
    pub(crate) final_summary: Mutex<Option<BatchSummary>>,
}

/// Runs the extraction batch: one worker thread per immediate subfolder of
/// `root`, each invoking the external tool with that subfolder as working
/// directory and writing the captured stdout to `output.json` inside it.
///
/// Blocks until every job reported completion. Per-job failures are recovered
/// at the job boundary and collected; they never abort sibling jobs.
pub fn run_extraction(
    root: &Path,
    settings: &ExtractSettings,
    invoker: Arc<dyn ToolInvoker>,
    sink: Arc<dyn EventSink>,
) -> Result<BatchSummary, BatchError> {
    let template = CommandTemplate::parse(&settings.command_template)?;
    let subdirs = immediate_subdirs(root).map_err(|source| BatchError::ListRoot {
        root: root.to_path_buf(),
        source,
    })?;

    let total = subdirs.len();
    engine_info!("Extraction batch: {} subfolders under {:?}", total, root);
    sink.emit(EngineEvent::BatchStarted {
        operation: Operation::Extract,
        total,
    });

    if total == 0 {
        let summary = empty_summary(Operation::Extract);
        sink.emit(EngineEvent::BatchCompleted(summary.clone()));
        return Ok(summary);
    }

    let context = Arc::new(BatchContext {
        tracker: BatchTracker::new(total),
        sink,
        root: root.to_path_buf(),
        final_summary: Mutex::new(None),
    });

    let mut handles = Vec::with_capacity(total);
    for (index, dir) in subdirs.into_iter().enumerate() {
        let job_id = (index + 1) as JobId;
        let context = Arc::clone(&context);
        let template = template.clone();
        let invoker = Arc::clone(&invoker);
        let output_filename = settings.output_filename.clone();
        handles.push(thread::spawn(move || {
            run_extraction_job(&context, job_id, &dir, &template, invoker.as_ref(), &output_filename);
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }

    let summary = context
        .final_summary
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_else(|| empty_summary(Operation::Extract));
    Ok(summary)
}

fn run_extraction_job(
    context: &BatchContext,
    job_id: JobId,
    dir: &Path,
    template: &CommandTemplate,
    invoker: &dyn ToolInvoker,
    output_filename: &str,
) {
    let label = dir.display().to_string();
    context.sink.emit(EngineEvent::JobStarted {
        job_id,
        label: label.clone(),
    });

    let result = extract_one_folder(dir, template, invoker, output_filename);
    let result = match result {
        Ok(()) => Ok(JobOutcome {
            label,
            removed_items: 0,
        }),
        Err(message) => {
            context.tracker.record_error(message.clone());
            Err(JobFailure { label, message })
        }
    };
    context.sink.emit(EngineEvent::JobCompleted { job_id, result });

    if context.tracker.complete_one() {
        finish_batch(context, Operation::Extract, 0);
    }
}

/// One extraction job body. Any failure is reduced to a single message in the
/// original's format: folder path on the first line, stderr (or the local
/// error) after it.
fn extract_one_folder(
    dir: &Path,
    template: &CommandTemplate,
    invoker: &dyn ToolInvoker,
    output_filename: &str,
) -> Result<(), String> {
    let (program, args) = template.build(dir, None);
    let output = invoker
        .invoke(&program, &args, dir)
        .map_err(|err| job_error_message(dir, &err.to_string()))?;

    if !output.success() {
        return Err(job_error_message(dir, &output.stderr));
    }

    let writer = AtomicFileWriter::new(dir.to_path_buf());
    writer
        .write_bytes(output_filename, &output.stdout)
        .map_err(|err| job_error_message(dir, &err.to_string()))?;
    Ok(())
}

fn job_error_message(dir: &Path, detail: &str) -> String {
    format!("Error processing folder: {}\n{}", dir.display(), detail)
}

/// Aggregate completion: runs on whichever worker finished last. Persists the
/// error summary (if any) and fires the batch-completed event exactly once.
pub(crate) fn finish_batch(context: &BatchContext, operation: Operation, removed_items: u64) {
    let errors = context.tracker.take_errors();
    let error_log = if errors.is_empty() {
        None
    } else {
        let mut content = errors.join("\n");
        content.push('\n');
        let writer = AtomicFileWriter::new(context.root.clone());
        match writer.write(BATCH_ERROR_FILENAME, &content) {
            Ok(path) => Some(path),
            Err(err) => {
                engine_error!("Failed to persist error summary in {:?}: {}", context.root, err);
                None
            }
        }
    };

    emit_summary(context, operation, removed_items, error_log);
}

/// Builds the aggregate summary, stores it for the orchestrator and fires the
/// batch-completed event.
pub(crate) fn emit_summary(
    context: &BatchContext,
    operation: Operation,
    removed_items: u64,
    error_log: Option<PathBuf>,
) {
    let failed = context.tracker.failed_count();
    let summary = BatchSummary {
        operation,
        submitted: context.tracker.total(),
        succeeded: context.tracker.total() - failed,
        failed,
        removed_items,
        error_log,
    };
    if let Ok(mut slot) = context.final_summary.lock() {
        *slot = Some(summary.clone());
    }
    context.sink.emit(EngineEvent::BatchCompleted(summary));
}

pub(crate) fn empty_summary(operation: Operation) -> BatchSummary {
    BatchSummary {
        operation,
        submitted: 0,
        succeeded: 0,
        failed: 0,
        removed_items: 0,
        error_log: None,
    }
}
