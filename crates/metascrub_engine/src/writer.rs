use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use engine_logging::{engine_info, engine_warn};

use crate::batch::{empty_summary, emit_summary, BatchContext, BatchError, BatchTracker};
use crate::filter::FILTERED_OUTPUT_FILENAME;
use crate::persist::append_text;
use crate::scan::dirs_containing;
use crate::tool::{CommandTemplate, ToolInvoker};
use crate::types::{BatchSummary, EngineEvent, EventSink, JobFailure, JobId, JobOutcome, Operation};

/// Cumulative stdout+stderr transcript kept in the root across all write-back
/// invocations.
pub const TRANSCRIPT_FILENAME: &str = "exiftool_output.txt";
/// Per-directory stderr log appended on failures.
pub const DIR_ERROR_FILENAME: &str = "errors.txt";

/// Default command template mirroring the tool flags the original batch used:
/// apply `modified.json` recursively, preserving original file attributes.
pub const DEFAULT_WRITE_BACK_TEMPLATE: &str =
    "exiftool -progress -v -preserve_original -m -json={json} -overwrite_original_in_place -r {dir}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBackSettings {
    pub command_template: String,
    pub input_filename: String,
    pub transcript_filename: String,
    pub error_filename: String,
    /// Upper bound on concurrently running write-back jobs.
    pub max_concurrent_jobs: usize,
}

impl Default for WriteBackSettings {
    fn default() -> Self {
        Self {
            command_template: DEFAULT_WRITE_BACK_TEMPLATE.to_string(),
            input_filename: FILTERED_OUTPUT_FILENAME.to_string(),
            transcript_filename: TRANSCRIPT_FILENAME.to_string(),
            error_filename: DIR_ERROR_FILENAME.to_string(),
            max_concurrent_jobs: 10,
        }
    }
}

struct WriteBackShared {
    context: BatchContext,
    queue: Mutex<VecDeque<(JobId, PathBuf)>>,
    transcript: Mutex<PathBuf>,
    template: CommandTemplate,
    settings: WriteBackSettings,
}

/// Runs the write-back pass: every directory under `root` holding a filtered
/// metadata file gets one tool invocation applying it back onto the images.
///
/// Directories are started in ascending folder-name order by a worker pool
/// bounded at `max_concurrent_jobs`; finish order is not guaranteed. Blocks
/// until every directory reported completion.
pub fn run_write_back(
    root: &Path,
    settings: &WriteBackSettings,
    invoker: Arc<dyn ToolInvoker>,
    sink: Arc<dyn EventSink>,
) -> Result<BatchSummary, BatchError> {
    let template = CommandTemplate::parse(&settings.command_template)?;
    let dirs = dirs_containing(root, &settings.input_filename);
    let total = dirs.len();
    engine_info!("Write-back batch: {} directories under {:?}", total, root);
    sink.emit(EngineEvent::BatchStarted {
        operation: Operation::WriteBack,
        total,
    });

    if total == 0 {
        let summary = empty_summary(Operation::WriteBack);
        sink.emit(EngineEvent::BatchCompleted(summary.clone()));
        return Ok(summary);
    }

    let queue: VecDeque<(JobId, PathBuf)> = dirs
        .into_iter()
        .enumerate()
        .map(|(index, dir)| ((index + 1) as JobId, dir))
        .collect();

    let shared = Arc::new(WriteBackShared {
        context: BatchContext {
            tracker: BatchTracker::new(total),
            sink,
            root: root.to_path_buf(),
            final_summary: Mutex::new(None),
        },
        queue: Mutex::new(queue),
        transcript: Mutex::new(root.join(&settings.transcript_filename)),
        template,
        settings: settings.clone(),
    });

    let worker_count = settings.max_concurrent_jobs.min(total).max(1);
    let mut handles = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let shared = Arc::clone(&shared);
        let invoker = Arc::clone(&invoker);
        handles.push(thread::spawn(move || {
            while let Some((job_id, dir)) = pop_next(&shared) {
                run_write_back_job(&shared, invoker.as_ref(), job_id, &dir);
            }
        }));
    }
    for handle in handles {
        let _ = handle.join();
    }

    let summary = shared
        .context
        .final_summary
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_else(|| empty_summary(Operation::WriteBack));
    Ok(summary)
}

fn pop_next(shared: &WriteBackShared) -> Option<(JobId, PathBuf)> {
    shared.queue.lock().ok()?.pop_front()
}

fn run_write_back_job(
    shared: &WriteBackShared,
    invoker: &dyn ToolInvoker,
    job_id: JobId,
    dir: &Path,
) {
    let label = dir.display().to_string();
    shared.context.sink.emit(EngineEvent::JobStarted {
        job_id,
        label: label.clone(),
    });

    let json_path = dir.join(&shared.settings.input_filename);
    let (program, args) = shared.template.build(dir, Some(&json_path));

    let result = match invoker.invoke(&program, &args, dir) {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            if !stdout.is_empty() {
                shared.context.sink.emit(EngineEvent::JobOutput {
                    job_id,
                    text: stdout.clone(),
                });
            }
            log_transcript(shared, dir, &stdout, &output.stderr);
            if !output.stderr.is_empty() {
                log_dir_errors(shared, dir, &output.stderr);
            }
            if output.success() {
                Ok(JobOutcome {
                    label,
                    removed_items: 0,
                })
            } else {
                let message =
                    format!("Error writing metadata for: {}\n{}", dir.display(), output.stderr);
                shared.context.tracker.record_error(message.clone());
                Err(JobFailure { label, message })
            }
        }
        Err(err) => {
            let message = format!("Error writing metadata for: {}\n{}", dir.display(), err);
            shared.context.tracker.record_error(message.clone());
            Err(JobFailure { label, message })
        }
    };
    shared.context.sink.emit(EngineEvent::JobCompleted { job_id, result });

    if shared.context.tracker.complete_one() {
        finish_write_back(shared);
    }
}

/// Appends one directory's captured output to the cumulative transcript in
/// the root. The transcript is shared by all workers; the mutex keeps
/// interleaved appends whole.
fn log_transcript(shared: &WriteBackShared, dir: &Path, stdout: &str, stderr: &str) {
    let entry = format!(
        "Processing directory: {}\nExifTool stdout: {}\nExifTool stderr: {}\n\n",
        dir.display(),
        stdout,
        stderr
    );
    if let Ok(path) = shared.transcript.lock() {
        if let Err(err) = append_text(&path, &entry) {
            engine_warn!("Failed to append transcript to {:?}: {}", *path, err);
        }
    }
}

fn log_dir_errors(shared: &WriteBackShared, dir: &Path, stderr: &str) {
    let path = dir.join(&shared.settings.error_filename);
    if let Err(err) = append_text(&path, stderr) {
        engine_warn!("Failed to append errors to {:?}: {}", path, err);
    }
}

/// Aggregate completion for write-back. The per-directory error files and the
/// transcript already hold the failure details, so the transcript doubles as
/// the detail log when anything failed.
fn finish_write_back(shared: &WriteBackShared) {
    let error_log = if shared.context.tracker.failed_count() > 0 {
        let path = shared.context.root.join(&shared.settings.transcript_filename);
        engine_warn!("Write-back finished with failures; see {:?}", path);
        Some(path)
    } else {
        None
    };
    emit_summary(&shared.context, Operation::WriteBack, 0, error_log);
}
