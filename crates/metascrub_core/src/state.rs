use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::view_model::{AppViewModel, BatchReportView, JobRowView};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Extract,
    Filter,
    WriteBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running(Operation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobResultKind {
    Success,
    Failed,
}

/// Aggregate outcome of one batch, delivered once per operation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub operation: Operation,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items dropped by the filter pass; zero for the other operations.
    pub removed_items: u64,
    pub error_log: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JobRecord {
    pub label: String,
    pub stage: Stage,
    pub outcome: Option<JobResultKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    root: Option<PathBuf>,
    command_template: String,
    remove_words: String,
    keep_exceptions: String,
    session: SessionState,
    // BTreeMap keeps job rows in ascending JobId order for the view.
    jobs: BTreeMap<JobId, JobRecord>,
    submitted: usize,
    finished: usize,
    failed: usize,
    last_error: Option<String>,
    last_report: Option<BatchReport>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn command_template(&self) -> &str {
        &self.command_template
    }

    pub fn remove_words_input(&self) -> &str {
        &self.remove_words
    }

    pub fn keep_exceptions_input(&self) -> &str {
        &self.keep_exceptions
    }

    pub fn consume_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_root(&mut self, root: PathBuf) {
        self.root = Some(root);
        self.mark_dirty();
    }

    pub(crate) fn set_command_template(&mut self, template: String) {
        self.command_template = template;
        self.mark_dirty();
    }

    pub(crate) fn set_remove_words(&mut self, words: String) {
        self.remove_words = words;
        self.mark_dirty();
    }

    pub(crate) fn set_keep_exceptions(&mut self, words: String) {
        self.keep_exceptions = words;
        self.mark_dirty();
    }

    pub(crate) fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.mark_dirty();
    }

    /// Transition into a running batch, clearing rows from any previous run.
    pub(crate) fn begin_batch(&mut self, operation: Operation) {
        self.session = SessionState::Running(operation);
        self.jobs.clear();
        self.submitted = 0;
        self.finished = 0;
        self.failed = 0;
        self.last_error = None;
        self.mark_dirty();
    }

    pub(crate) fn apply_batch_started(&mut self, total: usize) {
        self.submitted = total;
        self.mark_dirty();
    }

    pub(crate) fn apply_job_started(&mut self, job_id: JobId, label: String) {
        self.jobs.insert(
            job_id,
            JobRecord {
                label,
                stage: Stage::Running,
                outcome: None,
            },
        );
        self.mark_dirty();
    }

    pub(crate) fn apply_job_done(&mut self, job_id: JobId, result: JobResultKind) {
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.stage = Stage::Done;
            job.outcome = Some(result);
        }
        self.finished += 1;
        if result == JobResultKind::Failed {
            self.failed += 1;
        }
        self.mark_dirty();
    }

    pub(crate) fn apply_batch_finished(&mut self, report: BatchReport) {
        self.session = SessionState::Idle;
        self.last_report = Some(report);
        self.mark_dirty();
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            session: self.session,
            root: self
                .root
                .as_ref()
                .map(|p| p.display().to_string()),
            job_count: self.submitted,
            finished_jobs: self.finished,
            failed_jobs: self.failed,
            jobs: self
                .jobs
                .iter()
                .map(|(&job_id, job)| JobRowView {
                    job_id,
                    label: job.label.clone(),
                    stage: job.stage,
                    outcome: job.outcome,
                })
                .collect(),
            last_error: self.last_error.clone(),
            last_report: self.last_report.as_ref().map(|report| BatchReportView {
                operation: report.operation,
                submitted: report.submitted,
                succeeded: report.succeeded,
                failed: report.failed,
                removed_items: report.removed_items,
                error_log: report
                    .error_log
                    .as_ref()
                    .map(|p| p.display().to_string()),
            }),
            dirty: self.dirty,
        }
    }
}
