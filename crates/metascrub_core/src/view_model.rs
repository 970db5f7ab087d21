use crate::{JobId, JobResultKind, Operation, SessionState, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: SessionState,
    pub root: Option<String>,
    /// Number of jobs submitted to the current/last batch.
    pub job_count: usize,
    pub finished_jobs: usize,
    pub failed_jobs: usize,
    pub jobs: Vec<JobRowView>,
    pub last_error: Option<String>,
    pub last_report: Option<BatchReportView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    /// Folder or file path the job works on.
    pub label: String,
    pub stage: Stage,
    pub outcome: Option<JobResultKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReportView {
    pub operation: Operation,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub removed_items: u64,
    pub error_log: Option<String>,
}
