use std::path::PathBuf;

pub type JobId = u64;

/// Which batch operation the engine is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Extract,
    Filter,
    WriteBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Targets have been enumerated; `total` jobs will run.
    BatchStarted { operation: Operation, total: usize },
    JobStarted {
        job_id: JobId,
        label: String,
    },
    /// Captured tool output forwarded as progress text.
    JobOutput {
        job_id: JobId,
        text: String,
    },
    JobCompleted {
        job_id: JobId,
        result: Result<JobOutcome, JobFailure>,
    },
    /// Fired exactly once per batch, after every submitted job completed.
    BatchCompleted(BatchSummary),
    /// The batch could not start at all (e.g. the root was unreadable).
    BatchFailed {
        operation: Operation,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub label: String,
    /// Items dropped by a filter job; zero for other operations.
    pub removed_items: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub operation: Operation,
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub removed_items: u64,
    /// Persisted detail log, present when failures were recorded.
    pub error_log: Option<PathBuf>,
}

/// Receives engine events; implementations must tolerate delivery from worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
