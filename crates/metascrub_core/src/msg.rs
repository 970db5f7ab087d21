#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked the photo-library root folder.
    RootSelected(std::path::PathBuf),
    /// User edited the extraction command template.
    CommandTemplateChanged(String),
    /// User edited the comma-separated remove-word list.
    RemoveWordsChanged(String),
    /// User edited the comma-separated keep-exception list.
    KeepExceptionsChanged(String),
    /// User triggered the extraction batch.
    ExtractRequested,
    /// User triggered the filter pass.
    FilterRequested,
    /// User triggered the metadata write-back pass.
    WriteBackRequested,
    /// Engine discovered the batch size after enumerating targets.
    BatchStarted { total: usize },
    /// Engine started one folder/file job.
    JobStarted {
        job_id: crate::JobId,
        label: String,
    },
    /// Engine completion for one job.
    JobDone {
        job_id: crate::JobId,
        result: crate::JobResultKind,
    },
    /// Engine finished the whole batch.
    BatchFinished(crate::BatchReport),
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
