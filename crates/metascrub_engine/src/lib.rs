//! Metascrub engine: external tool invocation and batch orchestration.
mod batch;
mod engine;
mod filter;
mod persist;
mod scan;
mod tool;
mod types;
mod writer;

pub use batch::{
    run_extraction, BatchError, BatchTracker, ExtractSettings, BATCH_ERROR_FILENAME,
    EXTRACT_OUTPUT_FILENAME,
};
pub use engine::EngineHandle;
pub use filter::{
    filter_file, filter_records, run_filter, FileFilterOutcome, FilterCriteria, FilterError,
    FilterSettings, MatchMode, FILTERED_OUTPUT_FILENAME,
};
pub use persist::{append_text, ensure_output_dir, AtomicFileWriter, PersistError};
pub use scan::{compare_folder_names, compare_paths, dirs_containing, find_named_files, immediate_subdirs};
pub use tool::{
    CommandTemplate, SystemToolInvoker, ToolError, ToolInvoker, ToolOutput,
};
pub use types::{
    BatchSummary, ChannelEventSink, EngineEvent, EventSink, JobFailure, JobId, JobOutcome,
    Operation,
};
pub use writer::{
    run_write_back, WriteBackSettings, DEFAULT_WRITE_BACK_TEMPLATE, DIR_ERROR_FILENAME,
    TRANSCRIPT_FILENAME,
};
