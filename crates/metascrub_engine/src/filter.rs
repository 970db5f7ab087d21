use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use engine_logging::engine_info;
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::batch::{empty_summary, BatchContext, BatchTracker};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::scan::find_named_files;
use crate::types::{BatchSummary, EngineEvent, EventSink, JobFailure, JobId, JobOutcome, Operation};

/// Filtered copy written next to each extracted metadata dump.
pub const FILTERED_OUTPUT_FILENAME: &str = "modified.json";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("top level of {path} is not an array")]
    NotAnArray { path: PathBuf },
    #[error("failed to serialize filtered records for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("invalid word-boundary pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// How remove-words are matched against list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Plain substring containment. The default behavior.
    #[default]
    Substring,
    /// Remove-words must match at word boundaries. Alternate behavior carried
    /// over from the standalone filtering script.
    WordBoundary,
}

/// Caller-supplied criteria for one filter run.
///
/// An item is dropped only when it matches a remove-word AND contains none of
/// the keep-exception strings. Both checks are containment tests, not
/// whole-value comparisons.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    remove_words: Vec<String>,
    keep_exceptions: Vec<String>,
    matchers: Vec<Regex>,
    mode: MatchMode,
}

impl FilterCriteria {
    /// Substring-matching criteria (the default mode).
    pub fn substring(remove_words: Vec<String>, keep_exceptions: Vec<String>) -> Self {
        Self {
            remove_words,
            keep_exceptions,
            matchers: Vec::new(),
            mode: MatchMode::Substring,
        }
    }

    /// Word-boundary criteria: each remove-word only matches as a whole word.
    pub fn word_boundary(
        remove_words: Vec<String>,
        keep_exceptions: Vec<String>,
    ) -> Result<Self, FilterError> {
        let matchers = remove_words
            .iter()
            .map(|word| Regex::new(&format!(r"\b{}\b", regex::escape(word))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            remove_words,
            keep_exceptions,
            matchers,
            mode: MatchMode::WordBoundary,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn remove_words(&self) -> &[String] {
        &self.remove_words
    }

    fn matches_remove_word(&self, item: &str) -> bool {
        match self.mode {
            MatchMode::Substring => self.remove_words.iter().any(|word| item.contains(word)),
            MatchMode::WordBoundary => self.matchers.iter().any(|re| re.is_match(item)),
        }
    }

    fn matches_keep_exception(&self, item: &str) -> bool {
        self.keep_exceptions.iter().any(|ex| item.contains(ex))
    }

    /// The AND-of-two-conditions rule: remove-word present, no exception present.
    pub fn should_remove(&self, item: &str) -> bool {
        self.matches_remove_word(item) && !self.matches_keep_exception(item)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSettings {
    pub input_filename: String,
    pub output_filename: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            input_filename: crate::batch::EXTRACT_OUTPUT_FILENAME.to_string(),
            output_filename: FILTERED_OUTPUT_FILENAME.to_string(),
        }
    }
}

/// Drops matching items from every array-valued field of every record.
/// Returns the number of removed items. Pure: no IO, no hidden state.
///
/// Scalar fields and non-string array items are never modified; a record
/// whose field value is not an array is left untouched.
pub fn filter_records(records: &mut [Value], criteria: &FilterCriteria) -> u64 {
    let mut removed = 0;
    for record in records.iter_mut() {
        let Some(fields) = record.as_object_mut() else {
            continue;
        };
        for value in fields.values_mut() {
            let Some(items) = value.as_array_mut() else {
                continue;
            };
            items.retain(|item| match item.as_str() {
                Some(text) => {
                    if criteria.should_remove(text) {
                        removed += 1;
                        false
                    } else {
                        true
                    }
                }
                None => true,
            });
        }
    }
    removed
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilterOutcome {
    pub removed_items: u64,
    pub output_path: PathBuf,
}

/// Filters one extracted metadata file and writes the result to a sibling
/// file, leaving the input untouched. Any failure counts the whole file as
/// one failed unit.
pub fn filter_file(
    input: &Path,
    criteria: &FilterCriteria,
    output_filename: &str,
) -> Result<FileFilterOutcome, FilterError> {
    let text = std::fs::read_to_string(input).map_err(|source| FilterError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| FilterError::Parse {
        path: input.to_path_buf(),
        source,
    })?;
    let Value::Array(mut records) = value else {
        return Err(FilterError::NotAnArray {
            path: input.to_path_buf(),
        });
    };

    let removed_items = filter_records(&mut records, criteria);

    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let content =
        serde_json::to_string(&Value::Array(records)).map_err(|source| FilterError::Serialize {
            path: input.to_path_buf(),
            source,
        })?;
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let output_path = writer.write(output_filename, &content)?;

    Ok(FileFilterOutcome {
        removed_items,
        output_path,
    })
}

/// Runs the filter pass over every extracted metadata file under `root`.
///
/// Files are independent units with no shared mutable state beyond the batch
/// tracker, so they are processed data-parallel. Blocks until all files
/// reported completion.
pub fn run_filter(
    root: &Path,
    criteria: &FilterCriteria,
    settings: &FilterSettings,
    sink: Arc<dyn EventSink>,
) -> BatchSummary {
    let files = find_named_files(root, &settings.input_filename);
    let total = files.len();
    engine_info!(
        "Filter batch: {} metadata files under {:?} ({:?} mode)",
        total,
        root,
        criteria.mode()
    );
    sink.emit(EngineEvent::BatchStarted {
        operation: Operation::Filter,
        total,
    });

    if total == 0 {
        let summary = empty_summary(Operation::Filter);
        sink.emit(EngineEvent::BatchCompleted(summary.clone()));
        return summary;
    }

    let context = Arc::new(BatchContext {
        tracker: BatchTracker::new(total),
        sink,
        root: root.to_path_buf(),
        final_summary: Mutex::new(None),
    });
    let removed_total = AtomicU64::new(0);

    let jobs: Vec<(JobId, PathBuf)> = files
        .into_iter()
        .enumerate()
        .map(|(index, path)| ((index + 1) as JobId, path))
        .collect();

    jobs.par_iter().for_each(|(job_id, path)| {
        run_filter_job(
            &context,
            &removed_total,
            *job_id,
            path,
            criteria,
            &settings.output_filename,
        );
    });

    context
        .final_summary
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_else(|| empty_summary(Operation::Filter))
}

fn run_filter_job(
    context: &BatchContext,
    removed_total: &AtomicU64,
    job_id: JobId,
    path: &Path,
    criteria: &FilterCriteria,
    output_filename: &str,
) {
    let label = path.display().to_string();
    context.sink.emit(EngineEvent::JobStarted {
        job_id,
        label: label.clone(),
    });

    let result = match filter_file(path, criteria, output_filename) {
        Ok(outcome) => {
            removed_total.fetch_add(outcome.removed_items, Ordering::AcqRel);
            Ok(JobOutcome {
                label,
                removed_items: outcome.removed_items,
            })
        }
        Err(err) => {
            let message = format!("Error processing file: {}\n{}", path.display(), err);
            context.tracker.record_error(message.clone());
            Err(JobFailure { label, message })
        }
    };
    context.sink.emit(EngineEvent::JobCompleted { job_id, result });

    if context.tracker.complete_one() {
        crate::batch::finish_batch(context, Operation::Filter, removed_total.load(Ordering::Acquire));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criteria(remove: &[&str], keep: &[&str]) -> FilterCriteria {
        FilterCriteria::substring(
            remove.iter().map(|s| s.to_string()).collect(),
            keep.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn item_survives_when_exception_present() {
        let c = criteria(&["People"], &["/", "|"]);
        assert!(!c.should_remove("People/John"));
        assert!(c.should_remove("People"));
        assert!(!c.should_remove("John Smith"));
    }

    #[test]
    fn scalar_fields_are_untouched() {
        let mut records = vec![json!({"Title": "People of Earth", "Rating": 5})];
        let removed = filter_records(&mut records, &criteria(&["People"], &[]));
        assert_eq!(removed, 0);
        assert_eq!(records[0]["Title"], "People of Earth");
    }

    #[test]
    fn non_string_array_items_are_kept() {
        let mut records = vec![json!({"Numbers": [1, 2, 3]})];
        let removed = filter_records(&mut records, &criteria(&["1"], &[]));
        assert_eq!(removed, 0);
        assert_eq!(records[0]["Numbers"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn word_boundary_mode_requires_whole_words() {
        let c = FilterCriteria::word_boundary(vec!["People".into()], Vec::new()).unwrap();
        assert!(c.should_remove("People here"));
        assert!(!c.should_remove("Peoples"));
    }
}
