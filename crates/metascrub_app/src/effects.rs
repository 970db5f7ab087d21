use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use engine_logging::{engine_error, engine_info, engine_warn};
use metascrub_core::{BatchReport, Effect, JobResultKind, Msg, Operation};
use metascrub_engine::{
    BatchSummary, EngineEvent, EngineHandle, ExtractSettings, FilterCriteria, FilterSettings,
    MatchMode, WriteBackSettings,
};

/// App-level choices that are not part of the core state machine.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub match_mode: MatchMode,
    pub write_back_template: Option<String>,
}

/// Executes core effects against the engine and feeds engine events back into
/// the message loop.
pub struct EffectRunner {
    engine: Arc<EngineHandle>,
    msg_tx: mpsc::Sender<Msg>,
    options: RunnerOptions,
}

impl EffectRunner {
    pub fn new(msg_tx: mpsc::Sender<Msg>, options: RunnerOptions) -> Self {
        let engine = Arc::new(EngineHandle::new());
        spawn_event_loop(Arc::clone(&engine), msg_tx.clone());
        Self {
            engine,
            msg_tx,
            options,
        }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartExtraction {
                    root,
                    command_template,
                } => {
                    engine_info!("StartExtraction root={:?}", root);
                    self.engine
                        .extract(root, ExtractSettings::new(command_template));
                }
                Effect::StartFilter {
                    root,
                    remove_words,
                    keep_exceptions,
                } => {
                    engine_info!(
                        "StartFilter root={:?} remove_words={}",
                        root,
                        remove_words.len()
                    );
                    let criteria = match self.options.match_mode {
                        MatchMode::Substring => {
                            Ok(FilterCriteria::substring(remove_words, keep_exceptions))
                        }
                        MatchMode::WordBoundary => {
                            FilterCriteria::word_boundary(remove_words, keep_exceptions)
                        }
                    };
                    match criteria {
                        Ok(criteria) => {
                            self.engine
                                .filter(root, criteria, FilterSettings::default());
                        }
                        Err(err) => {
                            engine_error!("Invalid filter criteria: {}", err);
                            let _ = self
                                .msg_tx
                                .send(Msg::BatchFinished(failed_report(Operation::Filter)));
                        }
                    }
                }
                Effect::StartWriteBack { root } => {
                    engine_info!("StartWriteBack root={:?}", root);
                    let mut settings = WriteBackSettings::default();
                    if let Some(template) = &self.options.write_back_template {
                        settings.command_template = template.clone();
                    }
                    self.engine.write_back(root, settings);
                }
            }
        }
    }
}

fn spawn_event_loop(engine: Arc<EngineHandle>, msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while let Some(event) = engine.recv() {
            let msg = match event {
                EngineEvent::BatchStarted { total, .. } => Some(Msg::BatchStarted { total }),
                EngineEvent::JobStarted { job_id, label } => {
                    Some(Msg::JobStarted { job_id, label })
                }
                EngineEvent::JobOutput { job_id, text } => {
                    engine_info!("Job {} output:\n{}", job_id, text.trim_end());
                    None
                }
                EngineEvent::JobCompleted { job_id, result } => {
                    let kind = match &result {
                        Ok(_) => JobResultKind::Success,
                        Err(failure) => {
                            engine_warn!("Job {} failed: {}", job_id, failure.message);
                            JobResultKind::Failed
                        }
                    };
                    Some(Msg::JobDone {
                        job_id,
                        result: kind,
                    })
                }
                EngineEvent::BatchCompleted(summary) => {
                    Some(Msg::BatchFinished(map_summary(summary)))
                }
                EngineEvent::BatchFailed { operation, message } => {
                    engine_error!("Batch failed to start: {}", message);
                    Some(Msg::BatchFinished(failed_report(map_operation(operation))))
                }
            };
            if let Some(msg) = msg {
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
        }
    });
}

fn map_operation(operation: metascrub_engine::Operation) -> Operation {
    match operation {
        metascrub_engine::Operation::Extract => Operation::Extract,
        metascrub_engine::Operation::Filter => Operation::Filter,
        metascrub_engine::Operation::WriteBack => Operation::WriteBack,
    }
}

fn map_summary(summary: BatchSummary) -> BatchReport {
    BatchReport {
        operation: map_operation(summary.operation),
        submitted: summary.submitted,
        succeeded: summary.succeeded,
        failed: summary.failed,
        removed_items: summary.removed_items,
        error_log: summary.error_log,
    }
}

/// Report for a batch that never got its jobs off the ground; the batch
/// itself counts as the single failed unit.
fn failed_report(operation: Operation) -> BatchReport {
    BatchReport {
        operation,
        submitted: 0,
        succeeded: 0,
        failed: 1,
        removed_items: 0,
        error_log: None,
    }
}
