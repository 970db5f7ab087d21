use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use engine_logging::engine_error;

use crate::batch::{run_extraction, ExtractSettings};
use crate::filter::{run_filter, FilterCriteria, FilterSettings};
use crate::tool::{SystemToolInvoker, ToolInvoker};
use crate::types::{ChannelEventSink, EngineEvent, EventSink, Operation};
use crate::writer::{run_write_back, WriteBackSettings};

enum EngineCommand {
    Extract {
        root: PathBuf,
        settings: ExtractSettings,
    },
    Filter {
        root: PathBuf,
        criteria: FilterCriteria,
        settings: FilterSettings,
    },
    WriteBack {
        root: PathBuf,
        settings: WriteBackSettings,
    },
}

/// Handle to the engine's background thread. Commands are processed one at a
/// time in submission order; each batch blocks the engine thread until its
/// aggregate completion, so two batches never overlap.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    // Mutex so the handle can be shared behind an Arc while one thread drains
    // events.
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    /// Engine backed by real child-process invocations.
    pub fn new() -> Self {
        Self::with_invoker(Arc::new(SystemToolInvoker))
    }

    /// Engine with a caller-supplied tool invoker (used by tests).
    pub fn with_invoker(invoker: Arc<dyn ToolInvoker>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            while let Ok(command) = cmd_rx.recv() {
                handle_command(&invoker, &sink, command);
            }
        });

        Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        }
    }

    pub fn extract(&self, root: PathBuf, settings: ExtractSettings) {
        let _ = self.cmd_tx.send(EngineCommand::Extract { root, settings });
    }

    pub fn filter(&self, root: PathBuf, criteria: FilterCriteria, settings: FilterSettings) {
        let _ = self.cmd_tx.send(EngineCommand::Filter {
            root,
            criteria,
            settings,
        });
    }

    pub fn write_back(&self, root: PathBuf, settings: WriteBackSettings) {
        let _ = self.cmd_tx.send(EngineCommand::WriteBack { root, settings });
    }

    /// Blocks for the next engine event; `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv().ok()
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_command(
    invoker: &Arc<dyn ToolInvoker>,
    sink: &Arc<dyn EventSink>,
    command: EngineCommand,
) {
    match command {
        EngineCommand::Extract { root, settings } => {
            if let Err(err) = run_extraction(&root, &settings, invoker.clone(), sink.clone()) {
                engine_error!("Extraction batch failed to start: {}", err);
                sink.emit(EngineEvent::BatchFailed {
                    operation: Operation::Extract,
                    message: err.to_string(),
                });
            }
        }
        EngineCommand::Filter {
            root,
            criteria,
            settings,
        } => {
            run_filter(&root, &criteria, &settings, sink.clone());
        }
        EngineCommand::WriteBack { root, settings } => {
            if let Err(err) = run_write_back(&root, &settings, invoker.clone(), sink.clone()) {
                engine_error!("Write-back batch failed to start: {}", err);
                sink.emit(EngineEvent::BatchFailed {
                    operation: Operation::WriteBack,
                    message: err.to_string(),
                });
            }
        }
    }
}
