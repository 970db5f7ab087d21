use std::sync::mpsc;

use anyhow::bail;
use metascrub_core::{update, AppState, BatchReportView, Msg, Operation, SessionState};
use metascrub_engine::MatchMode;

use crate::cli::{Cli, Command};
use crate::effects::{EffectRunner, RunnerOptions};

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Extract { root, command } => {
            let mut app = App::new(RunnerOptions::default());
            app.dispatch(Msg::RootSelected(root));
            app.dispatch(Msg::CommandTemplateChanged(command));
            let report = app.run_operation(Msg::ExtractRequested)?;
            finish(&[report])
        }
        Command::Filter {
            root,
            remove,
            keep,
            word_boundary,
        } => {
            let options = RunnerOptions {
                match_mode: if word_boundary {
                    MatchMode::WordBoundary
                } else {
                    MatchMode::Substring
                },
                write_back_template: None,
            };
            let mut app = App::new(options);
            app.dispatch(Msg::RootSelected(root));
            app.dispatch(Msg::RemoveWordsChanged(remove));
            app.dispatch(Msg::KeepExceptionsChanged(keep));
            let report = app.run_operation(Msg::FilterRequested)?;
            finish(&[report])
        }
        Command::Writeback { root, command } => {
            let options = RunnerOptions {
                match_mode: MatchMode::default(),
                write_back_template: command,
            };
            let mut app = App::new(options);
            app.dispatch(Msg::RootSelected(root));
            let report = app.run_operation(Msg::WriteBackRequested)?;
            finish(&[report])
        }
        Command::Run {
            root,
            command,
            remove,
            keep,
        } => {
            let mut app = App::new(RunnerOptions::default());
            app.dispatch(Msg::RootSelected(root));
            app.dispatch(Msg::CommandTemplateChanged(command));
            app.dispatch(Msg::RemoveWordsChanged(remove));
            app.dispatch(Msg::KeepExceptionsChanged(keep));
            let extract = app.run_operation(Msg::ExtractRequested)?;
            let filter = app.run_operation(Msg::FilterRequested)?;
            let write_back = app.run_operation(Msg::WriteBackRequested)?;
            finish(&[extract, filter, write_back])
        }
    }
}

/// CLI shell around the core state machine: dispatches messages, hands
/// resulting effects to the runner, and blocks on engine events until the
/// running batch reports completion.
struct App {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl App {
    fn new(options: RunnerOptions) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        let runner = EffectRunner::new(msg_tx, options);
        Self {
            state: AppState::new(),
            runner,
            msg_rx,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Triggers one batch operation and pumps engine messages until the core
    /// transitions back to idle.
    fn run_operation(&mut self, trigger: Msg) -> anyhow::Result<BatchReportView> {
        self.dispatch(trigger);
        if self.state.session() == SessionState::Idle {
            // Precondition rejected before any work started.
            let view = self.state.view();
            bail!(view
                .last_error
                .unwrap_or_else(|| "operation did not start".to_string()));
        }

        while matches!(self.state.session(), SessionState::Running(_)) {
            match self.msg_rx.recv() {
                Ok(msg) => self.dispatch(msg),
                Err(_) => bail!("engine stopped unexpectedly"),
            }
        }

        self.state
            .view()
            .last_report
            .ok_or_else(|| anyhow::anyhow!("batch finished without a report"))
    }
}

fn finish(reports: &[BatchReportView]) -> anyhow::Result<()> {
    let mut failed = 0;
    for report in reports {
        print_report(report);
        failed += report.failed;
    }
    if failed > 0 {
        bail!("{failed} error(s) occurred. Check the error log for details.");
    }
    println!("Processing completed successfully.");
    Ok(())
}

fn print_report(report: &BatchReportView) {
    let name = operation_name(report.operation);
    match report.operation {
        Operation::Filter => println!(
            "{name}: {} file(s), {} succeeded, {} failed, {} item(s) removed",
            report.submitted, report.succeeded, report.failed, report.removed_items
        ),
        _ => println!(
            "{name}: {} folder(s), {} succeeded, {} failed",
            report.submitted, report.succeeded, report.failed
        ),
    }
    if let Some(log) = &report.error_log {
        println!("  error details: {log}");
    }
}

fn operation_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Extract => "extract",
        Operation::Filter => "filter",
        Operation::WriteBack => "write-back",
    }
}
