use crate::{AppState, Effect, Msg, Operation, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RootSelected(root) => {
            state.set_root(root);
            Vec::new()
        }
        Msg::CommandTemplateChanged(template) => {
            state.set_command_template(template);
            Vec::new()
        }
        Msg::RemoveWordsChanged(words) => {
            state.set_remove_words(words);
            Vec::new()
        }
        Msg::KeepExceptionsChanged(words) => {
            state.set_keep_exceptions(words);
            Vec::new()
        }
        Msg::ExtractRequested => {
            if state.session() != SessionState::Idle {
                return (state, Vec::new());
            }
            let Some(root) = state.root().map(ToOwned::to_owned) else {
                state.set_error("No folder selected.");
                return (state, Vec::new());
            };
            let template = state.command_template().trim().to_owned();
            if template.is_empty() {
                state.set_error("Command template is empty.");
                return (state, Vec::new());
            }
            state.begin_batch(Operation::Extract);
            vec![Effect::StartExtraction {
                root,
                command_template: template,
            }]
        }
        Msg::FilterRequested => {
            if state.session() != SessionState::Idle {
                return (state, Vec::new());
            }
            let Some(root) = state.root().map(ToOwned::to_owned) else {
                state.set_error("No folder selected.");
                return (state, Vec::new());
            };
            let remove_words = parse_word_list(state.remove_words_input());
            if remove_words.is_empty() {
                state.set_error("Remove-word list is empty.");
                return (state, Vec::new());
            }
            let keep_exceptions = parse_word_list(state.keep_exceptions_input());
            state.begin_batch(Operation::Filter);
            vec![Effect::StartFilter {
                root,
                remove_words,
                keep_exceptions,
            }]
        }
        Msg::WriteBackRequested => {
            if state.session() != SessionState::Idle {
                return (state, Vec::new());
            }
            let Some(root) = state.root().map(ToOwned::to_owned) else {
                state.set_error("No folder selected.");
                return (state, Vec::new());
            };
            state.begin_batch(Operation::WriteBack);
            vec![Effect::StartWriteBack { root }]
        }
        Msg::BatchStarted { total } => {
            state.apply_batch_started(total);
            Vec::new()
        }
        Msg::JobStarted { job_id, label } => {
            state.apply_job_started(job_id, label);
            Vec::new()
        }
        Msg::JobDone { job_id, result } => {
            state.apply_job_done(job_id, result);
            Vec::new()
        }
        Msg::BatchFinished(report) => {
            state.apply_batch_finished(report);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Splits a comma-separated user entry into trimmed, non-empty words.
pub fn parse_word_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
