use std::path::PathBuf;
use std::sync::Once;

use metascrub_core::{
    parse_word_list, update, AppState, Effect, Msg, Operation, SessionState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn with_root(state: AppState) -> AppState {
    let (state, effects) = update(state, Msg::RootSelected(PathBuf::from("/photos")));
    assert!(effects.is_empty());
    state
}

#[test]
fn extract_without_root_is_rejected_synchronously() {
    init_logging();
    let state = AppState::new();
    let (state, effects) = update(state, Msg::ExtractRequested);

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("No folder selected.")
    );
}

#[test]
fn extract_with_empty_template_is_rejected_synchronously() {
    init_logging();
    let state = with_root(AppState::new());
    let (state, effects) = update(state, Msg::CommandTemplateChanged("   ".into()));
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::ExtractRequested);
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("Command template is empty.")
    );
}

#[test]
fn extract_starts_a_session_and_emits_the_effect() {
    init_logging();
    let state = with_root(AppState::new());
    let (state, _) = update(state, Msg::CommandTemplateChanged("exiftool -json -r".into()));
    let (state, effects) = update(state, Msg::ExtractRequested);

    assert_eq!(state.session(), SessionState::Running(Operation::Extract));
    assert_eq!(
        effects,
        vec![Effect::StartExtraction {
            root: PathBuf::from("/photos"),
            command_template: "exiftool -json -r".into(),
        }]
    );
}

#[test]
fn triggers_are_ignored_while_a_batch_is_running() {
    init_logging();
    let state = with_root(AppState::new());
    let (state, _) = update(state, Msg::CommandTemplateChanged("exiftool -json".into()));
    let (state, _) = update(state, Msg::ExtractRequested);
    assert_eq!(state.session(), SessionState::Running(Operation::Extract));

    let (state, effects) = update(state, Msg::WriteBackRequested);
    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Running(Operation::Extract));
}

#[test]
fn filter_parses_word_lists_into_the_effect() {
    init_logging();
    let state = with_root(AppState::new());
    let (state, _) = update(state, Msg::RemoveWordsChanged("People, Private ,".into()));
    let (state, _) = update(state, Msg::KeepExceptionsChanged("/,|".into()));
    let (state, effects) = update(state, Msg::FilterRequested);

    assert_eq!(state.session(), SessionState::Running(Operation::Filter));
    assert_eq!(
        effects,
        vec![Effect::StartFilter {
            root: PathBuf::from("/photos"),
            remove_words: vec!["People".into(), "Private".into()],
            keep_exceptions: vec!["/".into(), "|".into()],
        }]
    );
}

#[test]
fn filter_with_no_remove_words_is_rejected() {
    init_logging();
    let state = with_root(AppState::new());
    let (state, effects) = update(state, Msg::FilterRequested);

    assert!(effects.is_empty());
    assert_eq!(state.session(), SessionState::Idle);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("Remove-word list is empty.")
    );
}

#[test]
fn word_list_parsing_trims_and_drops_empties() {
    init_logging();
    assert_eq!(parse_word_list(" a , b,, c "), vec!["a", "b", "c"]);
    assert!(parse_word_list("  ,, ").is_empty());
}
