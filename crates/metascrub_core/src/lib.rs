//! Metascrub core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, BatchReport, JobId, JobResultKind, Operation, SessionState, Stage};
pub use update::{parse_word_list, update};
pub use view_model::{AppViewModel, BatchReportView, JobRowView};
