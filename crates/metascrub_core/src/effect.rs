use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartExtraction {
        root: PathBuf,
        command_template: String,
    },
    StartFilter {
        root: PathBuf,
        remove_words: Vec<String>,
        keep_exceptions: Vec<String>,
    },
    StartWriteBack {
        root: PathBuf,
    },
}
