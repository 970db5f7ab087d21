use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Also write logs to ./metascrub.log
    #[arg(long)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump metadata for every immediate subfolder of the root
    Extract {
        /// Photo-library root folder
        #[arg(value_name = "DIR")]
        root: PathBuf,

        /// Command template for the external tool, e.g. "exiftool -json -r"
        #[arg(long, value_name = "TEMPLATE")]
        command: String,
    },
    /// Strip matching tag values from the extracted metadata dumps
    Filter {
        /// Photo-library root folder
        #[arg(value_name = "DIR")]
        root: PathBuf,

        /// Words marking a list item for removal, separated by comma
        #[arg(long, value_name = "w1,w2")]
        remove: String,

        /// Strings that protect an item from removal, separated by comma
        #[arg(long, value_name = "c1,c2", default_value = "")]
        keep: String,

        /// Match remove-words at word boundaries instead of as substrings
        #[arg(long)]
        word_boundary: bool,
    },
    /// Apply filtered metadata back onto the image files
    Writeback {
        /// Photo-library root folder
        #[arg(value_name = "DIR")]
        root: PathBuf,

        /// Override the default write-back command template
        #[arg(long, value_name = "TEMPLATE")]
        command: Option<String>,
    },
    /// Run extract, filter and write-back in sequence
    Run {
        /// Photo-library root folder
        #[arg(value_name = "DIR")]
        root: PathBuf,

        /// Extraction command template
        #[arg(long, value_name = "TEMPLATE")]
        command: String,

        /// Words marking a list item for removal, separated by comma
        #[arg(long, value_name = "w1,w2")]
        remove: String,

        /// Strings that protect an item from removal, separated by comma
        #[arg(long, value_name = "c1,c2", default_value = "")]
        keep: String,
    },
}
