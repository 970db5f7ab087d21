mod app;
mod cli;
mod effects;
mod logging;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let destination = if cli.log_file {
        logging::LogDestination::Both
    } else {
        logging::LogDestination::Terminal
    };
    logging::initialize(destination);
    app::run(cli)
}
