
mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{merge, slice, validate};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Validate(args) => validate::run(&cli, args),
        Commands::Merge(args) => merge::run(&cli, args),
        Commands::Slice(args) => slice::run(&cli, args),
        #[cfg(feature = "download")]
        Commands::Fetch(args) => commands::fetch::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
