use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_default_level, set_log_file,
};

use crate::{
    app::App,
    config::ConfigManager,
    sampler::{CounterSource, Family},
};

pub mod app;
pub mod codec;
pub mod command;
pub mod config;
pub mod event;
pub mod plot;
pub mod resample;
pub mod sampler;
pub mod ui;

#[derive(Parser, Debug)]
#[command(about)]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive sampler
    Run,
    /// Validate the configuration file and print the effective settings
    Validate,
    /// Read the counters once and print them
    Snapshot,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::Validate) => {
            let config = ConfigManager::load_from_file(&cli.config)?;
            print!("{}", toml::to_string(&config)?);
            Ok(())
        }
        Some(Commands::Snapshot) => {
            let source = ConfigManager::load_from_file(&cli.config)?.source();
            let cpu = source.read_cpu()?;
            for (key, value) in cpu.iter() {
                println!("{}.{} {}", Family::Cpu, key, value);
            }
            for (key, value) in source.read_vm()? {
                println!("{}.{} {}", Family::Vmstat, key, value);
            }
            Ok(())
        }
        Some(Commands::Run) | None => {
            let log_file = ConfigManager::load_from_file(&cli.config)?.log_file;
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new(&log_file)
                .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
                .output_file(false)
                .output_separator(':');
            set_log_file(file_options);
            info!(target: "App", "Logging started");
            let mut app = App::new(cli.config)?;
            set_default_level(tui_logger::LevelFilter::Debug);
            let terminal = ratatui::init();
            let result = app.run(terminal).await;
            ratatui::restore();
            result
        }
    }
}
