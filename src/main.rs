use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_default_level, set_log_file,
};

use crate::{app::App, config::WatchConfig};

pub mod app;
pub mod config;
pub mod event;
pub mod headless;
pub mod ui;
pub mod watch;

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
    /// Monitor with the interactive dashboard
    Run,
    /// Monitor without a terminal UI, alerts on stdout
    Watch,
    /// Validate the configuration file
    Validate,
    /// Print the default configuration
    Defaults,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::Validate) => {
            WatchConfig::load(cli.config.clone())?;
            println!("{} is valid", cli.config.display());
            Ok(())
        }
        Some(Commands::Defaults) => {
            print!("{}", WatchConfig::default().to_toml()?);
            Ok(())
        }
        Some(Commands::Watch) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
            let config = WatchConfig::load(cli.config)?;
            headless::run(config).await
        }
        Some(Commands::Run) | None => {
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new("procwatch.log")
                .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
                .output_file(false)
                .output_separator(':');
            set_log_file(file_options);
            info!("Logging started");
            let config = WatchConfig::load(cli.config)?;
            let mut app = App::new(config)?;
            set_default_level(tui_logger::LevelFilter::Info);
            let terminal = ratatui::init();
            let result = app.run(terminal).await;
            ratatui::restore();
            result
        }
    }
}
