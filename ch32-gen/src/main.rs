mod board_config;
mod build_plan;
mod catalog;
mod commands;
mod generate;
mod linker;
mod logging;
mod patch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::board_config::{BoardConfig, ConfigOverride};
use crate::logging::{setup_logging, LevelFilter};

#[derive(Parser)]
#[clap(
    name = "ch32-gen",
    about = "Generate board definitions and linker scripts for WCH CH32V boards",
    version
)]
struct Cli {
    /// Log level, overrides `RUST_LOG`.
    #[clap(long, global = true, value_enum)]
    log_level: Option<LevelFilter>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a board definition for every chip and known board in the catalog.
    ///
    /// Each generated definition is logged at INFO, which is the default level
    /// of this command. Pass `--log-level WARN` to only see the summary.
    Boards {
        /// A catalog file replacing the built-in chip table.
        #[clap(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
        /// An output directory where all the generated .json files are put in.
        output_dir: PathBuf,
    },
    /// List the chips of the catalog.
    Chips {
        /// A catalog file replacing the built-in chip table.
        #[clap(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
    /// Render the linker script for a board and print its path.
    Link(BuildArgs),
    /// Print what has to be built for a board, as JSON.
    ///
    /// Renders the linker script unless the board names one.
    Configure(BuildArgs),
}

#[derive(clap::Args)]
pub(crate) struct BuildArgs {
    /// The board definition (.json) to build for.
    #[clap(long, value_name = "FILE")]
    board: PathBuf,
    /// A TOML file with project specific board settings.
    #[clap(long, value_name = "FILE")]
    project: Option<PathBuf>,
    /// Override a board setting, e.g. `--set build.use_lto=yes`.
    #[clap(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<ConfigOverride>,
    /// The SDK directory, containing `platformio/ldscripts/Link.tpl`.
    #[clap(long, value_name = "DIR")]
    framework_dir: PathBuf,
    /// The directory the linker script is rendered into.
    #[clap(long, value_name = "DIR")]
    build_dir: PathBuf,
}

impl BuildArgs {
    fn board_config(&self) -> Result<BoardConfig> {
        BoardConfig::load(&self.board, self.project.as_deref(), &self.overrides).context(format!(
            "Failed to load the board configuration '{}'.",
            self.board.display()
        ))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let fallback = match cli.command {
        Command::Boards { .. } => LevelFilter::Info,
        _ => LevelFilter::Warn,
    };
    setup_logging(cli.log_level, fallback);

    match cli.command {
        Command::Boards {
            catalog,
            output_dir,
        } => commands::boards::cmd_boards(catalog.as_deref(), &output_dir)?,
        Command::Chips { catalog } => commands::chips::cmd_chips(catalog.as_deref())?,
        Command::Link(args) => {
            ensure_dir(&args.build_dir)?;
            commands::link::cmd_link(&args)?
        }
        Command::Configure(args) => {
            ensure_dir(&args.build_dir)?;
            commands::configure::cmd_configure(&args)?
        }
    }

    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .context(format!("Failed to create directory '{}'.", dir.display()))?;
    }

    Ok(())
}
