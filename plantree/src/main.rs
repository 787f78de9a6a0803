//! plantree: browse a Terraform plan as a tree before confirming it.
//!
//! `terraform plan | plantree` shows a piped plan; `plantree terraform apply`
//! runs the command, shows its plan, and answers its confirmation question
//! only through the dialog.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use plantree::exit_codes;
use plantree::io::config::{PlantreeConfig, default_config_path, load_config};
use plantree::logging;
use plantree::session::{SessionOptions, Source, run_session};
use plantree::ui::TerminalFrontend;

#[derive(Parser, Debug)]
#[command(
    name = "plantree",
    version,
    about = "Show Terraform plan output as a collapsible tree with a guarded confirmation"
)]
struct Cli {
    /// Config file (default: ~/.config/plantree/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr (or set PLANTREE_LOG).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Do not show the tree; pending confirmations are declined.
    #[arg(long)]
    no_ui: bool,

    /// Command to run. Without one, plan output is read from stdin.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("plantree: {:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| std::env::var_os(logging::LOG_FILE_ENV).map(PathBuf::from));
    logging::init(log_file.as_deref())?;

    let config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => load_config(&path)?,
        None => PlantreeConfig::default(),
    };
    let options = SessionOptions {
        start_expanded: config.start_expanded,
        interactive: !cli.no_ui && io::stdout().is_terminal(),
    };
    debug!(?options, command = ?cli.command, "starting session");

    let source = if cli.command.is_empty() {
        Source::Reader(Box::new(io::stdin()))
    } else {
        Source::Command(cli.command)
    };

    let mut frontend = TerminalFrontend::new(config);
    run_session(
        source,
        &options,
        &mut frontend,
        &mut io::stdout(),
        &mut io::stderr(),
    )
}
