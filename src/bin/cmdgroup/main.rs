mod catalog;
mod mcp;
mod run;
mod serve;
mod transfer;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use cmdgroup::open_bridge;

#[derive(Parser, Debug)]
#[command(name = "cmdgroup", about = "Organize shell commands into groups and run them")]
struct Cli {
    /// Path to settings file (auto-detected if not specified)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog data file (defaults to the user data directory)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Log file path (enables file logging in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage command groups
    #[command(subcommand)]
    Group(catalog::GroupCommand),
    /// Manage commands within a group
    #[command(subcommand)]
    Cmd(catalog::CmdCommand),
    /// Run ad-hoc command text
    Exec(run::ExecArgs),
    /// Run a stored group, or a single command of it
    Run(run::RunArgs),
    /// Write the catalog as a JSON document
    Export(transfer::ExportArgs),
    /// Replace or merge the catalog from a JSON document
    Import(transfer::ImportArgs),
    /// Serve bridge requests as JSON lines over stdio
    Serve,
    /// Start an MCP server over stdio
    Mcp,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .as_ref()
        .map(std::fs::File::create)
        .transpose()?;
    cmdgroup::logger::init(log_file, log::LevelFilter::Warn)?;

    let (mut bridge, _) = open_bridge(cli.config.as_deref(), cli.data_file.as_deref())?;

    // Dispatch subcommands
    match cli.command {
        Some(Commands::Group(ref command)) => catalog::run_group(command, &mut bridge),
        Some(Commands::Cmd(ref command)) => catalog::run_cmd(command, &mut bridge),
        Some(Commands::Exec(ref args)) => run::exec(args, &bridge),
        Some(Commands::Run(ref args)) => run::run(args, &bridge),
        Some(Commands::Export(ref args)) => transfer::export(args, &bridge),
        Some(Commands::Import(ref args)) => transfer::import(args, &mut bridge),
        Some(Commands::Serve) => serve::run(&mut bridge),
        Some(Commands::Mcp) => mcp::run(bridge).await,
        None => catalog::print_catalog(&bridge),
    }
}
