use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;

use cmdgroup::bridge::Bridge;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write the document to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Document to import, or `-` for stdin
    input: PathBuf,

    /// Merge into the existing catalog instead of replacing it
    #[arg(long)]
    merge: bool,
}

/// Export the catalog.
///
/// # Errors
///
/// Returns the bridge error if the document cannot be serialized or written.
pub fn export(args: &ExportArgs, bridge: &Bridge) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let result = bridge.export_data(args.output.as_deref())?;
    if args.output.is_some() {
        eprintln!("{}", result.message);
    } else {
        println!("{}", result.document);
    }
    Ok(ExitCode::SUCCESS)
}

/// Import a catalog document from a file or stdin.
///
/// # Errors
///
/// Returns an IO error if the input cannot be read, or the bridge error if the document
/// is malformed or cannot be saved.
pub fn import(
    args: &ImportArgs,
    bridge: &mut Bridge,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let data = if args.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&args.input)?
    };
    eprintln!("{}", bridge.import_data(&data, args.merge)?);
    Ok(ExitCode::SUCCESS)
}
