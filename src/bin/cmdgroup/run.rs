use std::process::ExitCode;

use clap::Args;

use cmdgroup::bridge::Bridge;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Shell command text to run
    command: String,

    /// Launch in the background and return immediately
    #[arg(long)]
    detached: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Id of the group to run
    group_id: String,

    /// Run only this command of the group
    command_id: Option<String>,
}

/// Run ad-hoc command text and print its output.
///
/// # Errors
///
/// Returns the bridge error if the command fails or cannot be launched.
pub fn exec(args: &ExecArgs, bridge: &Bridge) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let output = if args.detached {
        bridge.execute_command_detached(&args.command)?
    } else {
        bridge.execute_command(&args.command)?
    };
    println!("{output}");
    Ok(ExitCode::SUCCESS)
}

/// Run a stored group (or one of its commands), printing each result under its name.
///
/// # Errors
///
/// Returns the bridge error if the group or command is unknown, or a single command
/// fails. Failures inside a group run only affect the exit code.
pub fn run(args: &RunArgs, bridge: &Bridge) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if let Some(ref command_id) = args.command_id {
        println!(
            "{}",
            bridge.execute_stored_command(&args.group_id, command_id)?
        );
        return Ok(ExitCode::SUCCESS);
    }

    let results = bridge.execute_group_commands(&args.group_id)?;
    let mut failed = 0usize;
    for entry in &results {
        let marker = if entry.success { "==>" } else { "!!>" };
        println!("{marker} {}", entry.name);
        if !entry.output.is_empty() {
            println!("{}", entry.output);
        }
        if !entry.success {
            failed += 1;
        }
    }
    eprintln!("{} commands: {failed} failed", results.len());

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
