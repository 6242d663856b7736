use std::process::ExitCode;

use clap::{Args, Subcommand};

use cmdgroup::bridge::Bridge;

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a new empty group and print its id
    Add(GroupAddArgs),
    /// List all groups and their commands
    List,
    /// Delete a group and all of its commands
    Rm(GroupRmArgs),
}

#[derive(Args, Debug)]
pub struct GroupAddArgs {
    /// Display name of the group
    name: String,
}

#[derive(Args, Debug)]
pub struct GroupRmArgs {
    /// Id of the group to delete
    group_id: String,
}

#[derive(Subcommand, Debug)]
pub enum CmdCommand {
    /// Append a command to a group and print its id
    Add(CmdAddArgs),
    /// Remove a command from a group
    Rm(CmdRmArgs),
}

#[derive(Args, Debug)]
pub struct CmdAddArgs {
    /// Id of the owning group
    group_id: String,
    /// Display name of the command
    name: String,
    /// Shell command text
    command: String,
    /// Launch in the background without waiting for completion
    #[arg(long)]
    detached: bool,
}

#[derive(Args, Debug)]
pub struct CmdRmArgs {
    /// Id of the owning group
    group_id: String,
    /// Id of the command to remove
    command_id: String,
}

/// Print every group with its commands.
///
/// # Errors
///
/// Never fails; the signature matches the other subcommands.
pub fn print_catalog(bridge: &Bridge) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let catalog = bridge.get_groups();
    if catalog.is_empty() {
        eprintln!("No groups yet. Create one with `cmdgroup group add <name>`.");
        return Ok(ExitCode::SUCCESS);
    }
    for group in &catalog.groups {
        println!("{} ({})", group.name, group.id);
        for cmd in &group.commands {
            let detached = if cmd.is_detached { " [detached]" } else { "" };
            println!("  {} ({}){detached}: {}", cmd.name, cmd.id, cmd.command);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Run a `group` subcommand.
///
/// # Errors
///
/// Returns the bridge error if the operation fails.
pub fn run_group(
    command: &GroupCommand,
    bridge: &mut Bridge,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        GroupCommand::Add(args) => println!("{}", bridge.create_group(&args.name)?),
        GroupCommand::List => return print_catalog(bridge),
        GroupCommand::Rm(args) => bridge.delete_group(&args.group_id)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Run a `cmd` subcommand.
///
/// # Errors
///
/// Returns the bridge error if the operation fails.
pub fn run_cmd(
    command: &CmdCommand,
    bridge: &mut Bridge,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        CmdCommand::Add(args) => println!(
            "{}",
            bridge.add_command_to_group(&args.group_id, &args.name, &args.command, args.detached)?
        ),
        CmdCommand::Rm(args) => {
            bridge.delete_command_from_group(&args.group_id, &args.command_id)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
