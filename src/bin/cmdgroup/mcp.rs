use std::process::ExitCode;

use cmdgroup::bridge::Bridge;

/// Start the MCP server over stdio.
///
/// # Errors
///
/// Returns an error if the MCP transport fails.
pub async fn run(bridge: Bridge) -> Result<ExitCode, Box<dyn std::error::Error>> {
    cmdgroup::mcp::run(bridge).await?;
    Ok(ExitCode::SUCCESS)
}
