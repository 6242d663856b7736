use std::process::ExitCode;

use log::info;

use cmdgroup::bridge::Bridge;

/// Serve JSON-line bridge requests on stdin/stdout until stdin closes.
///
/// # Errors
///
/// Returns an error if stdin or stdout fails.
pub fn run(bridge: &mut Bridge) -> Result<ExitCode, Box<dyn std::error::Error>> {
    info!("Serving bridge requests on stdio");
    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();
    cmdgroup::serve::serve(bridge, stdin, stdout)?;
    Ok(ExitCode::SUCCESS)
}
