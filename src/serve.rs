//! Line-delimited JSON transport for the bridge: one request per input line, one
//! response per output line, strictly in order.

use std::io::{BufRead, Write};

use log::{debug, warn};

use crate::bridge::{Bridge, BridgeError, ErrorKind, Request, Response};

/// Serve requests from `input` until it is exhausted.
///
/// Blank lines are skipped. A line that is not a valid request yields a `format` error
/// response and the loop carries on.
///
/// # Errors
///
/// Returns the underlying IO error if reading input or writing a response fails.
pub fn serve<R: BufRead, W: Write>(
    bridge: &mut Bridge,
    input: R,
    mut output: W,
) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => bridge.dispatch(request),
            Err(e) => {
                warn!("Rejected malformed request: {e}");
                Response::Error(BridgeError {
                    kind: ErrorKind::Format,
                    message: format!("Invalid request: {e}"),
                })
            }
        };
        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }
    debug!("Input closed, stopping bridge server");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Runner;
    use crate::store::CatalogStore;

    #[test]
    fn test_serve_answers_each_line() {
        let mut bridge = Bridge::new(CatalogStore::in_memory(), Runner::default());
        let input = "{\"op\": \"create_group\", \"name\": \"Dev\"}\n\nnot json\n{\"op\": \"get_groups\"}\n";
        let mut output = Vec::new();
        serve(&mut bridge, input.as_bytes(), &mut output).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0]["ok"].is_string());
        assert_eq!(lines[1]["error"]["kind"], "format");
        assert_eq!(lines[2]["ok"]["groups"][0]["name"], "Dev");
    }
}
