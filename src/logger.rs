use std::io::Write;
use std::time::Instant;

use log::{Log, Metadata, Record};
use parking_lot::Mutex;

struct CmdgroupLogger {
    file: Option<Mutex<std::fs::File>>,
    filter: log::LevelFilter,
    start: Instant,
}

impl Log for CmdgroupLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.start.elapsed().as_secs_f64();
        let line = format!(
            "[{elapsed:.3}s] [{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        );

        // stdout belongs to command output and protocol traffic
        let _ = writeln!(std::io::stderr().lock(), "{line}");

        if let Some(ref file) = self.file {
            let _ = writeln!(file.lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

/// Parse `RUST_LOG` as a plain level, falling back to `default`.
fn level_from_env(default: log::LevelFilter) -> log::LevelFilter {
    std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Initialize the global logger.
///
/// # Errors
///
/// Returns `log::SetLoggerError` if a logger is already installed.
pub fn init(
    log_file: Option<std::fs::File>,
    default: log::LevelFilter,
) -> Result<(), log::SetLoggerError> {
    let filter = level_from_env(default);

    let logger = CmdgroupLogger {
        file: log_file.map(Mutex::new),
        filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_writes_enabled_records_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let logger = CmdgroupLogger {
            file: Some(Mutex::new(std::fs::File::create(&path).unwrap())),
            filter: log::LevelFilter::Info,
            start: Instant::now(),
        };

        logger.log(
            &Record::builder()
                .level(log::Level::Info)
                .target("cmdgroup::store")
                .args(format_args!("saved"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(log::Level::Debug)
                .target("cmdgroup::store")
                .args(format_args!("hidden"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[INFO] cmdgroup::store: saved"), "got: {contents}");
        assert!(!contents.contains("hidden"));
    }
}
