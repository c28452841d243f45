use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Logger writing plain lines into `file`; the terminal belongs to the TUI
fn file_builder(file: File, level: LevelFilter) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .format_timestamp_millis();
    builder
}

/// Install the file logger as the global `log` backend.
///
/// `RUST_LOG` still overrides the level, as with `env_logger::init()`.
pub fn init(path: &Path, level: LevelFilter) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file_builder(file, level)
        .parse_default_env()
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Record};
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_logger_writes_enabled_records() {
        let temp = NamedTempFile::new().unwrap();
        let logger = file_builder(temp.reopen().unwrap(), LevelFilter::Info).build();

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("cbreeze::engine")
                .args(format_args!("engine started"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("cbreeze::wind")
                .args(format_args!("gust"))
                .build(),
        );
        logger.flush();

        let contents = std::fs::read_to_string(temp.path()).unwrap();
        assert!(contents.contains("INFO"));
        assert!(contents.contains("cbreeze::engine"));
        assert!(contents.contains("engine started"));
        assert!(!contents.contains("gust"));
        assert_eq!(contents.lines().count(), 1);
    }
}
