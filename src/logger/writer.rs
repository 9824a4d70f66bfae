//! Log file writer setup.

use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use crate::logger::{FileConfig, LoggerError};

/// Open the configured log file, creating parent directories as needed.
///
/// The returned `Mutex<File>` is usable directly as a `tracing_subscriber`
/// writer.
pub(crate) fn open_log_file(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    if config.path.file_name().is_none() {
        return Err(LoggerError::config(format!(
            "log path '{}' does not name a file",
            config.path.display()
        )));
    }

    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)?;

    Ok(Mutex::new(file))
}
