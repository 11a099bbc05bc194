//! Daily log file output

use super::config::get_logger_config;
use chrono::Local;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

struct LogFile {
    day: String,
    writer: BufWriter<File>,
}

static LOG_FILE: Lazy<Mutex<Option<LogFile>>> = Lazy::new(|| Mutex::new(None));

fn open_for_day(day: &str) -> Option<LogFile> {
    let dir = crate::paths::get_logs_directory();
    if std::fs::create_dir_all(&dir).is_err() {
        return None;
    }
    let path = dir.join(format!("whalewatch_{}.log", day));
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
        .map(|file| LogFile {
            day: day.to_string(),
            writer: BufWriter::new(file),
        })
}

pub fn init_file_logging() {
    if !get_logger_config().file_logging {
        return;
    }
    let day = Local::now().format("%Y-%m-%d").to_string();
    *LOG_FILE.lock() = open_for_day(&day);
}

/// Append one line, rotating to a new file when the date changes
pub fn write_to_file(line: &str) {
    let mut guard = LOG_FILE.lock();
    let Some(current) = guard.as_mut() else {
        return;
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    if current.day != today {
        let _ = current.writer.flush();
        *guard = open_for_day(&today);
    }

    if let Some(current) = guard.as_mut() {
        let _ = writeln!(current.writer, "{}", line);
    }
}

pub fn flush_file_logging() {
    if let Some(current) = LOG_FILE.lock().as_mut() {
        let _ = current.writer.flush();
    }
}
