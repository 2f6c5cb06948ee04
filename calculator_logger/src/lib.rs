use chrono::{DateTime, Local};
use colored::*;
use log::{Level, LevelFilter, Record};
use std::fmt;
use std::path::{Path, PathBuf};

const FILE_NAME_FORMAT: &str = "calculator_%Y-%m-%d_%H-%M-%S.log";
const CONSOLE_TIME_FORMAT: &str = "%H:%M:%S%.3f";
const FILE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

fn log_file_name(now: DateTime<Local>) -> String {
    now.format(FILE_NAME_FORMAT).to_string()
}

/// Creates `dir` when needed and picks a fresh file name inside it.
fn prepare_log_file(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| std::io::Error::other(format!("cannot create log directory '{}': {}", dir.display(), e)))?;
    Ok(dir.join(log_file_name(Local::now())))
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red().bold(),
        Level::Warn => "WARN ".yellow().bold(),
        Level::Info => "INFO ".green().bold(),
        Level::Debug => "DEBUG".blue().bold(),
        Level::Trace => "TRACE".magenta().bold(),
    }
}

// One plain line per record: time, level, target, source location, thread.
fn file_line(time: &str, record: &Record, message: &fmt::Arguments) -> String {
    format!(
        "{} {:<5} {} ({}:{}) [{}] {}",
        time,
        record.level(),
        record.target(),
        record.file().unwrap_or("?"),
        record.line().unwrap_or(0),
        std::thread::current().name().unwrap_or("-"),
        message
    )
}

// Stderr, so stdout only ever carries results.
fn console_dispatch(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {}: {}",
                Local::now().format(CONSOLE_TIME_FORMAT),
                colored_level(record.level()),
                record.target().dimmed(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
}

fn file_dispatch(path: &Path, level: LevelFilter) -> Result<fern::Dispatch, fern::InitError> {
    Ok(fern::Dispatch::new()
        .format(|out, message, record| {
            let time = Local::now().format(FILE_TIME_FORMAT).to_string();
            out.finish(format_args!("{}", file_line(&time, record, message)))
        })
        .level(level)
        .chain(fern::log_file(path)?))
}

/// Installs the global logger. When `log_dir` is given, every record at
/// `file_level` or above is also appended to a timestamped file there.
pub fn init(
    log_dir: Option<impl AsRef<Path>>,
    console_level: LevelFilter,
    file_level: LevelFilter,
) -> Result<(), fern::InitError> {
    let log_file = log_dir
        .map(|dir| prepare_log_file(dir.as_ref()))
        .transpose()?;

    let mut dispatch = fern::Dispatch::new()
        .level(LevelFilter::Trace)
        .chain(console_dispatch(console_level));
    if let Some(path) = &log_file {
        dispatch = dispatch.chain(file_dispatch(path, file_level)?);
    }
    dispatch.apply()?;

    log::debug!("Logger ready (console: {}, file: {})", console_level, file_level);
    if let Some(path) = &log_file {
        log::info!("Logging to {}", path.display());
    }

    Ok(())
}
