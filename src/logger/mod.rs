//! Logger module
//!
//! Provides logging utilities for the participant service including:
//! - Level-gated debug/info/warning/error messages with timestamps
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use chrono::Local;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::config::Config;

/// Log severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown log level: {other}")),
        }
    }
}

impl Level {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Debug,
            1 => Self::Info,
            2 => Self::Warn,
            _ => Self::Error,
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

static MIN_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Initialize the logger with configuration
///
/// Should be called once at application startup. An unknown level falls back to
/// `info` with a warning.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )?;

    match config.logging.level.parse::<Level>() {
        Ok(level) => set_level(level),
        Err(e) => log_warning(&format!("{e}, using info")),
    }
    Ok(())
}

pub fn set_level(level: Level) {
    MIN_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn level() -> Level {
    Level::from_u8(MIN_LEVEL.load(Ordering::Relaxed))
}

pub fn enabled(level: Level) -> bool {
    level >= self::level()
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn log_at(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    let line = format!(
        "{} [{}] {message}",
        Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%z"),
        level.tag()
    );
    if level >= Level::Warn {
        write_error(&line);
    } else {
        write_info(&line);
    }
}

pub fn log_debug(message: &str) {
    log_at(Level::Debug, message);
}

pub fn log_info(message: &str) {
    log_at(Level::Info, message);
}

pub fn log_warning(message: &str) {
    log_at(Level::Warn, message);
}

pub fn log_error(message: &str) {
    log_at(Level::Error, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, routes: usize) {
    log_info("======================================");
    log_info("hooked participant service started");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Routes: {routes}"));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, active: u64) {
    log_warning(&format!(
        "[Connection] Rejected {peer_addr}: {active} connections already open"
    ));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_error(&format!("[Connection] Failed to serve connection: {err}"));
}

pub fn log_shutdown(in_flight: u64) {
    log_info(&format!(
        "[Shutdown] Stopped accepting, {in_flight} connection(s) in flight"
    ));
}

/// Log formatted access log entry, bypassing the level filter
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}
