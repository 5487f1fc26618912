//! dblog - Leveled logging to the console, a file and a database
//!
//! A [`Logger`] renders each line from a template such as
//! `[%loglevel][%hh:%mm:%ss]%{cyan}[%class] > %{white}%text` and writes it to
//! the console in color, optionally appends it to a file, and optionally
//! inserts it into a database through a growing connection pool.

mod config;
mod level;
mod logger;
pub mod sink;
mod template;

pub use config::{DEFAULT_FORMAT, DatabaseSinkConfig, LoggerConfig};
pub use level::{ConsoleColor, LevelColors, LogLevel};
pub use logger::{DEFAULT_POOL_MAX_SIZE, DEFAULT_POOL_MIN_SIZE, Logger};
pub use sink::{ColorMode, ConsoleSink, DatabaseSink, FileSink};
pub use template::{CallSite, Record, Template};

pub use dblog_core::{DblogError, Result, ServerConfig};
