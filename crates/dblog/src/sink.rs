//! Destinations a log line is written to

mod console;
mod database;
mod file;

pub use console::{ColorMode, ConsoleSink};
pub use database::DatabaseSink;
pub use file::FileSink;
