//! The logger: filters by level, renders the line template and fans the
//! line out to every configured sink.

use std::future::Future;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use dblog_connection::PoolConfig;
use dblog_core::{ConnectionConfig, DatabaseConfig, DatabaseDriver, DblogError, Result, ServerConfig};
use dblog_drivers::DriverRegistry;
use parking_lot::RwLock;

use crate::config::LoggerConfig;
use crate::level::{ConsoleColor, LevelColors, LogLevel};
use crate::sink::{ColorMode, ConsoleSink, DatabaseSink, FileSink};
use crate::template::{CallSite, Record, Template};

/// Pool bounds used by [`Logger::set_log_database`]
pub const DEFAULT_POOL_MIN_SIZE: usize = 5;
pub const DEFAULT_POOL_MAX_SIZE: usize = 300;

pub struct Logger {
    format: Template,
    minimum_level: RwLock<LogLevel>,
    colors: RwLock<LevelColors>,
    console: ConsoleSink,
    file: RwLock<Option<Arc<FileSink>>>,
    database: RwLock<Option<Arc<DatabaseSink>>>,
    username: String,
}

impl Logger {
    /// Logger printing to stdout with the given line format
    pub fn new(format: &str) -> Self {
        Self::with_console(format, ConsoleSink::stdout(ColorMode::Auto))
    }

    pub fn with_console(format: &str, console: ConsoleSink) -> Self {
        Self {
            format: Template::parse(format),
            minimum_level: RwLock::new(LogLevel::Trace),
            colors: RwLock::new(LevelColors::default()),
            console,
            file: RwLock::new(None),
            database: RwLock::new(None),
            username: current_username(),
        }
    }

    /// Build a logger from a configuration file, connecting the database
    /// sink with a driver from `registry`.
    pub async fn from_config(config: &LoggerConfig, registry: &DriverRegistry) -> Result<Self> {
        let logger = Self::with_console(&config.format, ConsoleSink::stdout(config.color));
        logger.set_minimum_level(config.minimum_level);
        *logger.colors.write() = config.level_colors();

        if let Some(path) = &config.file {
            logger.set_log_file(path)?;
        }
        if let Some(database) = &config.database {
            let connection = database.connection_config();
            let driver = registry.for_config(&connection)?;
            logger.connect_database(connection, &database.query, driver).await?;
        }

        Ok(logger)
    }

    pub fn format(&self) -> &Template {
        &self.format
    }

    pub fn minimum_level(&self) -> LogLevel {
        *self.minimum_level.read()
    }

    /// Lines below `level` are dropped
    pub fn set_minimum_level(&self, level: LogLevel) {
        *self.minimum_level.write() = level;
    }

    pub fn level_color(&self, level: LogLevel) -> ConsoleColor {
        self.colors.read().get(level)
    }

    pub fn change_level_color(&self, level: LogLevel, color: ConsoleColor) {
        self.colors.write().set(level, color);
    }

    /// Also append every line to `path`, replacing any previous log file
    pub fn set_log_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let sink = FileSink::open(path)?;
        *self.file.write() = Some(Arc::new(sink));
        Ok(())
    }

    pub fn log_file(&self) -> Option<Arc<FileSink>> {
        self.file.read().clone()
    }

    /// Also insert every line into a database using `query_format`, with a
    /// pool of 5 to 300 connections. One connection is opened right away so
    /// that bad credentials fail here rather than on the first line.
    pub async fn set_log_database(
        &self,
        server: ServerConfig,
        database_name: &str,
        query_format: &str,
        driver: Arc<dyn DatabaseDriver>,
    ) -> Result<()> {
        let connection = ConnectionConfig::new(
            driver.id(),
            server,
            DatabaseConfig::new(database_name, DEFAULT_POOL_MIN_SIZE, DEFAULT_POOL_MAX_SIZE),
        );
        self.connect_database(connection, query_format, driver).await
    }

    /// Like [`set_log_database`](Self::set_log_database) with explicit pool
    /// bounds taken from `connection.database`
    pub async fn connect_database(
        &self,
        connection: ConnectionConfig,
        query_format: &str,
        driver: Arc<dyn DatabaseDriver>,
    ) -> Result<()> {
        let pool_config = PoolConfig::from_database(&connection.database);
        let sink = DatabaseSink::connect(connection, pool_config, query_format, driver).await?;
        self.set_database_sink(sink).await;
        Ok(())
    }

    /// Install a database sink, shutting down the one it replaces
    pub async fn set_database_sink(&self, sink: DatabaseSink) {
        let previous = self.database.write().replace(Arc::new(sink));
        if let Some(previous) = previous {
            previous.shutdown().await;
        }
    }

    pub fn database(&self) -> Option<Arc<DatabaseSink>> {
        self.database.read().clone()
    }

    /// Write a line, attributed to the caller's file and line.
    ///
    /// Every sink gets the line even if an earlier one fails; the first
    /// failure is returned.
    #[track_caller]
    pub fn write_line<'a>(
        &'a self,
        level: LogLevel,
        text: &'a str,
    ) -> impl Future<Output = Result<()>> + 'a {
        let call_site = CallSite::from_location(Location::caller());
        self.write_line_at(call_site, level, text)
    }

    /// Write a line with an explicit call site, see [`log_line!`](crate::log_line)
    pub async fn write_line_at(&self, call_site: CallSite, level: LogLevel, text: &str) -> Result<()> {
        if level < self.minimum_level() {
            return Ok(());
        }

        let record = Record {
            level,
            text,
            call_site,
            time: Local::now(),
            username: &self.username,
        };
        let mut first_error: Option<DblogError> = None;

        let spans = self.format.render_spans(&record, self.level_color(level));
        if let Err(e) = self.console.write(&spans) {
            tracing::warn!(error = %e, "console sink failed");
            first_error.get_or_insert(e);
        }

        let file = self.log_file();
        if let Some(file) = file {
            if let Err(e) = file.write_line(&self.format.render_plain(&record)) {
                tracing::warn!(path = %file.path().display(), error = %e, "file sink failed");
                first_error.get_or_insert(e);
            }
        }

        let database = self.database();
        if let Some(database) = database {
            if let Err(e) = database.write(&record).await {
                tracing::warn!(error = %e, "database sink failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Detach and shut down the database sink
    pub async fn shutdown(&self) {
        let database = self.database.write().take();
        if let Some(database) = database {
            database.shutdown().await;
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("format", &self.format.source())
            .field("minimum_level", &self.minimum_level())
            .field("file", &self.log_file().map(|f| f.path().to_path_buf()))
            .field("database", &self.database.read().is_some())
            .finish()
    }
}

fn current_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Write a formatted line attributed to the calling module
///
/// ```ignore
/// log_line!(logger, LogLevel::Error, "payment {} failed", id).await?;
/// ```
#[macro_export]
macro_rules! log_line {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        async {
            let text = format!($($arg)+);
            $logger
                .write_line_at(
                    $crate::CallSite::new(Some(module_path!()), file!(), line!()),
                    $level,
                    &text,
                )
                .await
        }
    };
}
