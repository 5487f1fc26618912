use std::io::{self, IsTerminal, Write};

use dblog_core::Result;
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::level::ConsoleColor;

/// When to emit ANSI color codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when writing to a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

/// Colored line output, stdout unless another writer is given
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    colored: bool,
}

impl ConsoleSink {
    pub fn stdout(mode: ColorMode) -> Self {
        let colored = match mode {
            ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
            ColorMode::Always => true,
            ColorMode::Never => false,
        };
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            colored,
        }
    }

    /// Write to an arbitrary writer. `Auto` means no color here.
    pub fn with_writer(writer: impl Write + Send + 'static, mode: ColorMode) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            colored: mode == ColorMode::Always,
        }
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// Write one line made of colored runs
    pub fn write(&self, spans: &[(ConsoleColor, String)]) -> Result<()> {
        let mut writer = self.writer.lock();
        for (color, text) in spans {
            if self.colored {
                write!(writer, "{}", text.color(color.ansi()))?;
            } else {
                writer.write_all(text.as_bytes())?;
            }
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("colored", &self.colored)
            .finish_non_exhaustive()
    }
}
