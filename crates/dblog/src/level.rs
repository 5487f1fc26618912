//! Log levels and their console colors

use std::fmt;
use std::str::FromStr;

use owo_colors::AnsiColors;
use serde::{Deserialize, Serialize};

/// Severity of a log line, in ascending order
///
/// `Success` sorts above `Fatal`, so a logger with a minimum level of
/// `Error` still prints success lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    #[default]
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
    Success,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Information,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::Success,
    ];

    /// Name as printed by `%loglevel`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "Trace",
            LogLevel::Debug => "Debug",
            LogLevel::Information => "Information",
            LogLevel::Warning => "Warning",
            LogLevel::Error => "Error",
            LogLevel::Fatal => "Fatal",
            LogLevel::Success => "Success",
        }
    }

    /// Console color used when none has been configured
    pub fn default_color(&self) -> ConsoleColor {
        match self {
            LogLevel::Trace | LogLevel::Debug => ConsoleColor::Gray,
            LogLevel::Information => ConsoleColor::Cyan,
            LogLevel::Warning => ConsoleColor::Yellow,
            LogLevel::Error => ConsoleColor::Red,
            LogLevel::Fatal => ConsoleColor::DarkRed,
            LogLevel::Success => ConsoleColor::Green,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "information" | "info" => Ok(LogLevel::Information),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            "success" => Ok(LogLevel::Success),
            _ => Err(format!("unknown log level '{}'", s)),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        value.parse()
    }
}

/// The sixteen classic console colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "snake_case")]
pub enum ConsoleColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    DarkYellow,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl ConsoleColor {
    /// ANSI color used to render this console color
    pub fn ansi(&self) -> AnsiColors {
        match self {
            ConsoleColor::Black => AnsiColors::Black,
            ConsoleColor::DarkBlue => AnsiColors::Blue,
            ConsoleColor::DarkGreen => AnsiColors::Green,
            ConsoleColor::DarkCyan => AnsiColors::Cyan,
            ConsoleColor::DarkRed => AnsiColors::Red,
            ConsoleColor::DarkMagenta => AnsiColors::Magenta,
            ConsoleColor::DarkYellow => AnsiColors::Yellow,
            ConsoleColor::Gray => AnsiColors::White,
            ConsoleColor::DarkGray => AnsiColors::BrightBlack,
            ConsoleColor::Blue => AnsiColors::BrightBlue,
            ConsoleColor::Green => AnsiColors::BrightGreen,
            ConsoleColor::Cyan => AnsiColors::BrightCyan,
            ConsoleColor::Red => AnsiColors::BrightRed,
            ConsoleColor::Magenta => AnsiColors::BrightMagenta,
            ConsoleColor::Yellow => AnsiColors::BrightYellow,
            ConsoleColor::White => AnsiColors::BrightWhite,
        }
    }
}

impl FromStr for ConsoleColor {
    type Err = String;

    /// Case-insensitive; `DarkRed`, `dark_red` and `dark-red` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let color = match normalized.as_str() {
            "black" => ConsoleColor::Black,
            "darkblue" => ConsoleColor::DarkBlue,
            "darkgreen" => ConsoleColor::DarkGreen,
            "darkcyan" => ConsoleColor::DarkCyan,
            "darkred" => ConsoleColor::DarkRed,
            "darkmagenta" => ConsoleColor::DarkMagenta,
            "darkyellow" => ConsoleColor::DarkYellow,
            "gray" | "grey" => ConsoleColor::Gray,
            "darkgray" | "darkgrey" => ConsoleColor::DarkGray,
            "blue" => ConsoleColor::Blue,
            "green" => ConsoleColor::Green,
            "cyan" => ConsoleColor::Cyan,
            "red" => ConsoleColor::Red,
            "magenta" => ConsoleColor::Magenta,
            "yellow" => ConsoleColor::Yellow,
            "white" => ConsoleColor::White,
            _ => return Err(format!("unknown console color '{}'", s)),
        };
        Ok(color)
    }
}

impl TryFrom<String> for ConsoleColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Per-level console colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelColors {
    colors: [ConsoleColor; 7],
}

impl LevelColors {
    pub fn get(&self, level: LogLevel) -> ConsoleColor {
        self.colors[level as usize]
    }

    pub fn set(&mut self, level: LogLevel, color: ConsoleColor) {
        self.colors[level as usize] = color;
    }
}

impl Default for LevelColors {
    fn default() -> Self {
        Self {
            colors: LogLevel::ALL.map(|level| level.default_color()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Fatal < LogLevel::Success);
        assert_eq!(LogLevel::default(), LogLevel::Trace);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("Information".parse::<LogLevel>(), Ok(LogLevel::Information));
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Information));
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("verbose".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Fatal.to_string(), "Fatal");
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("cyan".parse::<ConsoleColor>(), Ok(ConsoleColor::Cyan));
        assert_eq!("DarkRed".parse::<ConsoleColor>(), Ok(ConsoleColor::DarkRed));
        assert_eq!("dark_green".parse::<ConsoleColor>(), Ok(ConsoleColor::DarkGreen));
        assert_eq!("grey".parse::<ConsoleColor>(), Ok(ConsoleColor::Gray));
        assert!("chartreuse".parse::<ConsoleColor>().is_err());
    }

    #[test]
    fn test_default_level_colors() {
        let mut colors = LevelColors::default();
        assert_eq!(colors.get(LogLevel::Trace), ConsoleColor::Gray);
        assert_eq!(colors.get(LogLevel::Information), ConsoleColor::Cyan);
        assert_eq!(colors.get(LogLevel::Fatal), ConsoleColor::DarkRed);
        assert_eq!(colors.get(LogLevel::Success), ConsoleColor::Green);

        colors.set(LogLevel::Success, ConsoleColor::DarkGreen);
        assert_eq!(colors.get(LogLevel::Success), ConsoleColor::DarkGreen);
        assert_eq!(colors.get(LogLevel::Error), ConsoleColor::Red);
    }
}
