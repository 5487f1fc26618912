//! Line templates
//!
//! A template such as `[%loglevel][%hh:%mm:%ss]%{cyan} %text` is parsed once
//! into segments and rendered for every line. Substituted values are never
//! rescanned, so a message containing `%text` prints literally.

use std::path::Path;
use std::panic::Location;

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::level::{ConsoleColor, LogLevel};

/// Where a line was logged from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    module: Option<&'static str>,
    file: &'static str,
    line: u32,
}

impl CallSite {
    pub const fn new(module: Option<&'static str>, file: &'static str, line: u32) -> Self {
        Self { module, file, line }
    }

    /// Call site of the caller of a `#[track_caller]` function
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self::new(None, location.file(), location.line())
    }

    /// Value of `%class`: the module path, or the file stem when the module
    /// is unknown
    pub fn class(&self) -> &str {
        self.module.unwrap_or_else(|| {
            Path::new(self.file)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(self.file)
        })
    }

    /// Value of `%method`: `file:line`
    pub fn method(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

/// Everything a template can substitute for one line
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub level: LogLevel,
    pub text: &'a str,
    pub call_site: CallSite,
    pub time: DateTime<Local>,
    pub username: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Hour,
    Minute,
    Second,
    Month,
    Day,
    Year,
    Class,
    Method,
    Text,
    Level,
    Username,
    Timestamp,
}

// Longest names first so no placeholder shadows a longer one.
const FIELDS: [(&str, Field); 12] = [
    ("timestamp", Field::Timestamp),
    ("loglevel", Field::Level),
    ("username", Field::Username),
    ("method", Field::Method),
    ("class", Field::Class),
    ("text", Field::Text),
    ("hh", Field::Hour),
    ("mm", Field::Minute),
    ("ss", Field::Second),
    ("MM", Field::Month),
    ("dd", Field::Day),
    ("yy", Field::Year),
];

impl Field {
    fn value(self, record: &Record<'_>) -> String {
        let time = &record.time;
        match self {
            Field::Hour => format!("{:02}", time.hour12().1),
            Field::Minute => format!("{:02}", time.minute()),
            Field::Second => format!("{:02}", time.second()),
            Field::Month => format!("{:02}", time.month()),
            Field::Day => format!("{:02}", time.day()),
            Field::Year => format!("{:02}", time.year().rem_euclid(100)),
            Field::Class => record.call_site.class().to_string(),
            Field::Method => record.call_site.method(),
            Field::Text => record.text.to_string(),
            Field::Level => record.level.to_string(),
            Field::Username => record.username.to_string(),
            Field::Timestamp => time.timestamp_micros().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
    Color(ConsoleColor),
}

/// A parsed line or query template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template. Unknown `%` sequences and `%{name}` markers with an
    /// unknown color are kept as literal text.
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some((segment, len)) = parse_placeholder(after) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
                rest = &after[len..];
            } else {
                literal.push('%');
                rest = after;
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// The text the template was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template switches console colors
    pub fn has_colors(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Color(_)))
    }

    /// Render without color markers, as written to files
    pub fn render_plain(&self, record: &Record<'_>) -> String {
        self.render_with(record, |value| value)
    }

    /// Render for use inside a SQL string literal: substituted values have
    /// backslashes doubled and single quotes escaped as `''`. Literal text of
    /// the template is left untouched.
    pub fn render_sql(&self, record: &Record<'_>) -> String {
        self.render_with(record, |value| value.replace('\\', "\\\\").replace('\'', "''"))
    }

    /// Render into runs of text with the console color each run is printed
    /// in. Text before the first color marker uses `base`.
    pub fn render_spans(&self, record: &Record<'_>, base: ConsoleColor) -> Vec<(ConsoleColor, String)> {
        let mut spans: Vec<(ConsoleColor, String)> = Vec::new();
        let mut color = base;

        for segment in &self.segments {
            let text = match segment {
                Segment::Color(next) => {
                    color = *next;
                    continue;
                }
                Segment::Literal(text) => text.clone(),
                Segment::Field(field) => field.value(record),
            };
            if text.is_empty() {
                continue;
            }
            match spans.last_mut() {
                Some((last, run)) if *last == color => run.push_str(&text),
                _ => spans.push((color, text)),
            }
        }

        spans
    }

    fn render_with(&self, record: &Record<'_>, escape: impl Fn(String) -> String) -> String {
        let mut out = String::with_capacity(self.source.len() + record.text.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(&escape(field.value(record))),
                Segment::Color(_) => {}
            }
        }
        out
    }
}

fn parse_placeholder(after: &str) -> Option<(Segment, usize)> {
    if let Some(body) = after.strip_prefix('{') {
        let end = body.find('}')?;
        let color = body[..end].parse::<ConsoleColor>().ok()?;
        return Some((Segment::Color(color), end + 2));
    }

    FIELDS
        .iter()
        .find(|(name, _)| after.starts_with(name))
        .map(|(name, field)| (Segment::Field(*field), name.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn record(text: &str) -> Record<'_> {
        Record {
            level: LogLevel::Warning,
            text,
            call_site: CallSite::new(Some("billing::invoice"), "src/invoice.rs", 42),
            time: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            username: "alice",
        }
    }

    #[test]
    fn test_render_all_fields() {
        let template = Template::parse(
            "[%loglevel][%dd/%MM/%yy][%hh:%mm:%ss][%class.%method] %username: %text",
        );
        assert_eq!(
            template.render_plain(&record("disk almost full")),
            "[Warning][09/03/24][02:05:07][billing::invoice.src/invoice.rs:42] alice: disk almost full"
        );
    }

    #[test]
    fn test_timestamp_is_microseconds() {
        let rec = record("x");
        let rendered = Template::parse("%timestamp").render_plain(&rec);
        assert_eq!(rendered, rec.time.timestamp_micros().to_string());
    }

    #[test]
    fn test_unknown_sequences_kept() {
        let template = Template::parse("100% %foo %{purple}%text%");
        assert_eq!(template.render_plain(&record("done")), "100% %foo %{purple}done%");
        assert!(!template.has_colors());
    }

    #[test]
    fn test_values_not_reexpanded() {
        let template = Template::parse("%text");
        assert_eq!(
            template.render_plain(&record("literally %loglevel")),
            "literally %loglevel"
        );
    }

    #[test]
    fn test_color_markers_removed_from_plain() {
        let template = Template::parse("[%loglevel]%{cyan}[%class] > %{Red}%text");
        assert!(template.has_colors());
        assert_eq!(
            template.render_plain(&record("boom")),
            "[Warning][billing::invoice] > boom"
        );
    }

    #[test]
    fn test_render_spans() {
        let template = Template::parse("[%loglevel]%{cyan}[%class] > %{red}%text%{dark_gray}");
        let spans = template.render_spans(&record("boom"), ConsoleColor::Yellow);
        assert_eq!(
            spans,
            vec![
                (ConsoleColor::Yellow, "[Warning]".to_string()),
                (ConsoleColor::Cyan, "[billing::invoice] > ".to_string()),
                (ConsoleColor::Red, "boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_sql_escapes_values_only() {
        let template = Template::parse("insert into log values ('%loglevel', '%text')");
        assert_eq!(
            template.render_sql(&record(r"it's C:\temp")),
            r"insert into log values ('Warning', 'it''s C:\\temp')"
        );
    }

    #[test]
    fn test_class_falls_back_to_file_stem() {
        let site = CallSite::new(None, "src/bin/worker.rs", 7);
        assert_eq!(site.class(), "worker");
        assert_eq!(site.method(), "src/bin/worker.rs:7");
    }
}
