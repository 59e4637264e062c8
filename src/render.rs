use chrono::Local;

use crate::record::LogRecord;
use crate::strftime::strftime_or_now;

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display-ready form of one record: formatted timestamp, lowercased level
/// tag, message split into lines, and the source label when several feeds
/// share the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub timestamp: String,
    pub level: String,
    pub lines: Vec<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub timestamp_format: String,
    pub combined: bool,
    pub two_columns: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            combined: false,
            two_columns: false,
        }
    }
}

pub fn render_entries(records: &[LogRecord], options: &RenderOptions) -> Vec<RenderedEntry> {
    records
        .iter()
        .map(|record| render_one(record, options))
        .collect()
}

fn render_one(record: &LogRecord, options: &RenderOptions) -> RenderedEntry {
    let local = record.timestamp.with_timezone(&Local);
    RenderedEntry {
        timestamp: strftime_or_now(&options.timestamp_format, Some(local)),
        level: record.level.to_lowercase(),
        lines: record.message.split('\n').map(str::to_string).collect(),
        source: if options.combined {
            record.logger_name.clone()
        } else {
            None
        },
    }
}

/// Terminal lines for one entry. Two-column mode keeps the timestamp as a
/// left gutter; the default stacks a metadata line over indented message
/// lines.
pub fn display_lines(entry: &RenderedEntry, options: &RenderOptions) -> Vec<String> {
    let mut lines = Vec::with_capacity(entry.lines.len() + 1);

    if options.two_columns {
        let gutter = " ".repeat(entry.timestamp.len() + 2);
        for (index, line) in entry.lines.iter().enumerate() {
            if index == 0 {
                let source = match entry.source {
                    Some(ref source) => format!(" {}:", source),
                    None => String::new(),
                };
                lines.push(format!(
                    "{}  [{}]{} {}",
                    entry.timestamp, entry.level, source, line
                ));
            } else {
                lines.push(format!("{}{}", gutter, line));
            }
        }
    } else {
        let mut header = format!("{} [{}]", entry.timestamp, entry.level);
        if let Some(ref source) = entry.source {
            header.push(' ');
            header.push_str(source);
        }
        lines.push(header);
        for line in &entry.lines {
            lines.push(format!("  {}", line));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(message: &str, level: &str, logger_name: Option<&str>) -> LogRecord {
        LogRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 13, 7, 9).unwrap(),
            level: level.to_string(),
            message: message.to_string(),
            logger_name: logger_name.map(str::to_string),
        }
    }

    fn utc_options() -> RenderOptions {
        // %s is timezone-independent, so assertions hold wherever the
        // tests run.
        RenderOptions {
            timestamp_format: "%s".to_string(),
            combined: false,
            two_columns: false,
        }
    }

    #[test]
    fn test_level_is_lowercased() {
        let entries = render_entries(&[record("m", "WARNING", None)], &utc_options());
        assert_eq!(entries[0].level, "warning");
    }

    #[test]
    fn test_message_splits_into_lines() {
        let entries = render_entries(&[record("one\ntwo\nthree", "info", None)], &utc_options());
        assert_eq!(entries[0].lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_single_mode_hides_source() {
        let entries = render_entries(&[record("m", "info", Some("app.web"))], &utc_options());
        assert_eq!(entries[0].source, None);
    }

    #[test]
    fn test_combined_mode_shows_source() {
        let mut options = utc_options();
        options.combined = true;
        let entries = render_entries(&[record("m", "info", Some("app.web"))], &options);
        assert_eq!(entries[0].source.as_deref(), Some("app.web"));
    }

    #[test]
    fn test_timestamp_uses_configured_pattern() {
        let entries = render_entries(&[record("m", "info", None)], &utc_options());
        let expected = Utc
            .with_ymd_and_hms(2024, 3, 5, 13, 7, 9)
            .unwrap()
            .timestamp()
            .to_string();
        assert_eq!(entries[0].timestamp, expected);
    }

    #[test]
    fn test_stacked_layout() {
        let options = utc_options();
        let entry = RenderedEntry {
            timestamp: "12:00:00".to_string(),
            level: "info".to_string(),
            lines: vec!["one".to_string(), "two".to_string()],
            source: Some("app".to_string()),
        };
        assert_eq!(
            display_lines(&entry, &options),
            vec!["12:00:00 [info] app", "  one", "  two"]
        );
    }

    #[test]
    fn test_two_column_layout_aligns_continuation_lines() {
        let mut options = utc_options();
        options.two_columns = true;
        let entry = RenderedEntry {
            timestamp: "12:00:00".to_string(),
            level: "info".to_string(),
            lines: vec!["one".to_string(), "two".to_string()],
            source: None,
        };
        assert_eq!(
            display_lines(&entry, &options),
            vec!["12:00:00  [info] one", "          two"]
        );
    }

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.timestamp_format, "%Y-%m-%d %H:%M:%S");
        assert!(!options.combined);
        assert!(!options.two_columns);
    }
}
