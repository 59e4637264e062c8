use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::TailError;

pub const DEFAULT_LEVEL: &str = "info";

/// One decoded log message, ready for the buffer.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub logger_name: Option<String>,
}

/// Wire shape of a stream message. Servers send timestamps either as text
/// or as epoch seconds.
#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: RawTimestamp,
    #[serde(default)]
    level: Option<String>,
    message: String,
    #[serde(default)]
    logger_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Seconds(f64),
}

// Naive wall-clock forms, with or without fractional seconds. Read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl LogRecord {
    /// Decodes one wire payload. `source` is the stream identifier the
    /// payload arrived on; it fills `logger_name` when the server omits one.
    pub fn decode(payload: &str, source: &str) -> Result<Self, TailError> {
        let raw: RawRecord = serde_json::from_str(payload)?;

        let timestamp = match raw.timestamp {
            RawTimestamp::Text(ref text) => parse_text_timestamp(text)?,
            RawTimestamp::Seconds(secs) => from_epoch_seconds(secs)?,
        };

        let level = match raw.level {
            Some(level) if !level.is_empty() => level,
            _ => DEFAULT_LEVEL.to_string(),
        };

        let logger_name = match raw.logger_name {
            Some(name) if !name.is_empty() => Some(name),
            _ => Some(source.to_string()),
        };

        Ok(Self {
            timestamp,
            level,
            message: raw.message,
            logger_name,
        })
    }
}

fn parse_text_timestamp(text: &str) -> Result<DateTime<Utc>, TailError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(secs) = text.parse::<i64>() {
        if let Some(parsed) = DateTime::from_timestamp(secs, 0) {
            return Ok(parsed);
        }
    }

    if let Ok(secs) = text.parse::<f64>() {
        return from_epoch_seconds(secs);
    }

    Err(TailError::Timestamp(text.to_string()))
}

fn from_epoch_seconds(secs: f64) -> Result<DateTime<Utc>, TailError> {
    if !secs.is_finite() {
        return Err(TailError::Timestamp(secs.to_string()));
    }
    DateTime::from_timestamp_millis((secs * 1000.0) as i64)
        .ok_or_else(|| TailError::Timestamp(secs.to_string()))
}
