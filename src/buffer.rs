use crate::record::LogRecord;

/// Bounded, timestamp-ordered view of the most recent log records. A
/// configuration generation owns exactly one buffer, created empty.
pub struct LogBuffer {
    entries: Vec<LogRecord>,
    max_logs: usize,
}

impl LogBuffer {
    pub fn new(max_logs: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_logs,
        }
    }

    /// Inserts a record, restores ascending timestamp order and evicts the
    /// oldest entries past capacity. The sort is stable, so records sharing
    /// a timestamp keep arrival order. Returns the resulting sequence.
    pub fn insert(&mut self, record: LogRecord) -> &[LogRecord] {
        self.entries.push(record);
        self.entries.sort_by_key(|record| record.timestamp);
        if self.entries.len() > self.max_logs {
            let excess = self.entries.len() - self.max_logs;
            self.entries.drain(..excess);
        }
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn record(epoch_secs: i64, message: &str) -> LogRecord {
        LogRecord {
            timestamp: DateTime::from_timestamp(epoch_secs, 0).unwrap(),
            level: "info".to_string(),
            message: message.to_string(),
            logger_name: None,
        }
    }

    fn messages(entries: &[LogRecord]) -> Vec<&str> {
        entries.iter().map(|r| r.message.as_str()).collect()
    }

    #[test]
    fn test_out_of_order_arrival_is_sorted() {
        let mut buffer = LogBuffer::new(10);
        buffer.insert(record(30, "c"));
        buffer.insert(record(10, "a"));
        let view = buffer.insert(record(20, "b"));
        assert_eq!(messages(view), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let mut buffer = LogBuffer::new(10);
        buffer.insert(record(10, "first"));
        buffer.insert(record(10, "second"));
        let view = buffer.insert(record(10, "third"));
        assert_eq!(messages(view), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = LogBuffer::new(3);
        buffer.insert(record(10, "a"));
        buffer.insert(record(20, "b"));
        buffer.insert(record(30, "c"));
        let view = buffer.insert(record(40, "d"));
        assert_eq!(messages(view), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_late_old_record_is_evicted_from_full_buffer() {
        let mut buffer = LogBuffer::new(3);
        buffer.insert(record(20, "b"));
        buffer.insert(record(30, "c"));
        buffer.insert(record(40, "d"));

        // Older than everything held; sorted to the front, then evicted.
        let view = buffer.insert(record(10, "stale"));
        assert_eq!(messages(view), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut buffer = LogBuffer::new(10);
        buffer.insert(record(10, "same"));
        let view = buffer.insert(record(10, "same"));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_len_tracks_contents() {
        let mut buffer = LogBuffer::new(2);
        assert_eq!(buffer.len(), 0);
        buffer.insert(record(10, "a"));
        assert_eq!(buffer.len(), 1);
        buffer.insert(record(20, "b"));
        buffer.insert(record(30, "c"));
        assert_eq!(buffer.len(), 2);
    }
}
