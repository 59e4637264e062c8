/// Incremental `text/event-stream` parser.
///
/// Transport chunks may split lines and events at arbitrary byte positions;
/// the parser carries partial state across `push` calls and yields the data
/// payload of each completed event.
pub struct SseParser {
    line_buffer: Vec<u8>,
    data: String,
    saw_data: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            line_buffer: Vec::new(),
            data: String::new(),
            saw_data: false,
        }
    }

    /// Feeds one transport chunk and returns every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte != b'\n' {
                self.line_buffer.push(byte);
                continue;
            }
            let mut line = std::mem::take(&mut self.line_buffer);
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(event) = self.take_line(&line) {
                events.push(event);
            }
        }
        events
    }

    // One framing line. A blank line completes the pending event.
    fn take_line(&mut self, line: &[u8]) -> Option<String> {
        if line.is_empty() {
            if !self.saw_data {
                return None;
            }
            self.saw_data = false;
            return Some(std::mem::take(&mut self.data));
        }

        if line[0] == b':' {
            // Comment line, the server's keep-alive.
            return None;
        }

        let text = String::from_utf8_lossy(line);
        if let Some(value) = text.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if self.saw_data {
                self.data.push('\n');
            }
            self.data.push_str(value);
            self.saw_data = true;
        }
        // Other field names (event:, id:, retry:) carry nothing we use.
        None
    }
}
