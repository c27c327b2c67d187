use std::collections::VecDeque;

/// Byte buffer that hands out complete newline-terminated lines.
/// Partial lines stay buffered until the rest of their bytes arrive.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete line, trimmed.
    /// Returns None if no newline has been buffered yet. Invalid UTF-8 is
    /// replaced rather than rejected so one bad line cannot stall the stream.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(String::from_utf8_lossy(&line_bytes).trim().to_string())
    }

    /// Drain whatever is left once the source has ended.
    /// The last NDJSON object is not always followed by a newline.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest: Vec<u8> = self.buffer.drain(..).collect();
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_on_newline() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\r\n");
        assert_eq!(buffer.next_line().unwrap(), "partial line");
    }

    #[test]
    fn test_remainder_without_trailing_newline() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"{\"done\":true}");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.take_remainder().unwrap(), "{\"done\":true}");
        assert!(buffer.take_remainder().is_none());
    }

    #[test]
    fn test_whitespace_remainder_is_dropped() {
        let mut buffer = LineBuffer::with_capacity(8);
        buffer.extend(b"  \n");
        assert_eq!(buffer.next_line().unwrap(), "");
        buffer.extend(b"   ");
        assert!(buffer.take_remainder().is_none());
    }
}
