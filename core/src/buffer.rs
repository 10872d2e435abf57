//! Inbound line framing
//!
//! TCP delivers an unframed byte stream, so each connection accumulates bytes
//! in a `RecvQueue` until one or more complete lines can be extracted. Lines
//! end with CRLF; a bare LF is accepted too.

/// Receive queue - accumulates incoming bytes and yields complete lines
#[derive(Debug)]
pub struct RecvQueue {
    /// Bytes received but not yet extracted as a complete line
    buffer: Vec<u8>,
    /// Maximum unterminated bytes held at once
    max_size: usize,
}

/// Returned by `RecvQueue::append` when the unterminated tail outgrows the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow {
    pub held: usize,
    pub max_size: usize,
}

impl RecvQueue {
    /// Create a new receive queue with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_size,
        }
    }

    /// Append data and extract every complete line it finishes.
    ///
    /// Only the unterminated remainder counts against the limit, so a large
    /// chunk holding many full lines is fine.
    pub fn append(&mut self, data: &[u8]) -> Result<Vec<String>, Overflow> {
        self.buffer.extend_from_slice(data);

        let lines = self.extract_lines();
        if self.buffer.len() > self.max_size {
            tracing::debug!(
                "RecvQueue full ({}/{}), dropping connection input",
                self.buffer.len(),
                self.max_size
            );
            let overflow = Overflow {
                held: self.buffer.len(),
                max_size: self.max_size,
            };
            self.buffer.clear();
            return Err(overflow);
        }
        Ok(lines)
    }

    /// Extract complete lines, stripping the LF and any CR before it
    fn extract_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.buffer[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }

        self.buffer.drain(..start);
        lines
    }

    /// Get current buffer size in bytes
    pub fn current_size(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer contains any incomplete data
    pub fn has_incomplete_data(&self) -> bool {
        !self.buffer.is_empty()
    }
}
