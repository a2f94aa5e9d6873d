//! Frame splitting for the response body
//!
//! The transport hands over byte chunks that are not aligned to records or
//! even to UTF-8 characters. FrameSplitter decodes them incrementally and
//! yields complete newline-terminated lines.

/// Incremental UTF-8 decoder plus newline splitter.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    /// Trailing bytes of an incomplete multi-byte character
    pending_bytes: Vec<u8>,
    /// Decoded text not yet terminated by a newline
    carry: String,
}

impl FrameSplitter {
    /// Create a new splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completed, in order.
    ///
    /// Lines are returned without their terminating `\n` (and without a
    /// preceding `\r`). An unterminated tail is kept for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode_into_carry(chunk);

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.carry.find('\n') {
            let line = self.carry[..newline_pos]
                .trim_end_matches('\r')
                .to_string();
            self.carry.drain(..=newline_pos);
            lines.push(line);
        }
        lines
    }

    /// End of stream. Any unterminated remainder is noise and is dropped.
    pub fn finish(&mut self) {
        if !self.carry.is_empty() || !self.pending_bytes.is_empty() {
            tracing::debug!(
                carry_len = self.carry.len(),
                pending_bytes = self.pending_bytes.len(),
                "Discarding unterminated tail at end of stream"
            );
        }
        self.carry.clear();
        self.pending_bytes.clear();
    }

    /// Bytes and characters currently held back waiting for more input
    pub fn buffered_len(&self) -> usize {
        self.carry.len() + self.pending_bytes.len()
    }

    fn decode_into_carry(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);

        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending_bytes[start..]) {
                Ok(text) => {
                    self.carry.push_str(text);
                    start = self.pending_bytes.len();
                    break;
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    // valid_up_to guarantees this slice is valid UTF-8
                    if let Ok(text) = std::str::from_utf8(&self.pending_bytes[start..valid_end]) {
                        self.carry.push_str(text);
                    }
                    match err.error_len() {
                        Some(invalid_len) => {
                            self.carry.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + invalid_len;
                        }
                        None => {
                            // Incomplete sequence at the end; wait for the next chunk
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending_bytes.drain(..start);
    }
}
