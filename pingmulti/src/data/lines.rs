//! Line reassembly
//!
//! Children write their output through a pipe, which is read in chunks that
//! have no relationship with line boundaries. `RawLog` stitches the chunks
//! back together into lines, keeping a trailing partial line open until the
//! rest of it arrives.

/// Character that replaces every byte which is not 7-bit ASCII.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Decodes child output as ASCII. Bytes outside of ASCII are replaced by
/// [`REPLACEMENT`], so decoding never fails.
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { REPLACEMENT })
        .collect()
}

/// Raw output of one host, split into lines.
///
/// There is always at least one line. The last line stays open (incomplete)
/// until a line feed for it is received.
#[derive(Debug, Clone)]
pub struct RawLog {
    lines: Vec<String>,
    /// Whether the last line was terminated by a line feed.
    complete: bool,
}

impl RawLog {
    pub fn new() -> RawLog {
        RawLog {
            lines: vec![String::new()],
            complete: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        // Never true, see the type invariant.
        self.lines.is_empty()
    }

    /// Whether the last line ended on a line boundary.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Appends a line of its own, regardless of whether the last line is
    /// complete. Used for annotations which do not come from the stream.
    pub fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Adds a chunk of decoded stream data, and returns every line that got
    /// completed by it, in order.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<String> {
        let mut completed = Vec::new();
        if chunk.is_empty() {
            return completed;
        }

        let ends_on_boundary = chunk.ends_with('\n');
        let body = if ends_on_boundary {
            &chunk[..chunk.len() - 1]
        } else {
            chunk
        };

        let mut parts = body.split('\n').peekable();
        while let Some(part) = parts.next() {
            let terminated = parts.peek().is_some() || ends_on_boundary;
            match self.lines.last_mut() {
                Some(last) if !self.complete => last.push_str(part),
                _ => self.lines.push(part.to_string()),
            }
            self.complete = terminated;
            if terminated {
                if let Some(last) = self.lines.last() {
                    completed.push(last.clone());
                }
            }
        }
        completed
    }
}

impl Default for RawLog {
    fn default() -> RawLog {
        RawLog::new()
    }
}
