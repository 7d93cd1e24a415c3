use std::io::{BufRead, Read};

/// Result of reading one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line without its terminator.
    Line(String),
    /// Unusable input (invalid UTF-8 or an embedded NUL); skip it.
    Discarded,
    /// Standard input is exhausted or unreadable.
    EndOfInput,
}

/// Reads newline-terminated lines with a fixed buffer size.
///
/// At most `max_len - 1` bytes of a line are ever held in memory. A longer
/// line is cut at the last character boundary that fits and the rest of it
/// is skipped without being buffered.
pub struct LineReader<R> {
    inner: R,
    max_len: usize,
}

impl<R: BufRead> LineReader<R> {
    /// `max_len` counts the terminator, like a C buffer; 0 means unlimited.
    pub fn new(inner: R, max_len: usize) -> Self {
        Self { inner, max_len }
    }

    /// Bytes of line content kept per line, if bounded.
    fn limit(&self) -> Option<u64> {
        (self.max_len > 0).then(|| self.max_len.saturating_sub(1).max(1) as u64)
    }

    pub fn read_line(&mut self) -> ReadOutcome {
        let mut buf = Vec::new();
        let limit = self.limit();
        let read = match limit {
            Some(limit) => (&mut self.inner).take(limit).read_until(b'\n', &mut buf),
            None => self.inner.read_until(b'\n', &mut buf),
        };
        match read {
            Ok(0) => return ReadOutcome::EndOfInput,
            Ok(_) => {}
            Err(e) => {
                log::warn!("stdin read failed: {e}");
                return ReadOutcome::EndOfInput;
            }
        }

        let mut truncated = false;
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        } else if limit.is_some_and(|l| buf.len() as u64 == l) {
            truncated = !matches!(self.inner.fill_buf(), Ok([b'\n', ..]));
            match self.inner.skip_until(b'\n') {
                Ok(skipped) if truncated => {
                    log::debug!("line truncated at {} bytes, {skipped} skipped", buf.len());
                }
                Ok(_) => {}
                Err(e) => log::warn!("stdin read failed: {e}"),
            }
        }

        if truncated && let Err(e) = std::str::from_utf8(&buf) {
            // A cut through a multi-byte character drops the partial bytes.
            if e.error_len().is_none() {
                buf.truncate(e.valid_up_to());
            }
        }

        let Ok(line) = String::from_utf8(buf) else {
            return ReadOutcome::Discarded;
        };
        if line.contains('\0') {
            return ReadOutcome::Discarded;
        }
        ReadOutcome::Line(line)
    }
}
