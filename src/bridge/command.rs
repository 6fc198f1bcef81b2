use log::*;
use std::io::{self, Read};

/// Longest command line accepted, newline excluded.
const MAX_LINE_LEN: usize = 2 * crate::config::MAX_PACKET_LEN;

/// Splits the command stream into lines.
///
/// Each [`fill`](Self::fill) performs exactly one `read` on the underlying stream, so it must
/// only be called when the stream is known to be readable.
pub struct CommandReader<R> {
    inner: R,
    buf: Vec<u8>,
    chunk: Box<[u8]>,
    discarding: bool,
}

impl<R: Read> CommandReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            chunk: vec![0; MAX_LINE_LEN + 1].into_boxed_slice(),
            discarding: false,
        }
    }

    /// Reads one chunk. Returns the number of bytes read, `0` on end of stream.
    pub fn fill(&mut self) -> io::Result<usize> {
        let n = self.inner.read(&mut self.chunk)?;
        let chunk = &self.chunk[..n];
        debug!("read {} B from command stream: {:?}", n, String::from_utf8_lossy(chunk));

        if n == 0 {
            if !self.buf.is_empty() {
                warn!("dropping unterminated command at end of stream ({} B)", self.buf.len());
                self.buf.clear();
            }
            return Ok(0);
        }

        self.buf.extend_from_slice(chunk);
        if self.discarding {
            match self.buf.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    self.buf.drain(..=i);
                    self.discarding = false;
                }
                None => self.buf.clear(),
            }
        }
        let pending = self.buf.iter().rposition(|&b| b == b'\n')
            .map(|i| self.buf.len() - i - 1)
            .unwrap_or(self.buf.len());
        if pending > MAX_LINE_LEN {
            warn!("dropping command longer than {} characters", MAX_LINE_LEN);
            let keep = self.buf.len() - pending;
            self.buf.truncate(keep);
            self.discarding = true;
        }
        Ok(n)
    }

    /// Pops the next complete line, without its `\n`. Lines longer than [`MAX_LINE_LEN`] are
    /// skipped.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let i = self.buf.iter().position(|&b| b == b'\n')?;
            let mut line: Vec<u8> = self.buf.drain(..=i).collect();
            line.pop();
            if line.len() <= MAX_LINE_LEN {
                return Some(line);
            }
            warn!("dropping command of {} characters, limit is {}", line.len(), MAX_LINE_LEN);
        }
    }
}
