use crate::error::{Position, Result};
use crate::stream::event::CancelToken;
use crate::stream::source::Refill;
use crate::text::ascii;

/// Read-ahead buffer over a [`Refill`] source.
///
/// `buf[..index]` was already visited and is kept only as long as a caller
/// asks for it, `buf[index..end]` is unread. The buffer grows when a
/// read-ahead asks for more than it can hold, so the refill size only
/// changes how often the source is called.
pub struct ByteCursor<S> {
    source: S,
    buf: Vec<u8>,
    index: usize,
    end: usize,
    /// Stream offset of `buf[0]`.
    base: u64,
    line: u64,
    eos: bool,
    block: usize,
    cancel: CancelToken,
}

impl<S: Refill> ByteCursor<S> {
    pub fn new(source: S, block: usize, cancel: CancelToken) -> Self {
        let block = block.max(1);
        Self {
            source,
            buf: Vec::with_capacity(block),
            index: 0,
            end: 0,
            base: 0,
            line: 1,
            eos: false,
            block,
            cancel,
        }
    }

    /// Makes sure at least `atleast` unread bytes are buffered, unless the
    /// source is exhausted, keeping the last `save` visited bytes reachable
    /// through [`Self::behind`]. Returns the number of unread bytes.
    pub async fn read_ahead(&mut self, atleast: usize, save: usize) -> Result<usize> {
        if self.left() >= atleast || self.eos {
            return Ok(self.left());
        }

        debug_assert!(save <= self.index);
        let from = self.index - save;
        if from > 0 {
            self.buf.copy_within(from..self.end, 0);
            self.base += from as u64;
            self.index -= from;
            self.end -= from;
        }

        while self.left() < atleast && !self.eos {
            if self.buf.len() < self.end + self.block {
                self.buf.resize(self.end + self.block, 0);
            }
            self.cancel.check()?;
            let n = self
                .source
                .refill(&mut self.buf[self.end..self.end + self.block])
                .await?;
            if n == 0 {
                self.eos = true;
            } else {
                self.end += n;
            }
        }

        Ok(self.left())
    }

    /// Unread bytes.
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.index..self.end]
    }

    /// The last `n` visited bytes.
    pub fn behind(&self, n: usize) -> &[u8] {
        &self.buf[self.index - n..self.index]
    }

    pub fn left(&self) -> usize {
        self.end - self.index
    }

    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.left());
        let lines = memchr::memchr_iter(ascii::LF, &self.buf[self.index..self.index + n]).count();
        self.line += lines as u64;
        self.index += n;
    }

    /// The source reported its end. Unread bytes may remain.
    pub fn eos(&self) -> bool {
        self.eos
    }

    pub fn offset(&self) -> u64 {
        self.base + self.index as u64
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.offset(),
            line: self.line,
        }
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::source::BlockingSource;
    use futures::executor::block_on;

    fn cursor(data: &'static [u8], block: usize) -> ByteCursor<BlockingSource<&'static [u8]>> {
        ByteCursor::new(BlockingSource(data), block, CancelToken::new())
    }

    #[test]
    fn test_read_ahead_grows() {
        let mut c = cursor(b"hello\nworld\n", 1);
        assert_eq!(block_on(c.read_ahead(8, 0)).unwrap(), 8);
        assert_eq!(c.peek(), b"hello\nwo");
        c.consume(6);
        assert_eq!(c.position(), Position { offset: 6, line: 2 });
        assert_eq!(block_on(c.read_ahead(100, 2)).unwrap(), 6);
        assert!(c.eos());
        assert_eq!(c.behind(2), b"o\n");
        assert_eq!(c.peek(), b"world\n");
        c.consume(6);
        assert_eq!(c.position(), Position { offset: 12, line: 3 });
        assert_eq!(block_on(c.read_ahead(1, 0)).unwrap(), 0);
    }

    #[test]
    fn test_offsets_survive_compaction() {
        let mut c = cursor(b"abcdefghij", 3);
        for expected in 0..10u64 {
            assert_eq!(c.offset(), expected);
            assert!(block_on(c.read_ahead(1, 1.min(expected as usize))).unwrap() >= 1);
            c.consume(1);
        }
        assert_eq!(block_on(c.read_ahead(1, 1)).unwrap(), 0);
        assert_eq!(c.behind(1), b"j");
    }

    #[test]
    fn test_cancelled_refill() {
        let token = CancelToken::new();
        let mut c = ByteCursor::new(BlockingSource(&b"abc"[..]), 4, token.clone());
        token.cancel();
        assert!(block_on(c.read_ahead(1, 0)).is_err());
    }
}
