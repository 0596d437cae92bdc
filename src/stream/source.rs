use std::io::{self, Read};

/// A byte source the read-ahead buffer pulls from.
///
/// Blocking readers implement it with a future that completes on first
/// poll, so the same parser drives both kinds of sources.
#[allow(async_fn_in_trait)]
pub trait Refill {
    /// Fills the start of `buf`, returns the number of bytes written; `0`
    /// means the source is exhausted.
    async fn refill(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Adapts a [`std::io::Read`].
#[derive(Debug)]
pub struct BlockingSource<R>(pub R);

impl<R: Read> Refill for BlockingSource<R> {
    async fn refill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.0.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                res => return res,
            }
        }
    }
}

/// Adapts a [`futures::io::AsyncRead`].
#[derive(Debug)]
pub struct AsyncSource<R>(pub R);

impl<R: futures::io::AsyncRead + Unpin> Refill for AsyncSource<R> {
    async fn refill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        futures::io::AsyncReadExt::read(&mut self.0, buf).await
    }
}

/// Adapts a [`tokio::io::AsyncRead`].
#[cfg(feature = "tokio")]
#[derive(Debug)]
pub struct TokioSource<R>(pub R);

#[cfg(feature = "tokio")]
impl<R: tokio::io::AsyncRead + Unpin> Refill for TokioSource<R> {
    async fn refill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        tokio::io::AsyncReadExt::read(&mut self.0, buf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    struct Flaky {
        interrupted: bool,
        data: &'static [u8],
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_blocking_retries_interrupted() {
        let mut src = BlockingSource(Flaky {
            interrupted: false,
            data: b"abc",
        });
        let mut buf = [0u8; 8];
        assert_eq!(block_on(src.refill(&mut buf)).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(block_on(src.refill(&mut buf)).unwrap(), 0);
    }

    #[test]
    fn test_async_source() {
        let mut src = AsyncSource(futures::io::Cursor::new(b"hello".to_vec()));
        let mut buf = [0u8; 2];
        assert_eq!(block_on(src.refill(&mut buf)).unwrap(), 2);
        assert_eq!(&buf, b"he");
    }
}
