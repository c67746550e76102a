use std::io::{ErrorKind, Result};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Size of each direction's buffer.
pub const BUF_SIZE: usize = 0x4000;

/// One direction of a relay: bytes read from a reader are held here until
/// the writer accepts them.
pub(crate) struct CopyBuffer {
    buf: Box<[u8]>,
    // buf[pos..cap] is pending
    pos: usize,
    cap: usize,
    amt: u64,
    eof: bool,
    unflushed: bool,
}

impl CopyBuffer {
    pub(crate) fn new() -> Self {
        Self {
            buf: vec![0u8; BUF_SIZE].into_boxed_slice(),
            pos: 0,
            cap: 0,
            amt: 0,
            eof: false,
            unflushed: false,
        }
    }

    /// Bytes handed to the writer so far.
    #[inline]
    pub(crate) const fn amount(&self) -> u64 {
        self.amt
    }

    #[inline]
    fn is_drained(&self) -> bool {
        self.pos == self.cap
    }

    fn poll_fill<R>(&mut self, cx: &mut Context<'_>, r: &mut R) -> Poll<Result<()>>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = ReadBuf::new(&mut self.buf);
        ready!(Pin::new(r).poll_read(cx, &mut buf))?;

        match buf.filled().len() {
            0 => self.eof = true,
            n => {
                self.pos = 0;
                self.cap = n;
            }
        }
        Poll::Ready(Ok(()))
    }

    fn poll_drain<W>(&mut self, cx: &mut Context<'_>, w: &mut W) -> Poll<Result<()>>
    where
        W: AsyncWrite + Unpin,
    {
        while !self.is_drained() {
            let n = ready!(Pin::new(&mut *w).poll_write(cx, &self.buf[self.pos..self.cap]))?;
            if n == 0 {
                return Poll::Ready(Err(ErrorKind::WriteZero.into()));
            }
            self.pos += n;
            self.amt += n as u64;
            self.unflushed = true;
        }
        Poll::Ready(Ok(()))
    }

    /// Move bytes from `r` to `w` until `r` reaches EOF and `w` is flushed.
    ///
    /// Resolves with the total amount of bytes written.
    pub(crate) fn poll_copy<R, W>(&mut self, cx: &mut Context<'_>, r: &mut R, w: &mut W) -> Poll<Result<u64>>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            if self.is_drained() && !self.eof {
                if let Poll::Pending = self.poll_fill(cx, r)? {
                    // the reader may be waiting on data still sitting in the writer
                    if self.unflushed {
                        ready!(Pin::new(&mut *w).poll_flush(cx))?;
                        self.unflushed = false;
                    }
                    return Poll::Pending;
                }
            }

            ready!(self.poll_drain(cx, w))?;

            if self.eof {
                ready!(Pin::new(&mut *w).poll_flush(cx))?;
                return Poll::Ready(Ok(self.amt));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::poll_fn;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn copy_until_eof() {
        let (mut tx, mut r) = duplex(16);
        let (mut w, mut rx) = duplex(BUF_SIZE * 4);

        let writer = tokio::spawn(async move {
            tx.write_all(&[7u8; 1000]).await.unwrap();
        });

        let mut buf = CopyBuffer::new();
        let n = poll_fn(|cx| buf.poll_copy(cx, &mut r, &mut w)).await.unwrap();
        writer.await.unwrap();

        assert_eq!(n, 1000);
        assert_eq!(buf.amount(), 1000);

        drop(w);
        let mut out = Vec::new();
        rx.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, vec![7u8; 1000]);
    }
}
