use std::future::Future;
use std::io::Result;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::buf::CopyBuffer;

enum Direction {
    Copying(CopyBuffer),
    Closing(u64),
    Closed(u64),
}

impl Direction {
    fn amount(&self) -> u64 {
        match self {
            Direction::Copying(buf) => buf.amount(),
            Direction::Closing(n) | Direction::Closed(n) => *n,
        }
    }

    // copy, then shut down the write half once the reader is done
    fn poll_step<R, W>(&mut self, cx: &mut Context<'_>, r: &mut R, w: &mut W) -> Poll<Result<()>>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            *self = match self {
                Direction::Copying(buf) => Direction::Closing(ready!(buf.poll_copy(cx, r, w))?),
                Direction::Closing(n) => {
                    ready!(Pin::new(&mut *w).poll_shutdown(cx))?;
                    Direction::Closed(*n)
                }
                Direction::Closed(_) => return Poll::Ready(Ok(())),
            };
        }
    }
}

struct Relay<'a, A, B> {
    a: &'a mut A,
    b: &'a mut B,
    up: Direction,
    down: Direction,
}

impl<A, B> Future for Relay<'_, A, B>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Relay { a, b, up, down } = self.get_mut();

        // whichever direction ends first ends the relay
        if let Poll::Ready(res) = up.poll_step(cx, &mut **a, &mut **b) {
            return Poll::Ready(res);
        }
        down.poll_step(cx, &mut **b, &mut **a)
    }
}

/// Copy data between two streams in both directions.
///
/// Returns once either direction reaches EOF (after shutting down the opposite
/// write half) or fails, along with the bytes sent `a -> b` and `b -> a` up to
/// that moment.
pub async fn bidi_copy<A, B>(a: &mut A, b: &mut B) -> (Result<()>, u64, u64)
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let mut relay = Relay {
        a,
        b,
        up: Direction::Copying(CopyBuffer::new()),
        down: Direction::Copying(CopyBuffer::new()),
    };

    let res = (&mut relay).await;

    (res, relay.up.amount(), relay.down.amount())
}
