use std::io::{Error, Result};
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use super::{socket, BUF_SIZE};
use crate::time::timeoutfut;

fn step_err(step: &str, e: Error) -> Error {
    Error::new(e.kind(), format!("{}: {}", step, e))
}

/// Exchange one datagram with the remote peer.
///
/// Sends `packet` to `raddr` from a fresh socket, waits for exactly one reply
/// (at most `timeout` seconds, `0` waits forever), then writes the reply back
/// to `client` through `lis`. Returns the size of the reply.
///
/// Only single request / single response protocols are served this way;
/// later datagrams from the peer are never read.
pub async fn relay_once(
    packet: &[u8],
    client: SocketAddr,
    raddr: SocketAddr,
    lis: &UdpSocket,
    timeout: usize,
) -> Result<usize> {
    let remote = socket::associate(&raddr)
        .await
        .map_err(|e| step_err("failed to connect to remote", e))?;

    remote
        .send(packet)
        .await
        .map_err(|e| step_err("failed to send to remote", e))?;

    let mut buf = vec![0u8; BUF_SIZE];
    let n = match timeoutfut(remote.recv(&mut buf), timeout).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) | Err(e) => return Err(step_err("failed to recv from remote", e)),
    };

    lis.send_to(&buf[..n], client)
        .await
        .map_err(|e| step_err("failed to send back to client", e))?;

    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[tokio::test]
    async fn reply_back_to_client() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let raddr = upstream.local_addr().unwrap();
        let lis = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let caddr = client.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 64];
            let (n, peer) = upstream.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"query");
            upstream.send_to(b"answer!", peer).await.unwrap();
        });

        let n = relay_once(b"query", caddr, raddr, &lis, 3).await.unwrap();
        assert_eq!(n, 7);

        let mut buf = vec![0u8; 64];
        let (n, from) = client.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"answer!");
        assert_eq!(from, lis.local_addr().unwrap());
    }

    #[tokio::test]
    async fn give_up_without_reply() {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let raddr = upstream.local_addr().unwrap();
        let lis = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let caddr: SocketAddr = "127.0.0.1:9".parse().unwrap();

        let err = relay_once(b"query", caddr, raddr, &lis, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);

        // the request did arrive
        let mut buf = vec![0u8; 64];
        let n = upstream.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"query");
    }
}
