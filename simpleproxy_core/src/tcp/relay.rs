use std::io::Result;

use tokio::net::TcpStream;

use super::socket;
use crate::rule::ConnectOpts;

/// Dial the remote peer and relay bytes in both directions.
///
/// If the dial fails, `local` is dropped (closed) and the error returned.
/// Otherwise returns the bytes sent upstream and downstream once either side
/// has closed; both sockets are closed on return.
pub async fn connect_and_relay(mut local: TcpStream, raddr: &str, conn_opts: &ConnectOpts) -> Result<(u64, u64)> {
    let mut remote = socket::connect(raddr, conn_opts).await?;

    if let (Ok(src), Ok(dst)) = (local.peer_addr(), remote.peer_addr()) {
        log::debug!("[tcp]{} => {} as {}", src, raddr, dst);
    }

    let (res, up, dl) = simpleproxy_io::bidi_copy(&mut local, &mut remote).await;

    // ignore relay error
    if let Err(e) = res {
        log::debug!("[tcp]forward error: {}, ignored", e);
    }

    Ok((up, dl))
}
