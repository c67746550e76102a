use std::io::{Error, ErrorKind, Result};
use std::net::SocketAddr;

use simpleproxy_syscall::new_tcp_socket;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::dns::{ipv4_fallback, is_dual_stack, resolve_remote};
use crate::time::timeoutfut;
use crate::rule::ConnectOpts;

pub fn bind(laddr: &SocketAddr) -> Result<TcpListener> {
    match bind_exact(laddr) {
        Err(e) => match ipv4_fallback(laddr, &e) {
            Some(v4) => {
                log::warn!("[tcp]failed to bind {}: {}, fallback to {}", laddr, &e, &v4);
                bind_exact(&v4)
            }
            None => Err(e),
        },
        x => x,
    }
}

fn bind_exact(laddr: &SocketAddr) -> Result<TcpListener> {
    let socket = new_tcp_socket(laddr)?;

    // ignore error
    let _ = socket.set_reuse_address(true);

    if is_dual_stack(laddr) {
        socket.set_only_v6(false)?;
    }

    socket.bind(&(*laddr).into())?;
    socket.listen(1024)?;

    TcpListener::from_std(socket.into())
}

pub async fn connect(raddr: &str, conn_opts: &ConnectOpts) -> Result<TcpStream> {
    let ConnectOpts {
        connect_timeout,
        no_delay,
        ..
    } = conn_opts;

    let mut last_err = None;

    for addr in resolve_remote(raddr).await?.iter() {
        log::debug!("[tcp]{} resolved as {}", raddr, &addr);

        let socket = new_tcp_socket(addr)?;
        let socket = TcpSocket::from_std_stream(socket.into());

        match timeoutfut(socket.connect(*addr), *connect_timeout).await {
            Ok(Ok(stream)) => {
                log::debug!("[tcp]connect to {} as {}", raddr, &addr);
                if *no_delay {
                    // ignore error
                    let _ = stream.set_nodelay(true);
                }
                return Ok(stream);
            }
            Ok(Err(e)) => {
                log::warn!("[tcp]connect to {} as {}: {}, try next ip", raddr, &addr, &e);
                last_err = Some(e);
            }
            Err(e) => {
                log::warn!("[tcp]connect to {} as {} timeout, try next ip", raddr, &addr);
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| Error::new(ErrorKind::InvalidInput, "could not connect to any address")))
}
