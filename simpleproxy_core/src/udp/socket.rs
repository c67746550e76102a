use std::io::Result;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use simpleproxy_syscall::new_udp_socket;
use tokio::net::UdpSocket;

use crate::dns::{ipv4_fallback, is_dual_stack};

// No SO_REUSEADDR here: on linux it would let two rules share one udp address.
pub fn bind(laddr: &SocketAddr) -> Result<UdpSocket> {
    match bind_exact(laddr) {
        Err(e) => match ipv4_fallback(laddr, &e) {
            Some(v4) => {
                log::warn!("[udp]failed to bind {}: {}, fallback to {}", laddr, &e, &v4);
                bind_exact(&v4)
            }
            None => Err(e),
        },
        x => x,
    }
}

fn bind_exact(laddr: &SocketAddr) -> Result<UdpSocket> {
    let socket = new_udp_socket(laddr)?;

    if is_dual_stack(laddr) {
        socket.set_only_v6(false)?;
    }

    socket.bind(&(*laddr).into())?;

    UdpSocket::from_std(socket.into())
}

/// Open an ephemeral socket connected to `raddr`.
pub async fn associate(raddr: &SocketAddr) -> Result<UdpSocket> {
    let socket = new_udp_socket(raddr)?;

    let unspecified: SocketAddr = match raddr {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    socket.bind(&unspecified.into())?;

    let socket = UdpSocket::from_std(socket.into())?;
    socket.connect(raddr).await?;

    Ok(socket)
}
