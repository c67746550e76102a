//! UDP relay entrance.

mod socket;
mod exchange;

use std::io::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::dns::{resolve_local, resolve_remote};
use crate::rule::Rule;

pub use exchange::relay_once;

/// Size of the receive buffers, large enough for any datagram.
pub const BUF_SIZE: usize = 0x10000;

/// Bound half of a udp rule.
pub struct UdpForwarder {
    lis: Arc<UdpSocket>,
    laddr: SocketAddr,
    raddr: SocketAddr,
    udp_timeout: usize,
}

impl UdpForwarder {
    /// Resolve the remote peer once, then bind the rule's local address.
    pub async fn bind(rule: &Rule) -> Result<Self> {
        let raddr = resolve_remote(&rule.remote)
            .await
            .map_err(|e| Error::new(e.kind(), format!("failed to resolve {}: {}", &rule.remote, e)))?[0];
        log::debug!("[udp]{} resolved as {}", &rule.remote, &raddr);

        let laddr = resolve_local(&rule.local).await?;
        let lis = socket::bind(&laddr).map_err(|e| Error::new(e.kind(), format!("failed to bind {}: {}", laddr, e)))?;
        let laddr = lis.local_addr()?;

        Ok(Self {
            lis: Arc::new(lis),
            laddr,
            raddr,
            udp_timeout: rule.conn_opts.udp_timeout,
        })
    }

    /// Address the socket is actually bound to.
    #[inline]
    pub const fn local_addr(&self) -> SocketAddr {
        self.laddr
    }

    /// Receive datagrams until `shutdown` is cancelled.
    ///
    /// Each datagram is exchanged with the remote peer on its own task.
    /// Exchanges still waiting for a reply when the loop exits are left to
    /// finish on their own.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let UdpForwarder {
            lis,
            laddr,
            raddr,
            udp_timeout,
        } = self;

        log::info!("[udp]listening on {}, forwarding to {}", &laddr, &raddr);

        let mut buf = vec![0u8; BUF_SIZE];

        loop {
            let (n, client_addr) = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                x = lis.recv_from(&mut buf) => match x {
                    Ok(x) => x,
                    Err(e) => {
                        log::error!("[udp]failed to recvfrom client: {}", e);
                        continue;
                    }
                },
            };

            log::debug!("[udp]recvfrom client {}, {}b", &client_addr, n);

            // buf is overwritten by the next read
            let packet = buf[..n].to_vec();
            let lis = lis.clone();

            tokio::spawn(async move {
                match relay_once(&packet, client_addr, raddr, &lis, udp_timeout).await {
                    Ok(n) => log::debug!("[udp]{} => {}, finish, reply: {}b", &client_addr, &raddr, n),
                    Err(e) => log::error!("[udp]{} => {}, error: {}", &client_addr, &raddr, e),
                }
            });
        }

        log::info!("[udp]shutting down listener on {}", &laddr);
        Ok(())
    }
}

/// Launch a udp relay, until `shutdown` is cancelled.
pub async fn run_udp(rule: Rule, shutdown: CancellationToken) -> Result<()> {
    UdpForwarder::bind(&rule).await?.serve(shutdown).await
}
