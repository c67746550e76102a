//! TCP relay entrance.

mod socket;
mod relay;

use std::io::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::dns::resolve_local;
use crate::rule::{ConnectOpts, Rule};

pub use relay::connect_and_relay;

/// Listening half of a tcp rule.
pub struct TcpForwarder {
    lis: TcpListener,
    laddr: SocketAddr,
    raddr: Arc<str>,
    conn_opts: Arc<ConnectOpts>,
}

impl TcpForwarder {
    /// Bind the rule's local address.
    pub async fn bind(rule: &Rule) -> Result<Self> {
        let laddr = resolve_local(&rule.local).await?;

        let lis = socket::bind(&laddr).map_err(|e| Error::new(e.kind(), format!("failed to bind {}: {}", laddr, e)))?;
        let laddr = lis.local_addr()?;

        Ok(Self {
            lis,
            laddr,
            raddr: Arc::from(rule.remote.as_str()),
            conn_opts: Arc::new(rule.conn_opts.clone()),
        })
    }

    /// Address the listener is actually bound to.
    #[inline]
    pub const fn local_addr(&self) -> SocketAddr {
        self.laddr
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Each connection is relayed on its own task. Sessions still running when
    /// the loop exits are left to finish on their own.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let TcpForwarder {
            lis,
            laddr,
            raddr,
            conn_opts,
        } = self;

        log::info!("[tcp]listening on {}, forwarding to {}", &laddr, &raddr);

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                x = lis.accept() => x,
            };

            let (local, addr) = match accepted {
                Ok(x) => x,
                Err(e) => {
                    log::error!("[tcp]failed to accept: {}", e);
                    continue;
                }
            };

            let link_info = format!("{} => {}", &addr, &raddr);
            log::info!("[tcp]{}", &link_info);

            if conn_opts.no_delay {
                let _ = local.set_nodelay(true);
            }

            let raddr = raddr.clone();
            let conn_opts = conn_opts.clone();

            tokio::spawn(async move {
                match connect_and_relay(local, &raddr, &conn_opts).await {
                    Ok((up, dl)) => log::debug!("[tcp]{}, finish, upload: {}b, download: {}b", link_info, up, dl),
                    Err(e) => log::error!("[tcp]{}, error: {}", link_info, e),
                }
            });
        }

        log::info!("[tcp]shutting down listener on {}", &laddr);
        Ok(())
    }
}

/// Launch a tcp relay, until `shutdown` is cancelled.
pub async fn run_tcp(rule: Rule, shutdown: CancellationToken) -> Result<()> {
    TcpForwarder::bind(&rule).await?.serve(shutdown).await
}
