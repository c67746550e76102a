//! Address resolution.

use std::io::{Error, ErrorKind, Result};
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::lookup_host;

/// Resolve a listen address.
///
/// An empty host (`:port`) stands for every interface, as the dual stack
/// wildcard `[::]:port`.
pub async fn resolve_local(local: &str) -> Result<SocketAddr> {
    let addr = match local.strip_prefix(':') {
        Some(port) if !port.contains(':') => format!("[::]:{}", port),
        _ => local.to_string(),
    };

    let resolved = lookup_host(addr.as_str()).await?.next();

    match resolved {
        Some(x) => Ok(x),
        None => Err(Error::new(ErrorKind::NotFound, format!("{} resolved to no address", local))),
    }
}

/// Whether `laddr` is the ipv6 wildcard, which also takes ipv4 traffic.
#[inline]
pub(crate) fn is_dual_stack(laddr: &SocketAddr) -> bool {
    laddr.is_ipv6() && laddr.ip().is_unspecified()
}

/// The ipv4 wildcard to listen on instead of `[::]` when a host has no ipv6.
pub(crate) fn ipv4_fallback(laddr: &SocketAddr, e: &Error) -> Option<SocketAddr> {
    let retry = is_dual_stack(laddr) && !matches!(e.kind(), ErrorKind::AddrInUse | ErrorKind::PermissionDenied);

    retry.then(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, laddr.port())))
}

/// Resolve a remote address into every address it points to.
pub async fn resolve_remote(remote: &str) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = lookup_host(remote).await?.collect();

    if addrs.is_empty() {
        Err(Error::new(ErrorKind::NotFound, format!("{} resolved to no address", remote)))
    } else {
        Ok(addrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_host_binds_all() {
        let addr = resolve_local(":8080").await.unwrap();
        assert_eq!(addr, "[::]:8080".parse().unwrap());
        assert!(is_dual_stack(&addr));
        assert!(!is_dual_stack(&"0.0.0.0:8080".parse().unwrap()));
    }

    #[test]
    fn fallback_only_for_wildcard() {
        let v6: SocketAddr = "[::]:53".parse().unwrap();
        let unsupported = Error::from(ErrorKind::AddrNotAvailable);
        assert_eq!(ipv4_fallback(&v6, &unsupported), Some("0.0.0.0:53".parse().unwrap()));

        let in_use = Error::from(ErrorKind::AddrInUse);
        assert_eq!(ipv4_fallback(&v6, &in_use), None);

        let lo: SocketAddr = "[::1]:53".parse().unwrap();
        assert_eq!(ipv4_fallback(&lo, &unsupported), None);
    }

    #[tokio::test]
    async fn explicit_host_kept() {
        let addr = resolve_local("127.0.0.1:9000").await.unwrap();
        assert_eq!(addr, "127.0.0.1:9000".parse().unwrap());

        let addr = resolve_local("[::1]:9000").await.unwrap();
        assert_eq!(addr, "[::1]:9000".parse().unwrap());
    }

    #[tokio::test]
    async fn bad_port_rejected() {
        assert!(resolve_remote("127.0.0.1:notaport").await.is_err());
        assert!(resolve_local(":notaport").await.is_err());
    }
}
