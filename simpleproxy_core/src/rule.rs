//! Forwarding rule.

use std::fmt::{Display, Formatter};

/// Default upstream connect timeout, in seconds.
pub const CONNECT_TIMEOUT: usize = 5;

/// Default time to wait for a udp reply, in seconds.
pub const UDP_TIMEOUT: usize = 30;

/// Protocols a rule forwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    Tcp,
    Udp,
    #[default]
    Both,
    /// Kept as-is so the caller can report it; starts nothing.
    Unknown(String),
}

impl Mode {
    #[inline]
    pub const fn use_tcp(&self) -> bool {
        matches!(self, Mode::Tcp | Mode::Both)
    }

    #[inline]
    pub const fn use_udp(&self) -> bool {
        matches!(self, Mode::Udp | Mode::Both)
    }
}

impl From<&str> for Mode {
    fn from(x: &str) -> Self {
        match x {
            "" | "both" => Mode::Both,
            "tcp" => Mode::Tcp,
            "udp" => Mode::Udp,
            other => Mode::Unknown(other.to_string()),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Mode::*;
        match self {
            Tcp => write!(f, "tcp"),
            Udp => write!(f, "udp"),
            Both => write!(f, "both"),
            Unknown(x) => write!(f, "{}", x),
        }
    }
}

/// Connect or associate options.
///
/// A timeout of `0` never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOpts {
    pub connect_timeout: usize,
    pub udp_timeout: usize,
    pub no_delay: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            udp_timeout: UDP_TIMEOUT,
            no_delay: true,
        }
    }
}

/// One forwarding directive.
///
/// `local` and `remote` are kept as `host:port` strings and resolved by the
/// forwarders; an empty host in `local` binds every interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub local: String,
    pub remote: String,
    pub mode: Mode,
    pub conn_opts: ConnectOpts,
}

impl Display for ConnectOpts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ConnectOpts {
            connect_timeout,
            udp_timeout,
            no_delay,
        } = self;

        write!(
            f,
            "connect-timeout={}s, udp-timeout={}s, no-delay={}",
            connect_timeout, udp_timeout, no_delay
        )
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]{} -> {}; options: {}",
            &self.mode, &self.local, &self.remote, &self.conn_opts
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_from_type() {
        assert_eq!(Mode::from(""), Mode::Both);
        assert_eq!(Mode::from("both"), Mode::Both);
        assert_eq!(Mode::from("tcp"), Mode::Tcp);
        assert_eq!(Mode::from("udp"), Mode::Udp);
        assert_eq!(Mode::from("TCP"), Mode::Unknown("TCP".to_string()));
    }

    #[test]
    fn mode_protocols() {
        assert!(Mode::Both.use_tcp() && Mode::Both.use_udp());
        assert!(Mode::Tcp.use_tcp() && !Mode::Tcp.use_udp());
        assert!(!Mode::Udp.use_tcp() && Mode::Udp.use_udp());

        let unknown = Mode::Unknown("sctp".to_string());
        assert!(!unknown.use_tcp() && !unknown.use_udp());
    }
}
