//! Forwarding engine of simpleproxy.
//!
//! Each [`rule::Rule`] is served by a [`tcp::TcpForwarder`], a
//! [`udp::UdpForwarder`], or both. Every forwarder observes a shared
//! [`tokio_util::sync::CancellationToken`] and stops accepting new work once it
//! is cancelled, while sessions that are already running drain on their own.

pub mod dns;
pub mod tcp;
pub mod udp;
pub mod time;
pub mod rule;
