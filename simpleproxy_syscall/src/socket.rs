use std::io::Result;
use std::net::SocketAddr;

use socket2::{Domain, Socket, Type};

/// Create a new non-blocking socket.
///
/// The descriptor is opened with `SOCK_NONBLOCK | SOCK_CLOEXEC` in a single
/// syscall where the platform allows it.
#[cfg(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "illumos",
    target_os = "linux",
    target_os = "netbsd",
    target_os = "openbsd"
))]
#[inline]
pub fn new_socket(domain: Domain, ty: Type) -> Result<Socket> {
    use std::os::unix::prelude::FromRawFd;
    use libc::{SOCK_CLOEXEC, SOCK_NONBLOCK};

    let fd = unsafe { libc::socket(domain.into(), libc::c_int::from(ty) | SOCK_NONBLOCK | SOCK_CLOEXEC, 0) };

    if fd < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(unsafe { Socket::from_raw_fd(fd) })
    }
}

/// Create a new non-blocking socket.
#[cfg(not(any(
    target_os = "android",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "illumos",
    target_os = "linux",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
#[inline]
pub fn new_socket(domain: Domain, ty: Type) -> Result<Socket> {
    let socket = Socket::new(domain, ty, None)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// Create a new non-blocking tcp socket whose family matches `addr`.
#[inline]
pub fn new_tcp_socket(addr: &SocketAddr) -> Result<Socket> {
    new_socket(Domain::for_address(*addr), Type::STREAM)
}

/// Create a new non-blocking udp socket whose family matches `addr`.
#[inline]
pub fn new_udp_socket(addr: &SocketAddr) -> Result<Socket> {
    new_socket(Domain::for_address(*addr), Type::DGRAM)
}
