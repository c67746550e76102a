//! Socket and resource-limit syscalls used by simpleproxy.

mod socket;
pub use socket::*;

#[cfg(all(unix, not(target_os = "android")))]
mod nofile;

#[cfg(all(unix, not(target_os = "android")))]
pub use nofile::*;

pub use socket2;
