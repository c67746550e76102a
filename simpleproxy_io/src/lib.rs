//! Bidirectional stream copy used by simpleproxy.
//!
//! ## Example
//!
//! ```no_run
//! async {
//!     use tokio::net::TcpStream;
//!     use simpleproxy_io::bidi_copy;
//!
//!     let mut left = TcpStream::connect("abc").await.unwrap();
//!     let mut right = TcpStream::connect("def").await.unwrap();
//!
//!     let (res, left_to_right, right_to_left) = bidi_copy(&mut left, &mut right).await;
//! };
//! ```
//!
//! ## About Shutdown
//!
//! A relay is finished as soon as **either** direction is finished.
//!
//! When one side sends `FIN`, the write half of the opposite side is shut down,
//! then the copy returns without waiting for the other direction. Dropping both
//! streams afterwards closes the two connections, which also unblocks a peer that
//! would otherwise never shut down its write side.
//!

mod buf;
mod bidi_copy;

pub use buf::BUF_SIZE;
pub use bidi_copy::bidi_copy;
