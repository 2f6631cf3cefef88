//! Client-side TCP sockets with a managed lifecycle and a bounded-time connect.
//!
//! [`ClientSocket`] owns one OS socket. [`ClientSocket::connect`] starts a
//! non-blocking connect and waits at most the given number of seconds; on any
//! failure the handle is replaced so the next attempt starts clean.

pub mod socket;
mod addr;
mod error;

pub use self::error::{IoError, SocketError, errno};
pub use self::addr::{Domain, Ipv4, Ipv6, ToSockAddr, FromSockAddr};
pub use self::socket::{ClientSocket, State, Shutdown, ABSENT_HANDLE,
					   ClientConfig, BufferConfig, TcpConfig, KeepaliveConfig,
					   DEFAULT_CREATE_ATTEMPTS, DEFAULT_CONNECT_TIMEOUT_SECS,
					   SocketSource, SystemSource};
