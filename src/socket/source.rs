use std::os::fd::{FromRawFd, OwnedFd};
use crate::error::errno;

/// Allocates OS sockets for a [`ClientSocket`](crate::ClientSocket).
///
/// The system implementation calls `socket()` directly. Tests swap in a
/// source that fails on demand to drive the creation retry path.
pub trait SocketSource {
	/// Opens one socket of the given family and type.
	///
	/// Returns the errno on failure.
	fn open(&mut self, domain: libc::c_int, ty: libc::c_int) -> Result<OwnedFd, i32>;
}

/// Allocates sockets with `socket()`.
///
/// Every socket is created with `SOCK_CLOEXEC` (close on exec).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSource;

impl SocketSource for SystemSource {
	fn open(&mut self, domain: libc::c_int, ty: libc::c_int) -> Result<OwnedFd, i32> {
		let fd = unsafe { libc::socket(domain, ty | libc::SOCK_CLOEXEC, 0) };
		if fd == -1 {
			return Err(errno());
		}
		Ok(unsafe { OwnedFd::from_raw_fd(fd) })
	}
}

impl<S: SocketSource + ?Sized> SocketSource for &mut S {
	fn open(&mut self, domain: libc::c_int, ty: libc::c_int) -> Result<OwnedFd, i32> {
		(**self).open(domain, ty)
	}
}
