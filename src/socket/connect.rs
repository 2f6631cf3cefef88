//! Timed, non-blocking connect.
//!
//! A blocking `connect()` can hang for the kernel's SYN retry budget (minutes
//! on Linux). Here the socket is switched to `O_NONBLOCK`, the connect is
//! started, and the caller waits on `poll()` for at most the timeout. Readiness
//! alone does not mean success: a refused connection also wakes the poll, so
//! the outcome is read from `SO_ERROR`.
//!
//! Every attempt ends in one of two states:
//! - `Ok(())` — connected, original descriptor flags restored
//! - `Err(_)` — the handle was replaced by a fresh unconnected socket, or
//!   left absent when no replacement could be created

use std::os::fd::{AsRawFd, OwnedFd};
use tracing::{debug, trace, warn};
use crate::addr::{Domain, ToSockAddr};
use crate::error::{SocketError, errno};
use super::client::{ClientSocket, Slot};
use super::options::{get_fd_flags, set_fd_flags, take_error};
use super::source::SocketSource;

impl<D: Domain, S: SocketSource> ClientSocket<D, S> {
	/// Connects to `server`, waiting at most `timeout_secs` seconds.
	///
	/// `timeout_secs == 0` waits indefinitely. With `local`, the socket is
	/// bound to that address first (fixed source address or port).
	///
	/// An already connected socket is replaced by a fresh one before
	/// connecting; the old connection is closed.
	///
	/// # Errors
	///
	/// - `Create` — no socket could be created
	/// - `Bind` — binding to `local` failed
	/// - `Connect` — refused, unreachable, or any other kernel-reported failure
	/// - `TimedOut` — the handshake did not complete in time
	/// - `Wait` — `poll()` itself failed (including `EINTR`)
	/// - `GetOption`/`SetOption` — a descriptor flag or `SO_ERROR` query failed
	///
	/// After any error the socket is not connected. It is created and ready
	/// for another attempt unless the replacement socket could not be
	/// allocated, in which case it is absent and the next call retries.
	pub fn connect(
		&mut self,
		server: &D::Addr,
		timeout_secs: u32,
		local: Option<&D::Addr>,
	) -> Result<(), SocketError> {
		let fd = self.take_unconnected()?;

		let result = start::<D>(&fd, server, timeout_secs, local)
			.and_then(|flags| set_fd_flags(&fd, flags));

		match result {
			Ok(()) => {
				self.succeed(fd, server);
				Ok(())
			}
			Err(err) => Err(self.fail(fd, err)),
		}
	}

	/// Same as [`connect`](Self::connect), with the local address first.
	#[inline]
	pub fn connect_from(
		&mut self,
		server: &D::Addr,
		local: Option<&D::Addr>,
		timeout_secs: u32,
	) -> Result<(), SocketError> {
		self.connect(server, timeout_secs, local)
	}

	/// Connects with the configured default timeout and no local bind.
	pub fn connect_default(&mut self, server: &D::Addr) -> Result<(), SocketError> {
		let timeout_secs = self.config.connect_timeout_secs;
		self.connect(server, timeout_secs, None)
	}

	/// Takes the handle out of the slot, creating or renewing as needed.
	///
	/// Never hands back a handle that has been connected before.
	fn take_unconnected(&mut self) -> Result<OwnedFd, SocketError> {
		let attempts = self.config.create_attempts;
		match std::mem::replace(&mut self.slot, Slot::Absent) {
			Slot::Created(fd) => Ok(fd),
			Slot::Absent => self.allocate(attempts),
			Slot::Connected(old) => {
				debug!(fd = old.as_raw_fd(), "dropping existing connection before reconnect");
				self.renew(old)
			}
		}
	}

	fn succeed(&mut self, fd: OwnedFd, server: &D::Addr) {
		debug!(fd = fd.as_raw_fd(), addr = ?server, "connected");
		self.slot = Slot::Connected(fd);
	}

	/// Replaces the failed handle and hands the error back.
	fn fail(&mut self, fd: OwnedFd, err: SocketError) -> SocketError {
		debug!(fd = fd.as_raw_fd(), error = %err, "connect failed");
		match self.renew(fd) {
			Ok(fresh) => self.slot = Slot::Created(fresh),
			Err(create_err) => {
				warn!(error = %create_err, "no socket left after failed connect");
			}
		}
		err
	}
}

/// Binds, starts the connect and waits for it to settle.
///
/// Returns the descriptor flags to restore once connected.
fn start<D: Domain>(
	fd: &OwnedFd,
	server: &D::Addr,
	timeout_secs: u32,
	local: Option<&D::Addr>,
) -> Result<libc::c_int, SocketError> {
	if let Some(local) = local {
		bind(fd, local)?;
	}

	let flags = get_fd_flags(fd)?;
	set_fd_flags(fd, flags | libc::O_NONBLOCK)?;

	let started = server.with_raw(|ptr, len| {
		if unsafe { libc::connect(fd.as_raw_fd(), ptr, len) } == 0 {
			Ok(())
		} else {
			Err(errno())
		}
	});

	match started {
		Ok(()) => {
			trace!(fd = fd.as_raw_fd(), "connect completed immediately");
			return Ok(flags);
		}
		Err(libc::EINPROGRESS) => {}
		Err(errno) => {
			return Err(SocketError::Connect { errno, addr: format!("{:?}", server) });
		}
	}

	wait_ready(fd, server, timeout_secs)?;

	match take_error(fd)? {
		0 => Ok(flags),
		errno => Err(SocketError::Connect { errno, addr: format!("{:?}", server) }),
	}
}

fn bind<A: ToSockAddr + std::fmt::Debug>(fd: &OwnedFd, local: &A) -> Result<(), SocketError> {
	let result = local.with_raw(|ptr, len| unsafe {
		libc::bind(fd.as_raw_fd(), ptr, len)
	});

	if result == -1 {
		return Err(SocketError::Bind { errno: errno(), addr: format!("{:?}", local) });
	}
	Ok(())
}

/// Waits until the socket is readable or writable.
///
/// Both directions are watched: writability signals a finished handshake,
/// readability can arrive first when the peer sends immediately.
fn wait_ready<A: std::fmt::Debug>(fd: &OwnedFd, server: &A, timeout_secs: u32) -> Result<(), SocketError> {
	let mut pfd = libc::pollfd {
		fd: fd.as_raw_fd(),
		events: libc::POLLIN | libc::POLLOUT,
		revents: 0,
	};

	let ready = unsafe { libc::poll(&mut pfd, 1, poll_timeout(timeout_secs)) };

	match ready {
		0 => Err(SocketError::TimedOut { addr: format!("{:?}", server), secs: timeout_secs }),
		-1 => Err(SocketError::Wait { errno: errno() }),
		_ => {
			trace!(fd = fd.as_raw_fd(), revents = pfd.revents, "connect settled");
			Ok(())
		}
	}
}

/// `poll()` timeout in milliseconds; `-1` blocks indefinitely.
fn poll_timeout(timeout_secs: u32) -> libc::c_int {
	if timeout_secs == 0 {
		return -1;
	}
	timeout_secs
		.saturating_mul(1000)
		.min(libc::c_int::MAX as u32) as libc::c_int
}
