use std::marker::PhantomData;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use tracing::{debug, trace, warn};
use crate::addr::{Domain, Ipv4, query_name};
use crate::error::{IoError, SocketError, errno};
use super::config::ClientConfig;
use super::options::{get_option, set_option};
use super::source::{SocketSource, SystemSource};

/// Value returned by [`ClientSocket::handle`] when no socket is held.
pub const ABSENT_HANDLE: RawFd = -1;

/// Lifecycle state of a [`ClientSocket`].
///
/// `Connected` implies a created socket; there is no way to be connected
/// without a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
	/// No OS socket is held.
	Absent,
	/// A socket exists but is not connected.
	Created,
	/// The socket completed a connect.
	Connected,
}

/// The handle lives inside the state, so "handle valid iff created" can't drift.
pub(crate) enum Slot {
	Absent,
	Created(OwnedFd),
	Connected(OwnedFd),
}

/// Direction for [`ClientSocket::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shutdown {
	Read,      // SHUT_RD
	#[default]
	Write,     // SHUT_WR
	ReadWrite, // SHUT_RDWR
}

/// A client-side stream socket with a managed lifecycle.
///
/// The socket is created on construction and can be connected, reset and
/// reconnected any number of times. A failed [`connect`](Self::connect)
/// always leaves a fresh, unconnected socket behind, so the caller can retry
/// without resetting by hand.
///
/// Not synchronized: mutating operations take `&mut self`. Dropping the value
/// closes the handle.
///
/// # Example
/// ```ignore
/// use clientlane::{ClientSocket, Ipv4};
///
/// let mut socket = ClientSocket::<Ipv4>::new();
/// socket.connect(&"127.0.0.1:7".parse()?, 2, None)?;
/// socket.write(b"ping")?;
/// let mut buf = [0u8; 4];
/// socket.read(&mut buf)?;
/// ```
pub struct ClientSocket<D: Domain = Ipv4, S: SocketSource = SystemSource> {
	pub(crate) slot: Slot,
	pub(crate) config: ClientConfig,
	source: S,
	_marker: PhantomData<D>,
}

impl<D: Domain> ClientSocket<D, SystemSource> {
	/// Creates a client socket with the default configuration.
	///
	/// Check [`is_created`](Self::is_created): if the OS refused every
	/// creation attempt the socket starts out absent.
	pub fn new() -> Self {
		Self::with_config(ClientConfig::default())
	}

	/// Creates a client socket with the given configuration.
	pub fn with_config(config: ClientConfig) -> Self {
		Self::with_source(SystemSource, config)
	}
}

impl<D: Domain> Default for ClientSocket<D, SystemSource> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Domain, S: SocketSource> ClientSocket<D, S> {
	/// Creates a client socket that allocates handles from `source`.
	pub fn with_source(source: S, config: ClientConfig) -> Self {
		let mut socket = Self {
			slot: Slot::Absent,
			config,
			source,
			_marker: PhantomData,
		};
		if let Err(err) = socket.create(config.create_attempts) {
			warn!(error = %err, "client socket starts without a handle");
		}
		socket
	}

	/// Returns the configuration in use.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the lifecycle state.
	pub fn state(&self) -> State {
		match self.slot {
			Slot::Absent => State::Absent,
			Slot::Created(_) => State::Created,
			Slot::Connected(_) => State::Connected,
		}
	}

	/// True if an OS socket is held (connected or not).
	#[inline]
	pub fn is_created(&self) -> bool {
		!matches!(self.slot, Slot::Absent)
	}

	#[inline]
	pub fn is_connected(&self) -> bool {
		matches!(self.slot, Slot::Connected(_))
	}

	/// Returns the raw handle, or [`ABSENT_HANDLE`] if none is held.
	///
	/// Does not transfer ownership.
	#[inline]
	pub fn handle(&self) -> RawFd {
		match &self.slot {
			Slot::Absent => ABSENT_HANDLE,
			Slot::Created(fd) | Slot::Connected(fd) => fd.as_raw_fd(),
		}
	}

	/// Creates a socket if none is held. No-op otherwise.
	///
	/// `times` bounds the creation attempts.
	pub fn ensure_created(&mut self, times: u32) -> Result<(), SocketError> {
		if self.is_created() {
			return Ok(());
		}
		self.create(times)
	}

	/// Closes the current socket (if any) and creates a fresh one.
	///
	/// On success the socket is created and not connected, whatever state it
	/// was in before. The fresh handle never reuses the old handle number.
	pub fn reset(&mut self) -> Result<(), SocketError> {
		let attempts = self.config.create_attempts;
		let fd = match std::mem::replace(&mut self.slot, Slot::Absent) {
			Slot::Absent => self.allocate(attempts)?,
			Slot::Created(old) | Slot::Connected(old) => self.renew(old)?,
		};
		self.slot = Slot::Created(fd);
		Ok(())
	}

	// ------------------------------------------------------------------------
	// Lifecycle internals
	// ------------------------------------------------------------------------

	/// Tries `socket()` up to `times` times, then applies the configured options.
	pub(crate) fn allocate(&mut self, times: u32) -> Result<OwnedFd, SocketError> {
		let attempts = times.max(1);
		let mut last = 0;
		for attempt in 1..=attempts {
			match self.source.open(D::raw(), libc::SOCK_STREAM) {
				Ok(fd) => {
					self.config.apply(&fd)?;
					trace!(fd = fd.as_raw_fd(), attempt, "socket created");
					return Ok(fd);
				}
				Err(e) => {
					debug!(errno = e, attempt, attempts, "socket() failed");
					last = e;
				}
			}
		}
		warn!(errno = last, attempts, "giving up on socket creation");
		Err(SocketError::Create { errno: last, attempts })
	}

	/// Stores a freshly allocated socket, or leaves the slot absent on failure.
	fn create(&mut self, times: u32) -> Result<(), SocketError> {
		match self.allocate(times) {
			Ok(fd) => {
				self.slot = Slot::Created(fd);
				Ok(())
			}
			Err(err) => {
				self.slot = Slot::Absent;
				Err(err)
			}
		}
	}

	/// Releases the handle. Closing an absent socket does nothing.
	pub(crate) fn close(&mut self) {
		if let Slot::Created(fd) | Slot::Connected(fd) = std::mem::replace(&mut self.slot, Slot::Absent) {
			trace!(fd = fd.as_raw_fd(), "socket closed");
		}
	}

	/// Replaces `old` with a fresh socket.
	///
	/// The fresh socket is allocated while `old` is still open, so the kernel
	/// hands out a different number. If that fails, `old` is closed first and
	/// creation is retried with the full attempt budget.
	pub(crate) fn renew(&mut self, old: OwnedFd) -> Result<OwnedFd, SocketError> {
		let old_fd = old.as_raw_fd();
		match self.allocate(1) {
			Ok(fresh) => {
				drop(old);
				debug!(old = old_fd, new = fresh.as_raw_fd(), "socket renewed");
				Ok(fresh)
			}
			Err(err) => {
				drop(old);
				debug!(old = old_fd, error = %err, "renewal needs the old handle released first");
				let attempts = self.config.create_attempts;
				self.allocate(attempts)
			}
		}
	}

	// ------------------------------------------------------------------------
	// Passthroughs
	// ------------------------------------------------------------------------

	/// Sets a socket option (`setsockopt`).
	///
	/// The socket should be created; on an absent socket the OS reports `EBADF`.
	pub fn set_option<T: Copy>(
		&self,
		level: libc::c_int,
		name: libc::c_int,
		value: &T,
	) -> Result<(), SocketError> {
		set_option(self, level, name, value, "socket option")
	}

	/// Reads a socket option (`getsockopt`) into `value`.
	///
	/// Returns the option length written by the kernel.
	pub fn get_option<T: Copy>(
		&self,
		level: libc::c_int,
		name: libc::c_int,
		value: &mut T,
	) -> Result<libc::socklen_t, SocketError> {
		get_option(self, level, name, value, "socket option")
	}

	/// One `read()` call. Returns `Ok(0)` at end of stream.
	pub fn read(&self, buf: &mut [u8]) -> Result<usize, IoError> {
		let n = unsafe {
			libc::read(
				self.handle(),
				buf.as_mut_ptr() as *mut libc::c_void,
				buf.len(),
			)
		};

		if n == -1 {
			Err(IoError::Read { errno: errno() })
		} else {
			Ok(n as usize)
		}
	}

	/// One `write()` call. May write fewer bytes than `buf.len()`.
	pub fn write(&self, buf: &[u8]) -> Result<usize, IoError> {
		let n = unsafe {
			libc::write(
				self.handle(),
				buf.as_ptr() as *const libc::c_void,
				buf.len(),
			)
		};

		if n == -1 {
			Err(IoError::Write { errno: errno() })
		} else {
			Ok(n as usize)
		}
	}

	pub fn shutdown(&self, how: Shutdown) -> Result<(), IoError> {
		let how = match how {
			Shutdown::Read => libc::SHUT_RD,
			Shutdown::Write => libc::SHUT_WR,
			Shutdown::ReadWrite => libc::SHUT_RDWR,
		};

		let result = unsafe { libc::shutdown(self.handle(), how) };

		if result == -1 {
			Err(IoError::Shutdown { errno: errno() })
		} else {
			Ok(())
		}
	}

	/// Returns the local address of the socket.
	///
	/// After a connect with no local address this is the kernel-chosen port.
	pub fn local_addr(&self) -> Result<D::Addr, SocketError> {
		query_name::<D::Addr>(self.handle(), libc::getsockname)
			.map_err(|errno| SocketError::GetOption { errno, option: "getsockname" })?
			.ok_or(SocketError::InvalidAddress { reason: "unexpected local address family" })
	}

	/// Returns the remote address of a connected socket.
	pub fn peer_addr(&self) -> Result<D::Addr, SocketError> {
		query_name::<D::Addr>(self.handle(), libc::getpeername)
			.map_err(|errno| SocketError::GetOption { errno, option: "getpeername" })?
			.ok_or(SocketError::InvalidAddress { reason: "unexpected peer address family" })
	}
}

impl<D: Domain, S: SocketSource> Drop for ClientSocket<D, S> {
	fn drop(&mut self) {
		self.close();
	}
}

impl<D: Domain, S: SocketSource> AsRawFd for ClientSocket<D, S> {
	fn as_raw_fd(&self) -> RawFd {
		self.handle()
	}
}

impl<D: Domain, S: SocketSource> std::io::Read for ClientSocket<D, S> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		ClientSocket::read(self, buf).map_err(Into::into)
	}
}

impl<D: Domain, S: SocketSource> std::io::Write for ClientSocket<D, S> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		ClientSocket::write(self, buf).map_err(Into::into)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())  // no userspace buffering
	}
}

impl<D: Domain, S: SocketSource> std::fmt::Debug for ClientSocket<D, S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientSocket")
			.field("state", &self.state())
			.field("handle", &self.handle())
			.finish()
	}
}
