use std::os::fd::AsRawFd;
use crate::error::SocketError;
use super::options::{
	set_keepalive, set_keepalive_count, set_keepalive_idle, set_keepalive_interval,
	set_linger, set_recv_buffer_size, set_reuse_addr, set_send_buffer_size, set_tcp_nodelay,
};

/// Socket creation attempts before giving up.
pub const DEFAULT_CREATE_ATTEMPTS: u32 = 5;

/// Connect timeout used by `connect_default`, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u32 = 3;

// ============================================================================
// Option groups
// ============================================================================

/// Buffer size configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferConfig {
	pub recv: Option<usize>,
	pub send: Option<usize>,
}

impl BufferConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn recv(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self
	}

	pub fn send(mut self, size: usize) -> Self {
		self.send = Some(size);
		self
	}

	pub fn both(mut self, size: usize) -> Self {
		self.recv = Some(size);
		self.send = Some(size);
		self
	}

	fn apply<S: AsRawFd>(&self, socket: &S) -> Result<(), SocketError> {
		if let Some(size) = self.recv {
			set_recv_buffer_size(socket, size)?;
		}
		if let Some(size) = self.send {
			set_send_buffer_size(socket, size)?;
		}
		Ok(())
	}
}

/// TCP-specific configuration.
///
/// `None` leaves the kernel default untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpConfig {
	pub nodelay: Option<bool>,
	pub keepalive: Option<KeepaliveConfig>,
	pub linger: Option<Option<u32>>,
}

impl TcpConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = Some(enable);
		self
	}

	pub fn keepalive(mut self, config: KeepaliveConfig) -> Self {
		self.keepalive = Some(config);
		self
	}

	pub fn linger(mut self, seconds: Option<u32>) -> Self {
		self.linger = Some(seconds);
		self
	}

	fn apply<S: AsRawFd>(&self, socket: &S) -> Result<(), SocketError> {
		if let Some(enable) = self.nodelay {
			set_tcp_nodelay(socket, enable)?;
		}
		if let Some(config) = self.keepalive {
			set_keepalive(socket, true)?;
			set_keepalive_idle(socket, config.idle_secs)?;
			set_keepalive_interval(socket, config.interval_secs)?;
			set_keepalive_count(socket, config.count)?;
		}
		if let Some(linger) = self.linger {
			set_linger(socket, linger)?;
		}
		Ok(())
	}
}

/// Keep-alive timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
	pub idle_secs: u32,
	pub interval_secs: u32,
	pub count: u32,
}

impl Default for KeepaliveConfig {
	fn default() -> Self {
		Self {
			idle_secs: 60,
			interval_secs: 10,
			count: 5,
		}
	}
}

impl KeepaliveConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn idle(mut self, secs: u32) -> Self {
		self.idle_secs = secs;
		self
	}

	pub fn interval(mut self, secs: u32) -> Self {
		self.interval_secs = secs;
		self
	}

	pub fn count(mut self, count: u32) -> Self {
		self.count = count;
		self
	}
}

// ============================================================================
// Client configuration
// ============================================================================

/// Configuration for a [`ClientSocket`](crate::ClientSocket).
///
/// Socket options are re-applied to every freshly created handle, so they
/// survive `reset()` and the handle renewal after a failed connect.
///
/// # Example
/// ```ignore
/// use clientlane::{ClientConfig, ClientSocket, Ipv4, KeepaliveConfig, TcpConfig};
///
/// let config = ClientConfig::new()
///     .create_attempts(3)
///     .connect_timeout(5)
///     .tcp(TcpConfig::new()
///         .nodelay(true)
///         .keepalive(KeepaliveConfig::new().idle(30)));
/// let mut socket = ClientSocket::<Ipv4>::with_config(config);
/// socket.connect_default(&"127.0.0.1:8080".parse()?)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
	pub create_attempts: u32,
	pub connect_timeout_secs: u32,
	pub reuse_addr: bool,
	pub tcp: TcpConfig,
	pub buffers: BufferConfig,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			create_attempts: DEFAULT_CREATE_ATTEMPTS,
			connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
			reuse_addr: false,
			tcp: TcpConfig::default(),
			buffers: BufferConfig::default(),
		}
	}
}

impl ClientConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Socket creation attempts per create/reset. Clamped to at least one.
	pub fn create_attempts(mut self, attempts: u32) -> Self {
		self.create_attempts = attempts.max(1);
		self
	}

	/// Timeout for `connect_default`, in seconds. Zero waits indefinitely.
	pub fn connect_timeout(mut self, secs: u32) -> Self {
		self.connect_timeout_secs = secs;
		self
	}

	/// Set SO_REUSEADDR on each new handle.
	pub fn reuse_addr(mut self, enable: bool) -> Self {
		self.reuse_addr = enable;
		self
	}

	/// Set TCP options.
	pub fn tcp(mut self, config: TcpConfig) -> Self {
		self.tcp = config;
		self
	}

	/// Set buffer sizes.
	pub fn buffers(mut self, config: BufferConfig) -> Self {
		self.buffers = config;
		self
	}

	/// Applies the socket options to a freshly created handle.
	pub(crate) fn apply<S: AsRawFd>(&self, socket: &S) -> Result<(), SocketError> {
		if self.reuse_addr {
			set_reuse_addr(socket, true)?;
		}
		self.tcp.apply(socket)?;
		self.buffers.apply(socket)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_documented_values() {
		let config = ClientConfig::default();
		assert_eq!(config.create_attempts, 5);
		assert_eq!(config.connect_timeout_secs, 3);
		assert!(!config.reuse_addr);
		assert_eq!(config.tcp, TcpConfig::default());
		assert_eq!(config.buffers, BufferConfig::default());
	}

	#[test]
	fn create_attempts_never_zero() {
		assert_eq!(ClientConfig::new().create_attempts(0).create_attempts, 1);
	}

	#[test]
	fn builders_compose() {
		let config = ClientConfig::new()
			.connect_timeout(0)
			.tcp(TcpConfig::new().nodelay(true).linger(Some(0)))
			.buffers(BufferConfig::new().both(65536));

		assert_eq!(config.connect_timeout_secs, 0);
		assert_eq!(config.tcp.nodelay, Some(true));
		assert_eq!(config.tcp.linger, Some(Some(0)));
		assert_eq!(config.buffers, BufferConfig { recv: Some(65536), send: Some(65536) });
	}
}
