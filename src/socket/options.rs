use std::os::fd::AsRawFd;
use crate::error::{SocketError, errno};

/// Sets a socket option from a plain value.
///
/// Forwards to `setsockopt()` with `size_of::<T>()` as the option length.
/// `T` must have the C layout the kernel expects for `(level, name)`.
pub fn set_option<S: AsRawFd, T: Copy>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	value: &T,
	option: &'static str,
) -> Result<(), SocketError> {
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			level,
			name,
			value as *const T as *const libc::c_void,
			std::mem::size_of::<T>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option })
	} else {
		Ok(())
	}
}

/// Reads a socket option into `value`.
///
/// Forwards to `getsockopt()`. Returns the length the kernel wrote, which may
/// be shorter than `size_of::<T>()`.
pub fn get_option<S: AsRawFd, T: Copy>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	value: &mut T,
	option: &'static str,
) -> Result<libc::socklen_t, SocketError> {
	let mut len = std::mem::size_of::<T>() as libc::socklen_t;
	let result = unsafe {
		libc::getsockopt(
			socket.as_raw_fd(),
			level,
			name,
			value as *mut T as *mut libc::c_void,
			&mut len,
		)
	};
	if result == -1 {
		Err(SocketError::GetOption { errno: errno(), option })
	} else {
		Ok(len)
	}
}

/// Converts a size or count to `c_int`, saturating instead of wrapping.
fn to_c_int<T: TryInto<libc::c_int>>(value: T) -> libc::c_int {
	value.try_into().unwrap_or(libc::c_int::MAX)
}

fn set_flag<S: AsRawFd>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	enable: bool,
	option: &'static str,
) -> Result<(), SocketError> {
	let val: libc::c_int = if enable { 1 } else { 0 };
	set_option(socket, level, name, &val, option)
}

/// Reads and clears the pending socket error (SO_ERROR).
///
/// Zero means no error. After a non-blocking connect reports readiness, this
/// is the connection result.
pub fn take_error<S: AsRawFd>(socket: &S) -> Result<i32, SocketError> {
	let mut error: libc::c_int = 0;
	get_option(socket, libc::SOL_SOCKET, libc::SO_ERROR, &mut error, "SO_ERROR")?;
	Ok(error)
}

/// Sets SO_REUSEADDR.
///
/// Lets a client bind a fixed local port that still has connections in TIME_WAIT.
pub fn set_reuse_addr<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_flag(socket, libc::SOL_SOCKET, libc::SO_REUSEADDR, enable, "SO_REUSEADDR")
}

/// Sets TCP_NODELAY (disables Nagle's algorithm when enabled).
pub fn set_tcp_nodelay<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_flag(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, enable, "TCP_NODELAY")
}

/// Sets receive buffer size (SO_RCVBUF).
///
/// The kernel typically doubles this value internally.
pub fn set_recv_buffer_size<S: AsRawFd>(socket: &S, size: usize) -> Result<(), SocketError> {
	let val = to_c_int(size);
	set_option(socket, libc::SOL_SOCKET, libc::SO_RCVBUF, &val, "SO_RCVBUF")
}

/// Sets send buffer size (SO_SNDBUF).
pub fn set_send_buffer_size<S: AsRawFd>(socket: &S, size: usize) -> Result<(), SocketError> {
	let val = to_c_int(size);
	set_option(socket, libc::SOL_SOCKET, libc::SO_SNDBUF, &val, "SO_SNDBUF")
}

/// Enables TCP keep-alive (SO_KEEPALIVE).
pub fn set_keepalive<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_flag(socket, libc::SOL_SOCKET, libc::SO_KEEPALIVE, enable, "SO_KEEPALIVE")
}

/// Seconds of idle time before the first keep-alive probe (TCP_KEEPIDLE).
pub fn set_keepalive_idle<S: AsRawFd>(socket: &S, seconds: u32) -> Result<(), SocketError> {
	let val = to_c_int(seconds);
	set_option(socket, libc::IPPROTO_TCP, libc::TCP_KEEPIDLE, &val, "TCP_KEEPIDLE")
}

/// Seconds between unanswered keep-alive probes (TCP_KEEPINTVL).
pub fn set_keepalive_interval<S: AsRawFd>(socket: &S, seconds: u32) -> Result<(), SocketError> {
	let val = to_c_int(seconds);
	set_option(socket, libc::IPPROTO_TCP, libc::TCP_KEEPINTVL, &val, "TCP_KEEPINTVL")
}

/// Unanswered probes before the peer is declared dead (TCP_KEEPCNT).
pub fn set_keepalive_count<S: AsRawFd>(socket: &S, count: u32) -> Result<(), SocketError> {
	let val = to_c_int(count);
	set_option(socket, libc::IPPROTO_TCP, libc::TCP_KEEPCNT, &val, "TCP_KEEPCNT")
}

/// Sets socket linger behavior (SO_LINGER).
///
/// - `None` — close returns immediately, kernel flushes in the background
/// - `Some(0)` — close sends RST and discards unsent data
/// - `Some(n)` — close blocks up to n seconds flushing data
pub fn set_linger<S: AsRawFd>(socket: &S, linger: Option<u32>) -> Result<(), SocketError> {
	let val = match linger {
		None => libc::linger { l_onoff: 0, l_linger: 0 },
		Some(seconds) => libc::linger {
			l_onoff: 1,
			l_linger: to_c_int(seconds),
		},
	};
	set_option(socket, libc::SOL_SOCKET, libc::SO_LINGER, &val, "SO_LINGER")
}

/// Reads the `O_NONBLOCK`-bearing descriptor flags (F_GETFL).
pub(crate) fn get_fd_flags<S: AsRawFd>(socket: &S) -> Result<libc::c_int, SocketError> {
	let flags = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" });
	}
	Ok(flags)
}

/// Writes descriptor flags (F_SETFL).
pub(crate) fn set_fd_flags<S: AsRawFd>(socket: &S, flags: libc::c_int) -> Result<(), SocketError> {
	let result = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_SETFL, flags) };
	if result == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "F_SETFL" });
	}
	Ok(())
}
