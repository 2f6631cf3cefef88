//! Address families and related types.
//!
//! Two families are supported, both over `SOCK_STREAM`:
//! - `Ipv4` — addresses are `std::net::SocketAddrV4`
//! - `Ipv6` — addresses are `std::net::SocketAddrV6`
//!
//! Callers resolve names themselves; only numeric addresses cross this boundary.

mod ipv4;
mod ipv6;
pub use self::ipv4::Ipv4;
pub use self::ipv6::Ipv6;

/// Trait for address family markers.
///
/// Each type implementing this trait represents an address family
/// that can be passed to the `socket()` syscall.
pub trait Domain {
	/// Socket address type used for `bind()`/`connect()` in this family.
	type Addr: ToSockAddr + FromSockAddr + std::fmt::Debug + Copy;

	/// Returns the libc constant for this address family.
	fn raw() -> libc::c_int;
}

/// Trait for address types that can be converted to raw sockaddr for syscalls.
pub trait ToSockAddr {
	/// Calls `f` with a pointer to the raw sockaddr and its size.
	///
	/// The sockaddr lives on this call's stack frame, so the pointer is only
	/// valid inside `f`.
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}

/// Trait for address types that can be created from raw sockaddr.
pub trait FromSockAddr: Sized {
	/// Creates address from raw sockaddr storage.
	///
	/// Returns `None` if `len` is too short or the family does not match.
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self>;
}

/// Reads a socket name with `getsockname`/`getpeername` into `A`.
pub(crate) fn query_name<A: FromSockAddr>(
	fd: libc::c_int,
	call: unsafe extern "C" fn(libc::c_int, *mut libc::sockaddr, *mut libc::socklen_t) -> libc::c_int,
) -> Result<Option<A>, i32> {
	let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
	let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

	let result = unsafe { call(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len) };
	if result == -1 {
		return Err(crate::error::errno());
	}

	Ok(unsafe { A::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len) })
}
