use std::net::{Ipv4Addr, SocketAddrV4};
use crate::addr::{Domain, FromSockAddr, ToSockAddr};

/// IPv4 address family marker.
///
/// The default family of [`ClientSocket`](crate::ClientSocket).
pub struct Ipv4;

impl Domain for Ipv4 {
	type Addr = SocketAddrV4;

	#[inline]
	fn raw() -> libc::c_int {
		libc::AF_INET
	}
}

fn to_raw(addr: &SocketAddrV4) -> libc::sockaddr_in {
	libc::sockaddr_in {
		sin_family: libc::AF_INET as libc::sa_family_t,
		sin_port: addr.port().to_be(),
		sin_addr: libc::in_addr {
			s_addr: u32::from(*addr.ip()).to_be(),
		},
		sin_zero: [0; 8],
	}
}

impl ToSockAddr for SocketAddrV4 {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = to_raw(self);
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
		f(ptr, len)
	}
}

impl FromSockAddr for SocketAddrV4 {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_in) };
		if raw.sin_family != libc::AF_INET as libc::sa_family_t {
			return None;
		}
		Some(SocketAddrV4::new(
			Ipv4Addr::from(u32::from_be(raw.sin_addr.s_addr)),
			u16::from_be(raw.sin_port),
		))
	}
}
