use std::net::{Ipv6Addr, SocketAddrV6};
use crate::addr::{Domain, FromSockAddr, ToSockAddr};

/// IPv6 address family marker.
pub struct Ipv6;

impl Domain for Ipv6 {
	type Addr = SocketAddrV6;

	#[inline]
	fn raw() -> libc::c_int {
		libc::AF_INET6
	}
}

// Flow info and scope id are carried through; scope id matters for link-local (fe80::) peers.
fn to_raw(addr: &SocketAddrV6) -> libc::sockaddr_in6 {
	libc::sockaddr_in6 {
		sin6_family: libc::AF_INET6 as libc::sa_family_t,
		sin6_port: addr.port().to_be(),
		sin6_flowinfo: addr.flowinfo(),
		sin6_addr: libc::in6_addr {
			s6_addr: addr.ip().octets(),
		},
		sin6_scope_id: addr.scope_id(),
	}
}

impl ToSockAddr for SocketAddrV6 {
	fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = to_raw(self);
		let ptr = &raw as *const _ as *const libc::sockaddr;
		let len = std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
		f(ptr, len)
	}
}

impl FromSockAddr for SocketAddrV6 {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_in6) };
		if raw.sin6_family != libc::AF_INET6 as libc::sa_family_t {
			return None;
		}
		Some(SocketAddrV6::new(
			Ipv6Addr::from(raw.sin6_addr.s6_addr),
			u16::from_be(raw.sin6_port),
			raw.sin6_flowinfo,
			raw.sin6_scope_id,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keeps_scope_id() {
		let addr = SocketAddrV6::new("fe80::1".parse().unwrap(), 9000, 0, 3);
		let back = addr.with_raw(|ptr, len| unsafe { SocketAddrV6::from_sockaddr(ptr, len) });
		assert_eq!(back, Some(addr));
	}

	#[test]
	fn rejects_ipv4_sockaddr() {
		let v4 = std::net::SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 80);
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		v4.with_raw(|ptr, len| unsafe {
			std::ptr::copy_nonoverlapping(
				ptr as *const u8,
				&mut storage as *mut _ as *mut u8,
				len as usize,
			);
		});
		let len = std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t;
		let back = unsafe {
			SocketAddrV6::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len)
		};
		assert_eq!(back, None);
	}
}
