/// Socket lifecycle and connection errors.
///
/// Every variant carries (or implies) the raw OS error code, see [`SocketError::errno`].
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("socket() failed after {attempts} attempt(s): {}", errno_to_str(*.errno))]
    Create { errno: i32, attempts: u32 },

    #[error("bind({addr}) failed: {}", errno_to_str(*.errno))]
    Bind { errno: i32, addr: String },

    #[error("connect({addr}) failed: {}", errno_to_str(*.errno))]
    Connect { errno: i32, addr: String },

    #[error("connect({addr}) timed out after {secs}s")]
    TimedOut { addr: String, secs: u32 },

    #[error("poll() failed while connecting: {}", errno_to_str(*.errno))]
    Wait { errno: i32 },

    #[error("setsockopt({option}) failed: {}", errno_to_str(*.errno))]
    SetOption { errno: i32, option: &'static str },

    #[error("getsockopt({option}) failed: {}", errno_to_str(*.errno))]
    GetOption { errno: i32, option: &'static str },

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },
}

impl SocketError {
    /// The OS error code behind this error.
    ///
    /// A timeout reports `ETIMEDOUT`; use [`SocketError::is_timeout`] to tell it
    /// apart from a kernel-reported `ETIMEDOUT` on the pending-error option.
    pub fn errno(&self) -> i32 {
        match self {
            SocketError::Create { errno, .. } => *errno,
            SocketError::Bind { errno, .. } => *errno,
            SocketError::Connect { errno, .. } => *errno,
            SocketError::TimedOut { .. } => libc::ETIMEDOUT,
            SocketError::Wait { errno } => *errno,
            SocketError::SetOption { errno, .. } => *errno,
            SocketError::GetOption { errno, .. } => *errno,
            SocketError::InvalidAddress { .. } => libc::EINVAL,
        }
    }

    /// True when the readiness wait expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SocketError::TimedOut { .. })
    }
}

/// Passthrough I/O errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("read() failed: {}", errno_to_str(*.errno))]
    Read { errno: i32 },

    #[error("write() failed: {}", errno_to_str(*.errno))]
    Write { errno: i32 },

    #[error("shutdown() failed: {}", errno_to_str(*.errno))]
    Shutdown { errno: i32 },
}

impl IoError {
    pub fn errno(&self) -> i32 {
        match self {
            IoError::Read { errno } | IoError::Write { errno } | IoError::Shutdown { errno } => *errno,
        }
    }
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
    unsafe { *libc::__errno_location() }
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
    match errno {
        libc::EACCES => "permission denied".into(),
        libc::EADDRINUSE => "address already in use".into(),
        libc::EADDRNOTAVAIL => "address not available".into(),
        libc::EAFNOSUPPORT => "address family not supported".into(),
        libc::EAGAIN => "resource temporarily unavailable".into(),
        libc::EALREADY => "connection already in progress".into(),
        libc::EBADF => "bad file descriptor".into(),
        libc::ECONNREFUSED => "connection refused".into(),
        libc::ECONNRESET => "connection reset by peer".into(),
        libc::EHOSTUNREACH => "host unreachable".into(),
        libc::EINPROGRESS => "operation in progress".into(),
        libc::EINTR => "interrupted by signal".into(),
        libc::EINVAL => "invalid argument".into(),
        libc::EISCONN => "already connected".into(),
        libc::EMFILE => "too many open files".into(),
        libc::ENETUNREACH => "network unreachable".into(),
        libc::ENFILE => "file table overflow".into(),
        libc::ENOBUFS => "no buffer space available".into(),
        libc::ENOTCONN => "not connected".into(),
        libc::EPIPE => "broken pipe".into(),
        libc::ETIMEDOUT => "connection timed out".into(),
        _ => format!("errno {}", errno),
    }
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
    match errno {
        libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
        libc::EADDRINUSE => std::io::ErrorKind::AddrInUse,
        libc::EADDRNOTAVAIL => std::io::ErrorKind::AddrNotAvailable,
        libc::EAGAIN => std::io::ErrorKind::WouldBlock,
        libc::ECONNREFUSED => std::io::ErrorKind::ConnectionRefused,
        libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
        libc::EHOSTUNREACH => std::io::ErrorKind::HostUnreachable,
        libc::ENETUNREACH => std::io::ErrorKind::NetworkUnreachable,
        libc::EINTR => std::io::ErrorKind::Interrupted,
        libc::EINVAL => std::io::ErrorKind::InvalidInput,
        libc::ENOTCONN => std::io::ErrorKind::NotConnected,
        libc::EPIPE => std::io::ErrorKind::BrokenPipe,
        libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
        _ => std::io::ErrorKind::Other,
    }
}

impl From<SocketError> for std::io::Error {
    fn from(err: SocketError) -> Self {
        std::io::Error::new(errno_to_kind(err.errno()), err)
    }
}

impl From<IoError> for std::io::Error {
    fn from(err: IoError) -> Self {
        std::io::Error::new(errno_to_kind(err.errno()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinct_from_connect_failure() {
        let timed_out = SocketError::TimedOut { addr: "127.0.0.1:9".into(), secs: 2 };
        let refused = SocketError::Connect { errno: libc::ETIMEDOUT, addr: "127.0.0.1:9".into() };

        assert!(timed_out.is_timeout());
        assert!(!refused.is_timeout());
        assert_eq!(timed_out.errno(), libc::ETIMEDOUT);
        assert_eq!(refused.errno(), libc::ETIMEDOUT);
    }

    #[test]
    fn converts_to_io_error_kind() {
        let err: std::io::Error = SocketError::Connect {
            errno: libc::ECONNREFUSED,
            addr: "127.0.0.1:1".into(),
        }
        .into();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionRefused);

        let err: std::io::Error = SocketError::TimedOut { addr: "10.0.0.1:80".into(), secs: 1 }.into();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);

        let err: std::io::Error = IoError::Write { errno: libc::EPIPE }.into();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn messages_name_the_failing_call() {
        let err = SocketError::Create { errno: libc::EMFILE, attempts: 5 };
        assert_eq!(err.to_string(), "socket() failed after 5 attempt(s): too many open files");

        let err = SocketError::Wait { errno: 4242 };
        assert_eq!(err.to_string(), "poll() failed while connecting: errno 4242");
    }
}
