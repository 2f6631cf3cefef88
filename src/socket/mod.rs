mod client;
mod config;
mod connect;
mod options;
mod source;

pub use self::client::{ClientSocket, State, Shutdown, ABSENT_HANDLE};
pub use self::config::{ClientConfig, BufferConfig, TcpConfig, KeepaliveConfig,
					   DEFAULT_CREATE_ATTEMPTS, DEFAULT_CONNECT_TIMEOUT_SECS};
pub use self::options::{get_option, set_option, take_error,
						set_reuse_addr, set_tcp_nodelay, set_linger,
						set_recv_buffer_size, set_send_buffer_size,
						set_keepalive, set_keepalive_idle, set_keepalive_interval, set_keepalive_count};
pub use self::source::{SocketSource, SystemSource};
