pub mod connection;
pub mod protocol;
pub mod transport;

pub use connection::ConnectionController;
pub use transport::{Transport, WebSocketTransport};
