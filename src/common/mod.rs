pub mod commands;
pub mod events;
pub mod types;

pub use commands::SessionCommand;
pub use events::{ConnectionEvent, TransportEvent, TransportEventKind};
pub use types::{ChatMessage, ConnectionState, Identity, MessageOrigin};
