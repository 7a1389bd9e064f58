pub mod manager;
pub mod snapshot;
pub mod store;

pub use manager::{SessionConfig, SessionManager};
pub use snapshot::SessionSnapshot;
pub use store::{AppendOutcome, DEFAULT_DEDUP_WINDOW, MessageStore};
