/// Commands the UI sends to the session task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectIdentity(String),
    Submit(String),
    /// Open a new connection under the already selected identity.
    Reconnect,
    ClearAll,
    /// Close the connection and stop the session loop.
    Shutdown,
}
