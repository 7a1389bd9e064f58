use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};

use crate::common::{
    ChatMessage, ConnectionEvent, ConnectionState, Identity, SessionCommand, TransportEvent,
};
use crate::error::{PersistenceError, SessionError, ValidationError};
use crate::network::protocol::{encode_frame, parse_frame};
use crate::network::{ConnectionController, Transport};
use crate::storage::Persistence;

use super::snapshot::SessionSnapshot;
use super::store::{AppendOutcome, MessageStore};

/// How long `run` waits for the channel to finish closing on shutdown.
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Settings the session needs from the application config.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub endpoint: String,
    pub storage_key: String,
    pub dedup_window: Duration,
}

/// Owns the identity, the message log and the channel connection, and is
/// the only thing that mutates them.
///
/// Every entry point ends by publishing a fresh [`SessionSnapshot`];
/// observers get one through [`SessionManager::subscribe`].
pub struct SessionManager<P: Persistence, T: Transport> {
    identity: Option<Identity>,
    store: MessageStore,
    connection: ConnectionController<T>,
    persistence: P,
    storage_key: String,
    // Set when the saved log could not be read; saving would overwrite it.
    memory_only: bool,
    warning: Option<String>,
    snapshot_sender: watch::Sender<SessionSnapshot>,
}

impl<P: Persistence, T: Transport> SessionManager<P, T> {
    /// Build the session and load the persisted log. A load failure leaves
    /// the session running with an empty, memory-only log: nothing is saved
    /// until a successful [`SessionManager::clear_all`].
    pub fn new(config: SessionConfig, persistence: P, transport: T) -> Self {
        let (store, warning, memory_only) = match persistence.load(&config.storage_key) {
            Ok(messages) => {
                log::info!("Loaded {} saved messages", messages.len());
                (MessageStore::hydrate(messages, config.dedup_window), None, false)
            }
            Err(err) => {
                log::warn!("Failed to load saved messages, keeping this session in memory: {err}");
                (
                    MessageStore::new(config.dedup_window),
                    Some(format!("Unable to load saved messages: {err}")),
                    true,
                )
            }
        };

        let (snapshot_sender, _) = watch::channel(SessionSnapshot::default());
        let manager = Self {
            identity: None,
            store,
            connection: ConnectionController::new(transport, config.endpoint),
            persistence,
            storage_key: config.storage_key,
            memory_only,
            warning,
            snapshot_sender,
        };
        manager.publish();
        manager
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_sender.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_sender.borrow().clone()
    }

    pub fn connection_state(&self) -> &ConnectionState {
        self.connection.state()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.all()
    }

    pub fn select_identity(&mut self, name: &str) -> Result<(), ValidationError> {
        if let Some(existing) = &self.identity {
            return Err(ValidationError::IdentityAlreadySelected(existing.to_string()));
        }
        let identity = Identity::new(name)?;
        log::info!("Identity selected: {identity}");

        self.warning = None;
        self.connection.connect(&identity);
        self.identity = Some(identity);
        self.drain_connection_events();
        self.publish();
        Ok(())
    }

    /// Start a fresh connection attempt after a failure or remote close.
    /// No-op without an identity or while a connection is live.
    pub fn reconnect(&mut self) {
        let Some(identity) = &self.identity else {
            log::debug!("Reconnect ignored: no identity selected");
            return;
        };
        self.warning = None;
        self.connection.connect(identity);
        self.drain_connection_events();
        self.publish();
    }

    /// Append an optimistic message and publish it to the channel.
    ///
    /// Returns the new message id, or `None` when not connected. The
    /// message stays in the log even if the channel rejects the send.
    pub fn submit(&mut self, text: &str) -> Result<Option<String>, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let Some(identity) = self.identity.clone() else {
            return Ok(None);
        };
        if !self.connection.state().is_connected() {
            log::debug!("Submit ignored while {}", self.connection.state());
            return Ok(None);
        }

        self.warning = None;
        let message = ChatMessage::local_pending(&identity, text);
        let id = message.id.clone();
        self.store.append(message);
        self.persist();

        match encode_frame(text, identity.as_str()) {
            Ok(frame) => {
                if let Err(err) = self.connection.send(frame) {
                    log::warn!("Message {id} kept locally, send rejected: {err}");
                }
            }
            Err(err) => log::error!("Failed to encode outbound frame: {err}"),
        }

        self.drain_connection_events();
        self.publish();
        Ok(Some(id))
    }

    /// Reconcile one raw frame from the channel. Returns `None` when the
    /// frame was dropped as malformed.
    pub fn on_channel_message(&mut self, raw: &str) -> Option<AppendOutcome> {
        let outcome = self.reconcile(raw);
        self.publish();
        outcome
    }

    pub fn clear_all(&mut self) -> Result<(), PersistenceError> {
        self.store.clear();
        let result = self.persistence.remove(&self.storage_key);
        match &result {
            Ok(()) => {
                log::info!("Chat history cleared");
                self.memory_only = false;
                self.warning = None;
            }
            Err(err) => {
                log::warn!("Failed to remove saved messages: {err}");
                self.warning = Some(format!("Unable to clear saved messages: {err}"));
            }
        }
        self.publish();
        result
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        self.connection.handle_transport_event(event);
        self.drain_connection_events();
        self.publish();
    }

    pub fn close(&mut self) {
        self.connection.close();
        self.drain_connection_events();
        self.publish();
    }

    pub fn handle_command(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        match command {
            SessionCommand::SelectIdentity(name) => self.select_identity(&name)?,
            SessionCommand::Submit(text) => {
                self.submit(&text)?;
            }
            SessionCommand::Reconnect => self.reconnect(),
            SessionCommand::ClearAll => self.clear_all()?,
            SessionCommand::Shutdown => self.close(),
        }
        Ok(())
    }

    /// Process UI commands and transport events strictly in arrival order
    /// until shutdown or until the command side hangs up.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut transport_events: mpsc::Receiver<TransportEvent>,
    ) {
        log::info!("Session loop started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown) | None => break,
                        Some(command) => {
                            if let Err(err) = self.handle_command(command) {
                                log::warn!("Command rejected: {err}");
                            }
                        }
                    }
                }
                event = transport_events.recv() => {
                    if let Some(event) = event {
                        self.handle_transport_event(event);
                    } else {
                        log::warn!("Transport event channel closed");
                        break;
                    }
                }
            }
        }

        self.close();
        let closing = self.connection.take_closing_tasks();
        if !closing.is_empty()
            && tokio::time::timeout(CLOSE_GRACE, join_all(closing))
                .await
                .is_err()
        {
            log::warn!("Channel did not close within {CLOSE_GRACE:?}");
        }
        log::info!("Session loop stopped");
    }

    fn reconcile(&mut self, raw: &str) -> Option<AppendOutcome> {
        let frame = match parse_frame(raw) {
            Ok(frame) => frame,
            Err(err) => {
                log::debug!("Dropping inbound frame: {err}");
                return None;
            }
        };

        let outcome = self
            .store
            .append(ChatMessage::remote(frame.username, frame.text));
        if let AppendOutcome::Confirmed(id) = &outcome {
            log::debug!("Echo confirmed message {id}");
        }
        if outcome.mutated() {
            self.persist();
        }
        Some(outcome)
    }

    fn drain_connection_events(&mut self) {
        for event in self.connection.take_events() {
            match event {
                ConnectionEvent::StateChanged(state) => {
                    log::info!("Connection {state}");
                    if let ConnectionState::Failed(reason) = state {
                        self.warning = Some(format!(
                            "Connection error ({reason}). Please try again later."
                        ));
                    }
                }
                ConnectionEvent::Message(raw) => {
                    self.reconcile(&raw);
                }
            }
        }
    }

    fn persist(&mut self) {
        if self.memory_only {
            log::debug!("Not saving {}: session is memory-only", self.storage_key);
            return;
        }
        if let Err(err) = self.persistence.save(&self.storage_key, self.store.all()) {
            log::warn!("Failed to save messages: {err}");
            self.warning = Some(format!("Unable to save messages: {err}"));
        }
    }

    fn publish(&self) {
        self.snapshot_sender.send_replace(SessionSnapshot {
            identity: self.identity.clone(),
            connection: self.connection.state().clone(),
            messages: Arc::from(self.store.all()),
            warning: self.warning.clone(),
        });
    }
}
