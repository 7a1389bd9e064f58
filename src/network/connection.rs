use std::mem;

use tokio::task::JoinHandle;

use crate::common::{
    ConnectionEvent, ConnectionState, Identity, TransportEvent, TransportEventKind,
};
use crate::error::ConnectionError;

use super::transport::Transport;

/// Owns the lifecycle of the single channel connection.
///
/// Every `connect` starts a new generation. Transport events tagged with
/// any other generation, or arriving after the attempt was closed or
/// failed, are dropped. State changes and inbound frames are queued as
/// [`ConnectionEvent`]s and collected with [`ConnectionController::take_events`].
pub struct ConnectionController<T: Transport> {
    transport: T,
    endpoint: String,
    state: ConnectionState,
    generation: u64,
    live_generation: Option<u64>,
    events: Vec<ConnectionEvent>,
}

impl<T: Transport> ConnectionController<T> {
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            state: ConnectionState::Disconnected,
            generation: 0,
            live_generation: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connect(&mut self, identity: &Identity) {
        if self.state.is_live() {
            log::debug!("connect({identity}) ignored: already {}", self.state);
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        self.live_generation = Some(generation);
        log::info!("Opening channel connection for {identity} (generation {generation})");
        self.transition(ConnectionState::Connecting);

        if let Err(err) = self.transport.open(&self.endpoint, generation) {
            log::warn!("Failed to start connection: {err}");
            self.fail(err.to_string());
        }
    }

    pub fn send(&mut self, payload: String) -> Result<(), ConnectionError> {
        if !self.state.is_connected() {
            log::warn!("Dropping outbound frame while {}", self.state);
            return Err(ConnectionError::NotConnected);
        }

        if let Err(err) = self.transport.send(payload) {
            log::warn!("Send failed: {err}");
            self.fail(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.transport.close();
        self.live_generation = None;
        self.transition(ConnectionState::Disconnected);
    }

    /// Apply a transport notification if it belongs to the live attempt.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.live_generation != Some(event.generation) {
            log::debug!(
                "Ignoring stale transport event from generation {} (live: {:?})",
                event.generation,
                self.live_generation
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened => {
                if self.state == ConnectionState::Connecting {
                    log::info!("Channel connection established");
                    self.transition(ConnectionState::Connected);
                }
            }
            TransportEventKind::Frame(raw) => {
                if self.state.is_connected() {
                    self.events.push(ConnectionEvent::Message(raw));
                } else {
                    log::debug!("Dropping frame received while {}", self.state);
                }
            }
            TransportEventKind::Error(reason) => {
                log::warn!("Transport error: {reason}");
                self.fail(reason);
            }
            TransportEventKind::Closed => {
                log::info!("Channel closed the connection");
                self.transport.close();
                self.live_generation = None;
                self.transition(ConnectionState::Disconnected);
            }
        }
    }

    /// Handles of released connections that are still shutting down.
    pub fn take_closing_tasks(&mut self) -> Vec<JoinHandle<()>> {
        self.transport.take_closing_tasks()
    }

    /// Drain the events emitted since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<ConnectionEvent> {
        mem::take(&mut self.events)
    }

    fn fail(&mut self, reason: String) {
        self.transport.close();
        self.live_generation = None;
        self.transition(ConnectionState::Failed(reason));
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }
        log::debug!("Connection state {} -> {}", self.state, next);
        self.state = next.clone();
        self.events.push(ConnectionEvent::StateChanged(next));
    }
}
