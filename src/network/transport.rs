use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::common::{TransportEvent, TransportEventKind};
use crate::error::ConnectionError;

const OUTBOUND_BUFFER: usize = 100;

/// Full-duplex link to the channel.
///
/// `open` only starts the attempt. Its outcome, inbound frames and the
/// eventual close are reported later as [`TransportEvent`]s carrying the
/// generation passed to `open`.
pub trait Transport: Send {
    fn open(&mut self, endpoint: &str, generation: u64) -> Result<(), ConnectionError>;

    fn send(&mut self, frame: String) -> Result<(), ConnectionError>;

    /// Release the current connection, if any. Must be idempotent.
    fn close(&mut self);

    /// Background work still finishing connections released by `close`,
    /// such as sending the close frame. Each handle is returned once.
    fn take_closing_tasks(&mut self) -> Vec<JoinHandle<()>> {
        Vec::new()
    }
}

/// WebSocket transport running each connection in its own tokio task.
///
/// Closing drops the outbound queue; the socket task then sends a close
/// frame and exits. Tasks still running when the transport is dropped are
/// aborted.
pub struct WebSocketTransport {
    event_sender: mpsc::Sender<TransportEvent>,
    outbound: Option<mpsc::Sender<String>>,
    task: Option<JoinHandle<()>>,
    closing: Vec<JoinHandle<()>>,
}

impl WebSocketTransport {
    pub fn new(event_sender: mpsc::Sender<TransportEvent>) -> Self {
        Self {
            event_sender,
            outbound: None,
            task: None,
            closing: Vec::new(),
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, endpoint: &str, generation: u64) -> Result<(), ConnectionError> {
        self.close();

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let events = self.event_sender.clone();
        let endpoint = endpoint.to_string();

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|err| ConnectionError::Transport(format!("no async runtime: {err}")))?;
        self.task = Some(handle.spawn(run_socket(endpoint, generation, events, outbound_rx)));
        self.outbound = Some(outbound_tx);
        Ok(())
    }

    fn send(&mut self, frame: String) -> Result<(), ConnectionError> {
        let Some(outbound) = &self.outbound else {
            return Err(ConnectionError::NotConnected);
        };
        outbound
            .try_send(frame)
            .map_err(|err| ConnectionError::Transport(format!("outbound queue: {err}")))
    }

    fn close(&mut self) {
        self.outbound = None;
        self.closing.retain(|task| !task.is_finished());
        if let Some(task) = self.task.take() {
            self.closing.push(task);
        }
    }

    fn take_closing_tasks(&mut self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut self.closing)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.outbound = None;
        for task in self.task.take().into_iter().chain(self.closing.drain(..)) {
            task.abort();
        }
    }
}

async fn run_socket(
    endpoint: String,
    generation: u64,
    events: mpsc::Sender<TransportEvent>,
    mut outbound: mpsc::Receiver<String>,
) {
    let emit = |kind| {
        let events = events.clone();
        async move {
            if let Err(err) = events.send(TransportEvent::new(generation, kind)).await {
                log::warn!("Failed to deliver transport event: {err}");
            }
        }
    };

    log::info!("Connecting to {endpoint} (attempt {generation})");
    let (stream, _) = match connect_async(endpoint.as_str()).await {
        Ok(connected) => connected,
        Err(err) => {
            log::warn!("WebSocket handshake failed: {err}");
            emit(TransportEventKind::Error(err.to_string())).await;
            return;
        }
    };
    emit(TransportEventKind::Opened).await;

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    log::debug!("Closing socket for attempt {generation}");
                    if let Err(err) = sink.close().await {
                        log::debug!("Close handshake failed: {err}");
                    }
                    break;
                };
                if let Err(err) = sink.send(Message::text(frame)).await {
                    emit(TransportEventKind::Error(err.to_string())).await;
                    break;
                }
            }
            message = source.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        emit(TransportEventKind::Frame(text.as_str().to_owned())).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        emit(TransportEventKind::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        emit(TransportEventKind::Error(err.to_string())).await;
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Everything a [`RecordingTransport`] was asked to do.
    #[derive(Debug, Default)]
    pub struct Recorded {
        pub opened: Vec<(String, u64)>,
        pub sent: Vec<String>,
        pub closes: usize,
        pub fail_open: bool,
        pub fail_send: bool,
        pub closing: Vec<JoinHandle<()>>,
    }

    /// Transport fake that records calls; tests drive events by hand.
    #[derive(Clone, Default)]
    pub struct RecordingTransport {
        pub log: Arc<Mutex<Recorded>>,
    }

    impl RecordingTransport {
        pub fn sent(&self) -> Vec<String> {
            self.log.lock().unwrap().sent.clone()
        }

        pub fn opened(&self) -> Vec<(String, u64)> {
            self.log.lock().unwrap().opened.clone()
        }

        pub fn closes(&self) -> usize {
            self.log.lock().unwrap().closes
        }

        pub fn fail_open(&self) {
            self.log.lock().unwrap().fail_open = true;
        }

        pub fn fail_send(&self) {
            self.log.lock().unwrap().fail_send = true;
        }

        /// Report `task` as still closing on the next `take_closing_tasks`.
        pub fn push_closing(&self, task: JoinHandle<()>) {
            self.log.lock().unwrap().closing.push(task);
        }
    }

    impl Transport for RecordingTransport {
        fn open(&mut self, endpoint: &str, generation: u64) -> Result<(), ConnectionError> {
            let mut log = self.log.lock().unwrap();
            if log.fail_open {
                return Err(ConnectionError::Transport("refused".to_string()));
            }
            log.opened.push((endpoint.to_string(), generation));
            Ok(())
        }

        fn send(&mut self, frame: String) -> Result<(), ConnectionError> {
            let mut log = self.log.lock().unwrap();
            if log.fail_send {
                return Err(ConnectionError::Transport("broken pipe".to_string()));
            }
            log.sent.push(frame);
            Ok(())
        }

        fn close(&mut self) {
            self.log.lock().unwrap().closes += 1;
        }

        fn take_closing_tasks(&mut self) -> Vec<JoinHandle<()>> {
            std::mem::take(&mut self.log.lock().unwrap().closing)
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    #[tokio::test]
    async fn send_without_open_is_rejected() {
        let (tx, _rx) = mpsc::channel(4);
        let mut transport = WebSocketTransport::new(tx);
        assert_eq!(
            transport.send("frame".to_string()),
            Err(ConnectionError::NotConnected)
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_error_for_its_generation() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut transport = WebSocketTransport::new(tx);
        transport.open("ws://127.0.0.1:1/", 7).unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.generation, 7);
        assert!(matches!(event.kind, TransportEventKind::Error(_)));
    }

    #[tokio::test]
    async fn close_sends_close_frame_to_the_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}/", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(socket).await.unwrap();
            while let Some(message) = socket.next().await {
                match message {
                    Ok(Message::Close(_)) => return true,
                    Ok(_) => {}
                    Err(_) => return false,
                }
            }
            false
        });

        let (tx, mut rx) = mpsc::channel(4);
        let mut transport = WebSocketTransport::new(tx);
        transport.open(&endpoint, 1).unwrap();
        let opened = rx.recv().await.unwrap();
        assert!(matches!(opened.kind, TransportEventKind::Opened));

        transport.close();
        let closing = transport.take_closing_tasks();
        assert_eq!(closing.len(), 1);
        for task in closing {
            task.await.unwrap();
        }
        assert!(transport.take_closing_tasks().is_empty());

        assert!(server.await.unwrap());
    }
}
