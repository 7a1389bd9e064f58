mod common;
mod config;
mod error;
mod network;
mod session;
mod storage;
mod ui;

use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use network::WebSocketTransport;
use session::{SessionConfig, SessionManager, SessionSnapshot};
use storage::{MemoryStore, Persistence, SqliteStore};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use ui::ChatApp;

use common::{SessionCommand, TransportEvent};

// Covers the session's own close grace plus the final snapshot.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(
    name = "rust_ws_chat",
    version,
    about = "Realtime chat client with persistent history"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Join immediately under this name instead of asking
    #[arg(long)]
    username: Option<String>,
    /// Override the channel endpoint from the config file
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Keep history in memory only
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    if let Some(endpoint) = cli.endpoint {
        app_config.endpoint = endpoint;
    }

    // UI -> Session
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Transport -> Session
    let (event_tx, event_rx) = mpsc::channel(100);

    let transport = WebSocketTransport::new(event_tx);
    let session_config = app_config.session_config();
    let (snapshots, session_task) = if cli.ephemeral {
        spawn_session(session_config, MemoryStore::new(), transport, cmd_rx, event_rx)
    } else {
        match SqliteStore::with_path(&app_config.database_path) {
            Ok(store) => spawn_session(session_config, store, transport, cmd_rx, event_rx),
            Err(err) => {
                log::warn!(
                    "Unable to open {} ({err}); history will not be saved",
                    app_config.database_path
                );
                spawn_session(session_config, MemoryStore::new(), transport, cmd_rx, event_rx)
            }
        }
    };

    if let Some(username) = cli.username {
        if let Err(err) = cmd_tx.try_send(SessionCommand::SelectIdentity(username)) {
            log::warn!("Failed to preselect username: {err}");
        }
    }

    let options = eframe::NativeOptions::default();
    let mut snapshots = Some(snapshots);
    let shutdown_tx = cmd_tx.clone();

    let result = eframe::run_native(
        "Rust WebSocket Chat",
        options,
        Box::new(move |cc| {
            let snapshot_receiver = snapshots
                .take()
                .expect("ChatApp should only be initialized once");

            log::info!("Client started against {}", app_config.endpoint);

            Ok(Box::new(ChatApp::new(cc, cmd_tx.clone(), snapshot_receiver)))
        }),
    );

    log::info!("Window closed, shutting down session");
    if shutdown_tx.send(SessionCommand::Shutdown).await.is_err() {
        log::debug!("Session already stopped");
    }
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, session_task).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::warn!("Session task failed: {err}"),
        Err(_) => log::warn!("Session did not stop within {SHUTDOWN_TIMEOUT:?}"),
    }

    result
}

fn spawn_session<P: Persistence + 'static>(
    config: SessionConfig,
    persistence: P,
    transport: WebSocketTransport,
    commands: mpsc::Receiver<SessionCommand>,
    transport_events: mpsc::Receiver<TransportEvent>,
) -> (watch::Receiver<SessionSnapshot>, JoinHandle<()>) {
    let session = SessionManager::new(config, persistence, transport);
    let snapshots = session.subscribe();
    let task = tokio::spawn(session.run(commands, transport_events));
    (snapshots, task)
}
