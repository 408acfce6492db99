use std::time::Duration;

use futures::StreamExt;
use sheetdrop_core::SelectedFile;
use tokio::{runtime::Handle, sync::mpsc, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::UiEvent;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(12);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
        }
    }
}

#[derive(Debug)]
enum ConnectionCommand {
    SendSelected(Vec<SelectedFile>),
}

/// The one socket handle for this process.
///
/// Opened once from the top-level scope before the UI loop starts and passed
/// to the app, so repaints cannot create further connections. The handle owns
/// the socket task; `close` ends it. There is no reconnect: a failed or
/// dropped connection stays Disconnected for the rest of the session.
#[derive(Debug)]
pub struct Connection {
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl Connection {
    pub fn open(
        handle: &Handle,
        server_url: String,
        ui_event_tx: std::sync::mpsc::Sender<UiEvent>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = handle.spawn(run_connection(server_url, ui_event_tx, command_rx));
        Self { command_tx, task }
    }

    /// The declared outbound action. No outbound message protocol is defined
    /// yet; the socket task logs the request and sends nothing.
    pub fn request_send(&self, files: Vec<SelectedFile>) {
        let _ = self
            .command_tx
            .send(ConnectionCommand::SendSelected(files));
    }

    pub fn close(&self) {
        self.task.abort();
    }
}

async fn run_connection(
    server_url: String,
    ui_event_tx: std::sync::mpsc::Sender<UiEvent>,
    mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
) {
    let _ = ui_event_tx.send(UiEvent::Connection(ConnectionStatus::Connecting));

    // Single attempt: a dead endpoint leaves the session Disconnected.
    let mut ws_stream = match timeout(CONNECT_TIMEOUT, connect_async(&server_url)).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(err)) => {
            error!(%server_url, "connect failed: {err}");
            let _ = ui_event_tx.send(UiEvent::Connection(ConnectionStatus::Disconnected));
            return;
        }
        Err(_) => {
            error!(%server_url, "connect timed out after {CONNECT_TIMEOUT:?}");
            let _ = ui_event_tx.send(UiEvent::Connection(ConnectionStatus::Disconnected));
            return;
        }
    };

    info!(%server_url, "websocket connected");
    let _ = ui_event_tx.send(UiEvent::Connection(ConnectionStatus::Connected));

    loop {
        tokio::select! {
            inbound = ws_stream.next() => {
                match inbound {
                    // Inbound traffic is logged raw; no schema is defined.
                    Some(Ok(Message::Text(text))) => info!(%text, "inbound message"),
                    Some(Ok(Message::Binary(data))) => {
                        info!(len = data.len(), "inbound binary message");
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!("server closed the connection");
                        let _ = ui_event_tx.send(UiEvent::Connection(ConnectionStatus::Disconnected));
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        error!("read failed: {err}");
                        let _ = ui_event_tx.send(UiEvent::Connection(ConnectionStatus::Disconnected));
                        break;
                    }
                }
            }
            command = command_rx.recv() => {
                match command {
                    Some(ConnectionCommand::SendSelected(files)) => {
                        match serde_json::to_string(&files) {
                            Ok(json) => debug!(
                                count = files.len(),
                                selection = %json,
                                "send requested; no outbound protocol is defined"
                            ),
                            Err(err) => warn!("selection could not be serialized: {err}"),
                        }
                    }
                    // The handle was dropped; end the session.
                    None => break,
                }
            }
        }
    }
}
