use std::time::Duration;

use futures::{SinkExt, StreamExt};
use sheetdrop_client::{
    UiEvent,
    connection::{Connection, ConnectionStatus},
};
use sheetdrop_core::{MIME_CSV, SelectedFile};
use tokio::{net::TcpListener, runtime::Handle, sync::oneshot};
use tokio_tungstenite::{accept_async, tungstenite::Message};

fn recv_status(
    rx: &std::sync::mpsc::Receiver<UiEvent>,
    wait: Duration,
) -> Option<ConnectionStatus> {
    match rx.recv_timeout(wait) {
        Ok(UiEvent::Connection(status)) => Some(status),
        Ok(_) => None,
        Err(_) => None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_connect_attempt_yields_one_connected_event() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let address = listener.local_addr().expect("listener local addr");
    let (inbound_tx, mut inbound_rx) = oneshot::channel::<Message>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept client");
        let mut ws_stream = accept_async(stream).await.expect("websocket handshake");
        ws_stream
            .send(Message::Text("report backend ready".into()))
            .await
            .expect("send greeting");
        // Report the first inbound message, if any ever arrives.
        if let Some(Ok(message)) = ws_stream.next().await {
            let _ = inbound_tx.send(message);
        }
    });

    let (ui_event_tx, ui_event_rx) = std::sync::mpsc::channel();
    let connection = Connection::open(&Handle::current(), format!("ws://{address}"), ui_event_tx);

    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(2)),
        Some(ConnectionStatus::Connecting)
    );
    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(2)),
        Some(ConnectionStatus::Connected)
    );

    // The declared send action must not put anything on the wire.
    connection.request_send(vec![SelectedFile {
        name: "data.csv".to_owned(),
        size_bytes: 4,
        mime: MIME_CSV.to_owned(),
    }]);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(
        inbound_rx.try_recv().is_err(),
        "send stub wrote to the socket"
    );
    assert!(
        recv_status(&ui_event_rx, Duration::from_millis(200)).is_none(),
        "unexpected extra status event"
    );

    connection.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_connect_stays_disconnected_without_retry() {
    // Grab a loopback port with no listener behind it.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("listener local addr");
    drop(listener);

    let (ui_event_tx, ui_event_rx) = std::sync::mpsc::channel();
    let connection = Connection::open(&Handle::current(), format!("ws://{address}"), ui_event_tx);

    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(2)),
        Some(ConnectionStatus::Connecting)
    );
    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(5)),
        Some(ConnectionStatus::Disconnected)
    );
    assert!(
        recv_status(&ui_event_rx, Duration::from_millis(400)).is_none(),
        "no reconnect attempt should follow"
    );

    connection.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_connection_is_never_recovered() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let address = listener.local_addr().expect("listener local addr");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept client");
        let mut ws_stream = accept_async(stream).await.expect("websocket handshake");
        let _ = ws_stream.close(None).await;
    });

    let (ui_event_tx, ui_event_rx) = std::sync::mpsc::channel();
    let connection = Connection::open(&Handle::current(), format!("ws://{address}"), ui_event_tx);

    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(2)),
        Some(ConnectionStatus::Connecting)
    );
    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(2)),
        Some(ConnectionStatus::Connected)
    );
    assert_eq!(
        recv_status(&ui_event_rx, Duration::from_secs(2)),
        Some(ConnectionStatus::Disconnected)
    );
    assert!(
        recv_status(&ui_event_rx, Duration::from_millis(400)).is_none(),
        "connection must stay down for the rest of the session"
    );

    connection.close();
}
