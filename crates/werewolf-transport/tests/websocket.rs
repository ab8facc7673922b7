//! Integration tests for the WebSocket adapter.
//!
//! These spin up a real axum server on an OS-assigned port, upgrade a
//! tokio-tungstenite client, and check that bytes flow through
//! `WebSocketConnection` in both directions.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::WebSocketUpgrade;
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use werewolf_transport::{Adapter, Connection, WebSocketConnection};

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server whose only route upgrades and hands the server-side
/// adapter back to the test through a channel.
async fn start_server() -> (SocketAddr, mpsc::UnboundedReceiver<Adapter>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new().route(
        "/",
        get(move |ws: WebSocketUpgrade| {
            let tx = tx.clone();
            async move {
                let response: Response = ws.on_upgrade(move |socket| async move {
                    let _ = tx.send(Adapter::from(WebSocketConnection::new(socket)));
                });
                response
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, rx)
}

async fn connect_client(addr: SocketAddr) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/"))
        .await
        .expect("client should connect");
    ws
}

#[tokio::test]
async fn test_websocket_send_and_receive() {
    let (addr, mut adapters) = start_server().await;
    let mut client = connect_client(addr).await;
    let server_conn = adapters.recv().await.expect("server side adapter");

    assert!(server_conn.is_live());

    // --- Server sends, client receives a text frame ---
    server_conn
        .send(br#"{"type":"Event"}"#)
        .await
        .expect("send should succeed");
    let msg = client.next().await.unwrap().unwrap();
    assert!(msg.is_text(), "JSON should arrive as a text frame");
    assert_eq!(msg.into_data().as_ref(), br#"{"type":"Event"}"#);

    // --- Client sends, server receives ---
    client
        .send(Message::Text("hello from client".into()))
        .await
        .unwrap();
    let received = server_conn
        .recv()
        .await
        .expect("recv should succeed")
        .expect("should have data");
    assert_eq!(received, b"hello from client");

    server_conn.close().await.expect("close should succeed");
}

#[tokio::test]
async fn test_websocket_recv_returns_none_on_client_close() {
    let (addr, mut adapters) = start_server().await;
    let mut client = connect_client(addr).await;
    let server_conn = adapters.recv().await.unwrap();

    client.send(Message::Close(None)).await.unwrap();

    let result = server_conn.recv().await.expect("recv should not error");
    assert!(result.is_none(), "should return None on client close");
}

#[tokio::test]
async fn test_websocket_send_while_recv_pending() {
    // A pending read must not hold up writes to the same socket.
    let (addr, mut adapters) = start_server().await;
    let mut client = connect_client(addr).await;
    let server_conn =
        std::sync::Arc::new(adapters.recv().await.unwrap());

    let reader = std::sync::Arc::clone(&server_conn);
    let pending_read = tokio::spawn(async move { reader.recv().await });

    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        server_conn.send(b"pushed"),
    )
    .await
    .expect("send should not wait for recv")
    .unwrap();

    let msg = client.next().await.unwrap().unwrap();
    assert_eq!(msg.into_data().as_ref(), b"pushed");

    client.send(Message::Text("done".into())).await.unwrap();
    let read = pending_read.await.unwrap().unwrap();
    assert_eq!(read.as_deref(), Some(&b"done"[..]));
}
