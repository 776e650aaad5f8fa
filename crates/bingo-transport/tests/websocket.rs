//! Integration tests for the WebSocket transport against a real client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use bingo_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port, connects one client and returns both ends.
    async fn connected_pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");

        let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("accept task should complete");
        (conn, client)
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (conn, mut client) = connected_pair().await;
        assert!(conn.id().into_inner() > 0);

        conn.send(br#"{"type":"gameStarted"}"#)
            .await
            .expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "utf-8 payloads go out as text frames");
        assert_eq!(msg.into_data().as_ref(), br#"{"type":"gameStarted"}"#);

        client
            .send(Message::Text(r#"{"type":"heartbeat","clientTime":1}"#.into()))
            .await
            .unwrap();
        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, br#"{"type":"heartbeat","clientTime":1}"#);

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_non_utf8_payload_is_sent_as_binary() {
        let (conn, mut client) = connected_pair().await;

        conn.send(&[0xff, 0x00]).await.expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
    }

    #[tokio::test]
    async fn test_send_while_recv_is_pending() {
        let (conn, mut client) = connected_pair().await;
        let conn = std::sync::Arc::new(conn);

        let reader = std::sync::Arc::clone(&conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The reader holds the read half; writing must still go through.
        tokio::time::timeout(Duration::from_secs(1), conn.send(b"ping"))
            .await
            .expect("send must not wait on the pending recv")
            .expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"ping");

        client.send(Message::Close(None)).await.unwrap();
        let result = pending.await.unwrap().expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (conn, mut client) = connected_pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_pong_from_client_refreshes_last_seen() {
        let (conn, mut client) = connected_pair().await;
        let conn = std::sync::Arc::new(conn);
        let accepted = conn.last_seen();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let reader = std::sync::Arc::clone(&conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        conn.ping().await.expect("ping should send");

        // Reading the ping queues the automatic pong, which goes out ahead
        // of the close.
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_ping());
        client.send(Message::Close(None)).await.unwrap();

        let result = pending.await.unwrap().expect("recv should not error");
        assert!(result.is_none(), "the pong itself is not a data frame");
        assert!(conn.last_seen() > accepted);
    }
}
