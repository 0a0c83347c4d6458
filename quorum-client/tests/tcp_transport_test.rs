//! TCP transport tests against scripted loopback servers.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use quorum_client::{ChannelSink, ClientConfig, StreamEvent, TcpTransport, Transport};
use quorum_core::protocol::WireMessage;
use quorum_core::QuorumError;

/// Reads one complete wire message off the socket.
async fn read_message(socket: &mut TcpStream, buffer: &mut BytesMut) -> WireMessage {
    loop {
        if let Some(message) = WireMessage::read_from(buffer).unwrap() {
            return message;
        }
        let n = socket.read_buf(buffer).await.unwrap();
        assert!(n > 0, "peer closed while a message was expected");
    }
}

/// Writes one wire message to the socket.
async fn write_message(socket: &mut TcpStream, message: WireMessage) {
    let mut buffer = BytesMut::new();
    message.write_to(&mut buffer);
    socket.write_all(&buffer).await.unwrap();
}

/// Binds a loopback listener and returns its address.
async fn listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    (listener, address)
}

fn transport_for(address: SocketAddr) -> TcpTransport {
    let config = ClientConfig::builder(address)
        .connect_timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    TcpTransport::new(config)
}

#[tokio::test]
async fn test_unary_roundtrip() {
    let (listener, address) = listener().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = BytesMut::new();
        let request = read_message(&mut socket, &mut buffer).await;
        assert!(!request.is_query());

        write_message(
            &mut socket,
            WireMessage::response(request.correlation_id, request.body),
        )
        .await;
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();

    let response = transport.command(Bytes::from_static(b"ping")).await.unwrap();
    assert_eq!(response, Bytes::from_static(b"ping"));

    server.await.unwrap();
    transport.close().await.unwrap();
}

#[tokio::test]
async fn test_query_carries_read_only_flag() {
    let (listener, address) = listener().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = BytesMut::new();
        let request = read_message(&mut socket, &mut buffer).await;
        assert!(request.is_query());

        write_message(
            &mut socket,
            WireMessage::response(request.correlation_id, Bytes::from_static(b"value")),
        )
        .await;
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();

    let response = transport.query(Bytes::from_static(b"key")).await.unwrap();
    assert_eq!(response, Bytes::from_static(b"value"));

    server.await.unwrap();
}

#[tokio::test]
async fn test_out_of_order_responses_reach_their_callers() {
    let (listener, address) = listener().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = BytesMut::new();
        let first = read_message(&mut socket, &mut buffer).await;
        let second = read_message(&mut socket, &mut buffer).await;

        // Reply in reverse submission order.
        write_message(
            &mut socket,
            WireMessage::response(second.correlation_id, second.body),
        )
        .await;
        write_message(
            &mut socket,
            WireMessage::response(first.correlation_id, first.body),
        )
        .await;
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();

    let (a, b) = tokio::join!(
        transport.command(Bytes::from_static(b"a")),
        transport.command(Bytes::from_static(b"b")),
    );

    assert_eq!(a.unwrap(), Bytes::from_static(b"a"));
    assert_eq!(b.unwrap(), Bytes::from_static(b"b"));

    server.await.unwrap();
}

#[tokio::test]
async fn test_stream_frames_then_complete() {
    let (listener, address) = listener().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = BytesMut::new();
        let request = read_message(&mut socket, &mut buffer).await;
        let id = request.correlation_id;

        for value in [0x10u8, 0x11, 0x12] {
            write_message(
                &mut socket,
                WireMessage::stream_frame(id, Bytes::copy_from_slice(&[value])),
            )
            .await;
        }
        write_message(&mut socket, WireMessage::stream_complete(id)).await;
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();

    let (sink, mut events) = ChannelSink::new();
    timeout(
        Duration::from_secs(2),
        transport.command_stream(Bytes::from_static(b"listen"), Box::new(sink)),
    )
    .await
    .expect("stream did not terminate")
    .unwrap();

    let mut frames = Vec::new();
    let mut completes = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            StreamEvent::Next(frame) => frames.push(frame),
            StreamEvent::Complete => completes += 1,
            StreamEvent::Error(error) => panic!("unexpected stream error: {error}"),
        }
    }

    assert_eq!(
        frames,
        vec![
            Bytes::from_static(&[0x10]),
            Bytes::from_static(&[0x11]),
            Bytes::from_static(&[0x12]),
        ]
    );
    assert_eq!(completes, 1);

    server.await.unwrap();
}

#[tokio::test]
async fn test_disconnect_fails_unary_and_stream_in_flight() {
    let (listener, address) = listener().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = BytesMut::new();
        // Take both requests, answer neither, drop the connection.
        let _ = read_message(&mut socket, &mut buffer).await;
        let _ = read_message(&mut socket, &mut buffer).await;
        drop(socket);
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();

    let (sink, mut events) = ChannelSink::new();
    let (unary, stream) = tokio::join!(
        transport.command(Bytes::from_static(b"unary")),
        transport.command_stream(Bytes::from_static(b"stream"), Box::new(sink)),
    );

    let err = unary.unwrap_err();
    assert!(matches!(err, QuorumError::Transport { .. }));

    // The stream call resolves at termination; its error went to the sink.
    stream.unwrap();
    assert!(matches!(
        events.try_recv(),
        Ok(StreamEvent::Error(QuorumError::Transport { .. }))
    ));
    assert!(events.try_recv().is_err());

    // The transport is closed; further writes are rejected synchronously.
    let err = transport.command(Bytes::from_static(b"after")).await.unwrap_err();
    assert!(matches!(err, QuorumError::NotConnected));

    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    let (listener, address) = listener().await;
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        // Hold the connection open until the client is done.
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(socket);
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();
    transport.connect().await.unwrap();
    assert_eq!(transport.state_name().await, "connected");

    transport.close().await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_close_is_idempotent_and_terminal() {
    let (listener, address) = listener().await;
    let server = tokio::spawn(async move {
        let _ = listener.accept().await;
    });

    let transport = transport_for(address);
    transport.connect().await.unwrap();

    transport.close().await.unwrap();
    transport.close().await.unwrap();
    assert_eq!(transport.state_name().await, "closed");

    let err = transport.command(Bytes::from_static(b"x")).await.unwrap_err();
    assert!(matches!(err, QuorumError::NotConnected));

    let err = transport.connect().await.unwrap_err();
    assert!(matches!(err, QuorumError::NotConnected));

    server.await.unwrap();
}

#[tokio::test]
async fn test_close_fails_in_flight_requests() {
    let (listener, address) = listener().await;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = BytesMut::new();
        let _ = read_message(&mut socket, &mut buffer).await;
        // Never reply; wait for the client to close.
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let transport = std::sync::Arc::new(transport_for(address));
    transport.connect().await.unwrap();

    let pending = tokio::spawn({
        let transport = transport.clone();
        async move {
            transport
                .command(Bytes::from_static(b"never answered"))
                .await
        }
    });

    // Give the request time to reach the wire before closing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    transport.close().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, QuorumError::Transport { .. }));

    server.abort();
}
