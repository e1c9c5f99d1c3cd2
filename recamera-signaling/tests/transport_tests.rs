//! Integration tests for the signaling transport
//!
//! Each test runs a throwaway gateway on a local port and drives a real
//! WebSocket connection against it.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use recamera_core::ConsoleError;
use recamera_signaling::{SignalingMessage, SignalingTransport, TransportEvent, TransportState};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

type GatewaySocket = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

/// Accept a single connection and hand the server side to the test
async fn start_gateway() -> (String, oneshot::Receiver<GatewaySocket>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = accept_async(stream).await {
                let _ = tx.send(ws);
            }
        }
    });
    (format!("ws://{}/go2rtc/api/ws?src=main", addr), rx)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for transport event")
        .expect("event channel closed")
}

async fn next_text(server: &mut GatewaySocket) -> String {
    loop {
        match timeout(WAIT, server.next()).await.unwrap() {
            Some(Ok(Message::Text(text))) => return text,
            Some(Ok(_)) => continue,
            other => panic!("gateway expected text, got {:?}", other),
        }
    }
}

fn answer() -> Message {
    Message::Text(r#"{"type":"webrtc/answer","value":"v=0"}"#.to_string())
}

#[tokio::test]
async fn test_offer_reaches_gateway_and_answer_reaches_handlers_in_order() {
    let (url, server) = start_gateway().await;
    let (transport, mut events) = SignalingTransport::connect(url);

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let first_tx = seen_tx.clone();
    let _first = transport.on_message(move |msg| {
        let _ = first_tx.send(("first", msg.clone()));
    });
    let _second = transport.on_message(move |msg| {
        let _ = seen_tx.send(("second", msg.clone()));
    });

    assert_eq!(next_event(&mut events).await, TransportEvent::Open);
    assert_eq!(transport.state(), TransportState::Open);
    let mut server = timeout(WAIT, server).await.unwrap().unwrap();

    transport
        .send(&SignalingMessage::Offer {
            sdp: "offer-sdp".to_string(),
        })
        .unwrap();
    let received = SignalingMessage::from_json(&next_text(&mut server).await).unwrap();
    assert_eq!(
        received,
        SignalingMessage::Offer {
            sdp: "offer-sdp".to_string()
        }
    );

    server.send(answer()).await.unwrap();
    let (tag, msg) = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(tag, "first");
    assert_eq!(msg, SignalingMessage::Answer { sdp: "v=0".into() });
    let (tag, _) = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(tag, "second");
}

#[tokio::test]
async fn test_binary_and_malformed_frames_are_skipped() {
    let (url, server) = start_gateway().await;
    let (transport, mut events) = SignalingTransport::connect(url);
    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let _sub = transport.on_message(move |msg| {
        let _ = seen_tx.send(msg.clone());
    });

    assert_eq!(next_event(&mut events).await, TransportEvent::Open);
    let mut server = timeout(WAIT, server).await.unwrap().unwrap();

    server.send(Message::Binary(vec![0, 1, 2, 3])).await.unwrap();
    server.send(Message::Text("{not json".to_string())).await.unwrap();
    server.send(answer()).await.unwrap();

    let msg = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(msg.kind(), "webrtc/answer");
    assert!(seen_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_unsubscribed_handler_stops_receiving() {
    let (url, server) = start_gateway().await;
    let (transport, mut events) = SignalingTransport::connect(url);

    let (dropped_tx, mut dropped_rx) = mpsc::unbounded_channel();
    let (kept_tx, mut kept_rx) = mpsc::unbounded_channel();
    let dropped = transport.on_message(move |msg| {
        let _ = dropped_tx.send(msg.clone());
    });
    let _kept = transport.on_message(move |msg| {
        let _ = kept_tx.send(msg.clone());
    });
    dropped.unsubscribe();

    assert_eq!(next_event(&mut events).await, TransportEvent::Open);
    let mut server = timeout(WAIT, server).await.unwrap().unwrap();
    server.send(answer()).await.unwrap();

    timeout(WAIT, kept_rx.recv()).await.unwrap().unwrap();
    assert!(dropped_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_connect_failure_is_reported_as_events() {
    // Grab a free port and release it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (transport, mut events) = SignalingTransport::connect(format!("ws://{}/", addr));
    assert!(matches!(next_event(&mut events).await, TransportEvent::Error { .. }));
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Closed {
            code: None,
            by_client: false
        }
    );

    assert!(matches!(
        transport.send(&SignalingMessage::Candidate {
            candidate: "c".into()
        }),
        Err(ConsoleError::NotConnected)
    ));
    transport.close();
    transport.close();
    assert_eq!(transport.state(), TransportState::Closed);
}

#[tokio::test]
async fn test_client_close_is_idempotent() {
    let (url, server) = start_gateway().await;
    let (transport, mut events) = SignalingTransport::connect(url);
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);
    let mut server = timeout(WAIT, server).await.unwrap().unwrap();

    transport.close();
    transport.close();
    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Closed {
            code: None,
            by_client: true
        }
    );
    assert!(matches!(
        timeout(WAIT, server.next()).await.unwrap(),
        Some(Ok(Message::Close(_)))
    ));

    timeout(WAIT, transport.closed()).await.unwrap();
    transport.close();
    assert_eq!(transport.state(), TransportState::Closed);
    assert!(transport.send(&SignalingMessage::Offer { sdp: String::new() }).is_err());
}

#[tokio::test]
async fn test_gateway_close_carries_code() {
    let (url, server) = start_gateway().await;
    let (_transport, mut events) = SignalingTransport::connect(url);
    assert_eq!(next_event(&mut events).await, TransportEvent::Open);
    let mut server = timeout(WAIT, server).await.unwrap().unwrap();

    server
        .close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        }))
        .await
        .unwrap();

    assert_eq!(
        next_event(&mut events).await,
        TransportEvent::Closed {
            code: Some(1000),
            by_client: false
        }
    );
}
