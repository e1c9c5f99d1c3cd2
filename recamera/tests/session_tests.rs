//! Integration tests for the WebRTC session controller
//!
//! A real signaling socket talks to an in-process gateway while a mock peer
//! connection stands in for the WebRTC stack.

mod common;

use std::sync::Arc;

use common::*;
use recamera::{MediaTrack, PeerConfig, PeerConnectionState, PeerEvent, SessionState, SignalingMessage, TrackKind, WebRtcSession};
use recamera_media::TransceiverDirection;
use tokio::net::TcpListener;

fn session(factory: &Arc<MockPeerFactory>) -> WebRtcSession {
    WebRtcSession::new(factory.clone(), PeerConfig::default())
}

#[tokio::test]
async fn test_offer_answer_and_candidate_exchange() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    let mut state = session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;
    assert_eq!(
        next_message(&mut server).await,
        SignalingMessage::Offer {
            sdp: "offer-1".to_string()
        }
    );
    wait_for_state(&mut state, |s| *s == SessionState::OfferSent).await;

    let peer = factory.peer(1).await;
    assert_eq!(
        *peer.transceivers.lock(),
        vec![
            (TrackKind::Video, TransceiverDirection::RecvOnly),
            (TrackKind::Audio, TransceiverDirection::RecvOnly),
        ]
    );

    send(&mut server, &SignalingMessage::Answer { sdp: "answer-1".into() }).await;
    send(
        &mut server,
        &SignalingMessage::Candidate {
            candidate: "remote-1".into(),
        },
    )
    .await;
    eventually(|| peer.candidates.lock().len() == 1).await;
    assert_eq!(peer.remote_answer.lock().as_deref(), Some("answer-1"));
    assert_eq!(peer.candidates.lock()[0], ("remote-1".to_string(), "0".to_string()));

    peer.emit(PeerEvent::IceCandidate("local-1".to_string()));
    assert_eq!(
        next_message(&mut server).await,
        SignalingMessage::Candidate {
            candidate: "local-1".to_string()
        }
    );

    peer.emit(PeerEvent::Track(MediaTrack::new("video0", TrackKind::Video)));
    peer.emit(PeerEvent::StateChanged(PeerConnectionState::Connected));
    wait_for_state(&mut state, SessionState::is_connected).await;
    assert!(session.stream().unwrap().has_video());
    assert!(session.session_id().is_some());
    assert_eq!(session.url().unwrap(), gateway.url("main"));
}

#[tokio::test]
async fn test_bad_answer_and_candidate_are_not_fatal() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    let mut state = session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;
    next_message(&mut server).await;
    wait_for_state(&mut state, |s| *s == SessionState::OfferSent).await;
    let peer = factory.peer(1).await;

    send(&mut server, &SignalingMessage::Answer { sdp: "bad".into() }).await;
    send(&mut server, &SignalingMessage::Candidate { candidate: "bad".into() }).await;
    send(
        &mut server,
        &SignalingMessage::Error {
            message: "stream busy".into(),
        },
    )
    .await;
    send(&mut server, &SignalingMessage::Candidate { candidate: "good".into() }).await;

    eventually(|| peer.candidates.lock().len() == 1).await;
    assert_eq!(peer.candidates.lock()[0].0, "good");
    assert_eq!(session.state(), SessionState::OfferSent);
    assert!(!peer.is_closed());
}

#[tokio::test]
async fn test_webrtc_error_from_gateway_fails_session() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    let mut state = session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;
    next_message(&mut server).await;
    let peer = factory.peer(1).await;

    send(
        &mut server,
        &SignalingMessage::Error {
            message: "webrtc/offer: codec not supported".into(),
        },
    )
    .await;

    let failed = wait_for_state(&mut state, SessionState::is_failed).await;
    assert_eq!(
        failed,
        SessionState::Failed {
            reason: "webrtc/offer: codec not supported".to_string()
        }
    );
    assert!(peer.is_closed());
    expect_closed(&mut server).await;
}

#[tokio::test]
async fn test_unreachable_gateway_surfaces_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);
    let mut state = session
        .start(format!("ws://{}/go2rtc/api/ws?src=main", addr))
        .await;

    match wait_for_state(&mut state, SessionState::is_failed).await {
        SessionState::Failed { reason } => assert!(reason.starts_with("Signaling connection error")),
        other => panic!("unexpected state {:?}", other),
    }
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn test_offer_failure_fails_session() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::failing_offers());
    let session = session(&factory);

    let mut state = session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;

    match wait_for_state(&mut state, SessionState::is_failed).await {
        SessionState::Failed { reason } => assert!(reason.starts_with("Failed to create WebRTC offer")),
        other => panic!("unexpected state {:?}", other),
    }
    assert!(factory.peer(1).await.is_closed());
    expect_closed(&mut server).await;
}

#[tokio::test]
async fn test_lost_connection_tears_down_without_reconnecting() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    let mut state = session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;
    next_message(&mut server).await;
    let peer = factory.peer(1).await;
    peer.emit(PeerEvent::StateChanged(PeerConnectionState::Connected));
    wait_for_state(&mut state, SessionState::is_connected).await;

    peer.emit(PeerEvent::StateChanged(PeerConnectionState::Disconnected));
    let failed = wait_for_state(&mut state, SessionState::is_failed).await;
    assert_eq!(
        failed,
        SessionState::Failed {
            reason: "WebRTC connection lost".to_string()
        }
    );
    assert!(peer.is_closed());
    assert!(session.stream().is_none());
    expect_closed(&mut server).await;
    assert_eq!(factory.created(), 1);
}

#[tokio::test]
async fn test_gateway_close_surfaces_error() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    let mut state = session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;
    next_message(&mut server).await;
    server.close(None).await.unwrap();

    let failed = wait_for_state(&mut state, SessionState::is_failed).await;
    assert_eq!(
        failed,
        SessionState::Failed {
            reason: "Signaling connection closed".to_string()
        }
    );
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    session.stop().await;
    session.stop().await;
    assert_eq!(session.state(), SessionState::Idle);

    session.start(gateway.url("main")).await;
    let mut server = gateway.accept().await;
    next_message(&mut server).await;
    let peer = factory.peer(1).await;
    peer.emit(PeerEvent::Track(MediaTrack::new("video0", TrackKind::Video)));
    eventually(|| session.stream().is_some()).await;

    session.stop().await;
    session.stop().await;
    assert_eq!(session.state(), SessionState::Closed);
    assert!(peer.is_closed());
    assert!(peer.senders_stopped());
    assert!(session.stream().is_none());
    assert!(session.session_id().is_none());
    expect_closed(&mut server).await;
}

#[tokio::test]
async fn test_restart_tears_down_before_new_offer() {
    let mut gateway = Gateway::start().await;
    let factory = Arc::new(MockPeerFactory::default());
    let session = session(&factory);

    session.start(gateway.url("main")).await;
    let mut first = gateway.accept().await;
    next_message(&mut first).await;
    let first_peer = factory.peer(1).await;
    first_peer.emit(PeerEvent::StateChanged(PeerConnectionState::Connected));
    eventually(|| session.is_connected()).await;
    let first_id = session.session_id().unwrap();

    let mut state = session.start(gateway.url("sub")).await;
    let mut second = gateway.accept().await;
    assert_eq!(
        next_message(&mut second).await,
        SignalingMessage::Offer {
            sdp: "offer-2".to_string()
        }
    );
    wait_for_state(&mut state, |s| *s == SessionState::OfferSent).await;

    let log = factory.log();
    let closed_first = log.iter().position(|e| e == "close:1").unwrap();
    let second_offer = log.iter().position(|e| e == "offer:2").unwrap();
    assert!(closed_first < second_offer, "log: {:?}", log);
    assert!(first_peer.is_closed());
    expect_closed(&mut first).await;

    assert_ne!(session.session_id().unwrap(), first_id);
    assert!(session.url().unwrap().ends_with("src=sub"));
}
