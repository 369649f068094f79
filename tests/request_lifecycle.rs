//! Integration tests for the request state machine.

mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use common::{CaptureTransport, wait_for_frames};
use rstest::rstest;
use tagwire::{
    Connection,
    Protocol,
    Reply,
    Request,
    RequestError,
    WireMessage,
    pack,
    proto::{ChatProtocol, PostAccepted, PostDenied, PostExchange, PostRequest},
};

fn setup() -> (Arc<CaptureTransport>, Arc<Connection<ChatProtocol>>) {
    let transport = Arc::new(CaptureTransport::new());
    let conn = Arc::new(Connection::<ChatProtocol>::new(
        Arc::clone(&transport) as Arc<dyn tagwire::Transport>
    ));
    (transport, conn)
}

fn post() -> PostRequest {
    PostRequest {
        uuid: "u1".into(),
        message: "hello".into(),
    }
}

#[rstest]
#[tokio::test]
async fn second_send_while_pending_is_rejected() {
    let (transport, conn) = setup();
    let request = Arc::new(Request::<PostExchange>::new(Arc::clone(&conn)));

    let pending_request = Arc::clone(&request);
    let pending = tokio::spawn(async move { pending_request.send(&post()).await });
    wait_for_frames(&transport, 1).await;

    let err = request.send(&post()).await.expect_err("must fail");
    assert!(matches!(err, RequestError::Busy));

    // Resolve the first call so the task finishes cleanly.
    let sequence = transport.header(0).sequence;
    let frame = pack(&PostAccepted, ChatProtocol::SIGNATURE, sequence).expect("pack");
    assert!(conn.handle_data(&frame).is_empty());
    let reply = pending.await.expect("join").expect("resolved");
    assert_eq!(reply, Reply::Accepted(PostAccepted));
}

#[rstest]
#[tokio::test]
async fn send_after_destroy_is_rejected() {
    let (_transport, conn) = setup();
    let request = Request::<PostExchange>::new(conn);
    request.destroy();
    assert!(request.is_destroyed());

    let err = request.send(&post()).await.expect_err("must fail");
    assert!(matches!(err, RequestError::Destroyed));
}

#[rstest]
#[tokio::test]
async fn response_after_destroy_is_discarded_and_callbacks_skipped() {
    let (transport, conn) = setup();
    let accepted_calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted_calls);
    let request = Arc::new(
        Request::<PostExchange>::new(Arc::clone(&conn)).on_accept(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let pending_request = Arc::clone(&request);
    let pending = tokio::spawn(async move { pending_request.send(&post()).await });
    wait_for_frames(&transport, 1).await;

    request.destroy();

    let sequence = transport.header(0).sequence;
    let frame = pack(&PostAccepted, ChatProtocol::SIGNATURE, sequence).expect("pack");
    assert!(conn.handle_data(&frame).is_empty());

    let err = pending.await.expect("join").expect_err("must fail");
    assert!(matches!(err, RequestError::DestroyedInFlight));
    assert_eq!(accepted_calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn request_becomes_ready_again_after_completion() {
    let (transport, conn) = setup();
    let request = Arc::new(Request::<PostExchange>::new(Arc::clone(&conn)));

    for round in 0..2u32 {
        let sender = Arc::clone(&request);
        let pending = tokio::spawn(async move { sender.send(&post()).await });
        wait_for_frames(&transport, round as usize + 1).await;

        let sequence = transport.header(round as usize).sequence;
        let frame = pack(&PostAccepted, ChatProtocol::SIGNATURE, sequence).expect("pack");
        assert!(conn.handle_data(&frame).is_empty());
        let reply = pending.await.expect("join").expect("resolved");
        assert_eq!(reply, Reply::Accepted(PostAccepted));
    }
}

#[rstest]
#[tokio::test]
async fn cancelled_send_releases_the_pending_state() {
    let (transport, conn) = setup();
    let request = Arc::new(Request::<PostExchange>::new(Arc::clone(&conn)));

    let abandoned = Arc::clone(&request);
    let pending = tokio::spawn(async move { abandoned.send(&post()).await });
    wait_for_frames(&transport, 1).await;

    // Dropping the in-flight future must not leave the request Busy.
    pending.abort();
    let join = pending.await;
    assert!(join.expect_err("aborted").is_cancelled());

    let retry = Arc::clone(&request);
    let pending = tokio::spawn(async move { retry.send(&post()).await });
    wait_for_frames(&transport, 2).await;

    let sequence = transport.header(1).sequence;
    let frame = pack(&PostAccepted, ChatProtocol::SIGNATURE, sequence).expect("pack");
    assert!(conn.handle_data(&frame).is_empty());
    let reply = pending.await.expect("join").expect("resolved");
    assert_eq!(reply, Reply::Accepted(PostAccepted));
}

#[rstest]
#[tokio::test]
async fn denial_invokes_the_deny_callback() {
    let (transport, conn) = setup();
    let denials = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&denials);
    let request = Arc::new(
        Request::<PostExchange>::new(Arc::clone(&conn)).on_deny(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let sender = Arc::clone(&request);
    let pending = tokio::spawn(async move { sender.send(&post()).await });
    wait_for_frames(&transport, 1).await;

    let sequence = transport.header(0).sequence;
    let denial = PostDenied {
        reason: "muted".into(),
    };
    let frame = pack(&denial, ChatProtocol::SIGNATURE, sequence).expect("pack");
    assert!(conn.handle_data(&frame).is_empty());

    let reply = pending.await.expect("join").expect("resolved");
    assert_eq!(reply, Reply::Denied(denial));
    assert_eq!(denials.load(Ordering::SeqCst), 1);
}

#[rstest]
#[tokio::test]
async fn response_outside_expected_group_is_rejected() {
    let (transport, conn) = setup();
    let request = Arc::new(Request::<PostExchange>::new(Arc::clone(&conn)));

    let sender = Arc::clone(&request);
    let pending = tokio::spawn(async move { sender.send(&post()).await });
    wait_for_frames(&transport, 1).await;

    // A ChatUpdate is not in the post exchange's response group.
    let sequence = transport.header(0).sequence;
    let stray = tagwire::proto::ChatUpdate {
        user: "Ann".into(),
        uuid: "u1".into(),
        message: "hi".into(),
        posted_ms: None,
    };
    let frame = pack(&stray, ChatProtocol::SIGNATURE, sequence).expect("pack");
    assert!(conn.handle_data(&frame).is_empty());

    let err = pending.await.expect("join").expect_err("must fail");
    assert!(matches!(
        err,
        RequestError::UnexpectedReply {
            id: tagwire::proto::ChatUpdate::MESSAGE_ID
        }
    ));
}
