//! Engine behaviour through the `Transport` trait only.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use zocket_core::errno;
use zocket_core::flags::Flags;
use zocket_core::option::{encode_value, SocketOption};
use zocket_core::socket_type::SocketType;
use zocket_core::transport::{RawSocket, Transport};
use zocket_inproc::InprocEngine;

fn recv_text(engine: &InprocEngine, socket: RawSocket) -> String {
    let frame = engine.recv_frame(socket, Flags::DONTWAIT).unwrap();
    String::from_utf8(frame.data.to_vec()).unwrap()
}

fn events(engine: &InprocEngine, socket: RawSocket) -> i32 {
    let mut buf = [0u8; 4];
    engine
        .getsockopt(socket, SocketOption::Events.code(), &mut buf)
        .unwrap();
    i32::from_ne_bytes(buf)
}

#[test]
fn test_blocking_recv_across_threads() {
    let engine = Arc::new(InprocEngine::new());
    let pull = engine.socket(SocketType::Pull).unwrap();
    engine.bind(pull, "inproc://pipeline").unwrap();

    let sender = Arc::clone(&engine);
    let handle = thread::spawn(move || {
        let push = sender.socket(SocketType::Push).unwrap();
        sender.connect(push, "inproc://pipeline").unwrap();
        thread::sleep(Duration::from_millis(20));
        sender.send(push, b"late", Flags::NONE).unwrap();
        push
    });

    let frame = engine.recv_frame(pull, Flags::NONE).unwrap();
    assert_eq!(&frame.data[..], b"late");
    assert!(!frame.more);

    let push = handle.join().unwrap();
    engine.close(push).unwrap();
}

#[test]
fn test_push_round_robins_between_pullers() {
    let engine = InprocEngine::new();
    let push = engine.socket(SocketType::Push).unwrap();
    engine.bind(push, "inproc://fan").unwrap();

    let a = engine.socket(SocketType::Pull).unwrap();
    let b = engine.socket(SocketType::Pull).unwrap();
    engine.connect(a, "inproc://fan").unwrap();
    engine.connect(b, "inproc://fan").unwrap();

    for text in ["1", "2", "3", "4"] {
        engine.send(push, text.as_bytes(), Flags::NONE).unwrap();
    }

    assert_eq!(recv_text(&engine, a), "1");
    assert_eq!(recv_text(&engine, b), "2");
    assert_eq!(recv_text(&engine, a), "3");
    assert_eq!(recv_text(&engine, b), "4");
}

#[test]
fn test_pub_copies_to_every_subscriber() {
    let engine = InprocEngine::new();
    let publisher = engine.socket(SocketType::Pub).unwrap();
    engine.bind(publisher, "inproc://news").unwrap();

    // Nobody listening yet: dropped, not queued
    engine.send(publisher, b"lost", Flags::NONE).unwrap();

    let subs: Vec<RawSocket> = (0..3)
        .map(|_| {
            let sub = engine.socket(SocketType::Sub).unwrap();
            engine.connect(sub, "inproc://news").unwrap();
            sub
        })
        .collect();

    engine.send(publisher, b"headline", Flags::NONE).unwrap();
    for sub in subs {
        assert_eq!(recv_text(&engine, sub), "headline");
        assert!(engine.recv_frame(sub, Flags::DONTWAIT).unwrap_err().is_again());
    }
}

#[test]
fn test_messages_wait_for_first_peer() {
    let engine = InprocEngine::new();
    let dealer = engine.socket(SocketType::Dealer).unwrap();
    engine.send(dealer, b"head", Flags::SNDMORE).unwrap();
    engine.send(dealer, b"tail", Flags::NONE).unwrap();

    let router = engine.socket(SocketType::Router).unwrap();
    engine.bind(router, "inproc://late-binder").unwrap();
    engine.connect(dealer, "inproc://late-binder").unwrap();

    let head = engine.recv_frame(router, Flags::DONTWAIT).unwrap();
    let tail = engine.recv_frame(router, Flags::DONTWAIT).unwrap();
    assert_eq!((&head.data[..], head.more), (&b"head"[..], true));
    assert_eq!((&tail.data[..], tail.more), (&b"tail"[..], false));
}

#[test]
fn test_immediate_refuses_without_peers() {
    let engine = InprocEngine::new();
    let dealer = engine.socket(SocketType::Dealer).unwrap();
    engine
        .setsockopt(dealer, SocketOption::Immediate.code(), &encode_value(true))
        .unwrap();

    assert!(engine.send(dealer, b"x", Flags::NONE).unwrap_err().is_again());
    assert_eq!(events(&engine, dealer) & 2, 0);
}

#[test]
fn test_recv_timeout_elapses() {
    let engine = InprocEngine::new();
    let pull = engine.socket(SocketType::Pull).unwrap();
    engine
        .setsockopt(pull, SocketOption::RcvTimeo.code(), &encode_value(30i32))
        .unwrap();

    let start = Instant::now();
    let err = engine.recv_frame(pull, Flags::NONE).unwrap_err();
    assert!(err.is_again());
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_events_track_pending_input() {
    let engine = InprocEngine::new();
    let server = engine.socket(SocketType::Pair).unwrap();
    let client = engine.socket(SocketType::Pair).unwrap();
    engine.bind(server, "inproc://poll").unwrap();
    engine.connect(client, "inproc://poll").unwrap();

    assert_eq!(events(&engine, server) & 1, 0);
    engine.send(client, b"a", Flags::SNDMORE).unwrap();
    engine.send(client, b"b", Flags::NONE).unwrap();
    assert_eq!(events(&engine, server) & 1, 1);

    engine.recv_frame(server, Flags::NONE).unwrap();
    // Second part still unread
    assert_eq!(events(&engine, server) & 1, 1);
    engine.recv_frame(server, Flags::NONE).unwrap();
    assert_eq!(events(&engine, server) & 1, 0);
}

#[test]
fn test_one_way_types_reject_the_other_direction() {
    let engine = InprocEngine::new();
    let sub = engine.socket(SocketType::Sub).unwrap();
    let publisher = engine.socket(SocketType::Pub).unwrap();

    assert_eq!(engine.send(sub, b"x", Flags::NONE).unwrap_err().code, errno::ENOTSUP);
    assert_eq!(
        engine.recv_frame(publisher, Flags::DONTWAIT).unwrap_err().code,
        errno::ENOTSUP
    );
}

#[test]
fn test_disconnect_unlinks_both_sides() {
    let engine = InprocEngine::new();
    let server = engine.socket(SocketType::Pair).unwrap();
    let client = engine.socket(SocketType::Pair).unwrap();
    engine.bind(server, "inproc://link").unwrap();
    engine.connect(client, "inproc://link").unwrap();

    engine.disconnect(client, "inproc://link").unwrap();
    assert_eq!(
        engine.disconnect(client, "inproc://link").unwrap_err().code,
        errno::ENOENT
    );

    // Queued on the client until it links again
    engine.send(client, b"again", Flags::NONE).unwrap();
    assert!(engine.recv_frame(server, Flags::DONTWAIT).unwrap_err().is_again());
    engine.connect(client, "inproc://link").unwrap();
    assert_eq!(recv_text(&engine, server), "again");
}

#[test]
fn test_closed_handle_is_rejected_everywhere() {
    let engine = InprocEngine::new();
    let socket = engine.socket(SocketType::Dealer).unwrap();
    engine.close(socket).unwrap();

    assert!(engine.bind(socket, "inproc://x").unwrap_err().is_not_socket());
    assert!(engine.send(socket, b"x", Flags::NONE).unwrap_err().is_not_socket());
    assert!(engine
        .setsockopt(socket, SocketOption::Linger.code(), &encode_value(0i32))
        .unwrap_err()
        .is_not_socket());
    assert!(engine.join(socket, "g").unwrap_err().is_not_socket());
}
