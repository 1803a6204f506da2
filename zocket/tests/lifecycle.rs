//! Socket lifecycle: creation, endpoints, close and drop.

mod common;

use common::{connected, scripted_context};
use std::collections::HashSet;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::thread;
use zocket::prelude::*;
use zocket::errno;

#[test]
fn test_close_twice_releases_once() {
    let (ctx, transport) = scripted_context();
    let mut socket = ctx.socket(SocketType::Dealer).unwrap();

    socket.close().unwrap();
    socket.close().unwrap();
    drop(socket);

    assert_eq!(transport.closes(), 1);
    assert_eq!(transport.open_sockets(), 0);
}

#[test]
fn test_drop_closes_handle() {
    let (ctx, transport) = scripted_context();
    {
        let _a = ctx.socket(SocketType::Push).unwrap();
        let _b = ctx.socket(SocketType::Pull).unwrap();
        assert_eq!(transport.open_sockets(), 2);
    }
    assert_eq!(transport.open_sockets(), 0);
    assert_eq!(transport.closes(), 2);
}

#[test]
fn test_failed_close_keeps_handle() {
    let (ctx, transport) = scripted_context();
    let mut socket = ctx.socket(SocketType::Pair).unwrap();

    transport.fail_close.store(true, Ordering::SeqCst);
    let err = socket.close().unwrap_err();
    assert_eq!(err.as_transport().map(|e| e.code), Some(errno::EINTR));
    assert!(socket.is_open());

    transport.fail_close.store(false, Ordering::SeqCst);
    socket.close().unwrap();
    assert!(!socket.is_open());
    assert_eq!(transport.open_sockets(), 0);
}

/// Captures formatted log output for assertions.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_drop_with_failing_close_logs_error() {
    let (ctx, transport) = scripted_context();
    let socket = ctx.socket(SocketType::Pair).unwrap();
    transport.fail_close.store(true, Ordering::SeqCst);

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || drop(socket));

    assert_eq!(transport.open_sockets(), 1);
    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(text.contains("ERROR"), "{text}");
    assert!(text.contains("[SOCKET] Failed to close"), "{text}");
}

#[test]
fn test_operations_after_close_fail() {
    let ctx = Context::new();
    let mut socket = ctx.socket(SocketType::Pair).unwrap();
    socket.close().unwrap();

    let not_socket = |err: Error| err.as_transport().map(|e| e.code) == Some(errno::ENOTSOCK);
    assert!(not_socket(socket.send(b"late", false).unwrap_err()));
    assert!(not_socket(socket.recv(16, Flags::DONTWAIT).unwrap_err()));
    assert!(not_socket(socket.connect("inproc://anywhere").unwrap_err()));
    assert!(not_socket(socket.set_linger(0).unwrap_err()));
    assert!(not_socket(socket.monitor("inproc://mon", EventMask::ALL).unwrap_err()));
    assert!(socket.send(b"late", false).unwrap_err().is_closed());
}

#[test]
fn test_operations_after_close_skip_transport() {
    let (ctx, transport) = scripted_context();
    let mut socket = ctx.socket(SocketType::Pair).unwrap();
    socket.close().unwrap();
    let before = transport.calls();

    let _ = socket.send(b"x", false);
    let _ = socket.recv(4, Flags::NONE);
    let _ = socket.bind("inproc://late");
    assert_eq!(transport.calls(), before);
}

#[test]
fn test_connect_errors_carry_code_and_message() {
    let ctx = Context::new();
    let socket = ctx.socket(SocketType::Req).unwrap();

    let err = socket.connect("inproc://nobody-home").unwrap_err();
    let transport = err.as_transport().unwrap();
    assert_eq!(transport.code, errno::ECONNREFUSED);
    assert!(!transport.message.is_empty());
}

#[test]
fn test_bind_conflict() {
    let ctx = Context::new();
    let a = ctx.socket(SocketType::Rep).unwrap();
    let b = ctx.socket(SocketType::Rep).unwrap();
    a.bind("inproc://busy").unwrap();

    let err = b.bind("inproc://busy").unwrap_err();
    assert_eq!(err.as_transport().map(|e| e.code), Some(errno::EADDRINUSE));
}

#[test]
fn test_unbind_and_disconnect() {
    let ctx = Context::new();
    let (server, client) = connected(&ctx, "inproc://detach", SocketType::Pair, SocketType::Pair);

    client.disconnect("inproc://detach").unwrap();
    assert!(client.disconnect("inproc://detach").is_err());

    server.unbind("inproc://detach").unwrap();
    let err = server.unbind("inproc://detach").unwrap_err();
    assert_eq!(err.as_transport().map(|e| e.code), Some(errno::ENOENT));

    // Endpoint is free again
    let other = ctx.socket(SocketType::Pair).unwrap();
    other.bind("inproc://detach").unwrap();
}

#[test]
fn test_incompatible_peer() {
    let ctx = Context::new();
    let publisher = ctx.socket(SocketType::Pub).unwrap();
    let pusher = ctx.socket(SocketType::Push).unwrap();
    publisher.bind("inproc://feed").unwrap();

    let err = pusher.connect("inproc://feed").unwrap_err();
    assert_eq!(err.as_transport().map(|e| e.code), Some(errno::ENOCOMPATPROTO));
}

#[test]
fn test_last_endpoint() {
    let ctx = Context::new();
    let socket = ctx.socket(SocketType::Router).unwrap();
    assert_eq!(socket.last_endpoint().unwrap(), "");

    socket.bind("inproc://first").unwrap();
    socket.bind("inproc://second").unwrap();
    assert_eq!(socket.last_endpoint().unwrap(), "inproc://second");
}

#[test]
fn test_last_endpoint_longer_than_default_buffer() {
    let ctx = Context::new();
    let socket = ctx.socket(SocketType::Pull).unwrap();
    let endpoint = format!("inproc://{}", "n".repeat(300));
    socket.bind(&endpoint).unwrap();
    assert_eq!(socket.last_endpoint().unwrap(), endpoint);
}

#[test]
fn test_socket_moves_across_threads() {
    let ctx = Context::new();
    let (server, client) = connected(&ctx, "inproc://threads", SocketType::Pull, SocketType::Push);

    let worker = thread::spawn(move || {
        client.send(b"from worker", false).unwrap();
        client
    });
    let client = worker.join().unwrap();

    assert_eq!(&server.recv(64, Flags::NONE).unwrap()[..], b"from worker");
    drop(client);
}

#[test]
fn test_sockets_in_hash_set() {
    let ctx = Context::new();
    let a = ctx.socket(SocketType::Pair).unwrap();
    let b = ctx.socket(SocketType::Pair).unwrap();

    let mut ids = HashSet::new();
    assert!(ids.insert(a.id()));
    assert!(ids.insert(b.id()));
    assert!(!ids.insert(a.id()));
    assert_ne!(a, b);
}
