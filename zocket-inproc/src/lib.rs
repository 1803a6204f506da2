//! Zocket Inproc
//!
//! A pure-Rust engine implementing the zocket transport seam for the
//! `inproc://` transport. It backs every socket that is not created through
//! the libzmq feature and is what the test suites run against.
//!
//! - `engine`: handle table, endpoint registry, send/receive, monitoring
//! - `socket`: per-socket queues and routing
//! - `options`: option storage and validation
//! - `curve`: X25519 key generation
//!
//! Not implemented: subscription filtering, high-water-mark enforcement and
//! curve handshakes. Options for them are stored and read back.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod curve;
pub mod engine;
pub mod options;
pub mod socket;

pub use engine::InprocEngine;
