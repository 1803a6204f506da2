//! Sending and receiving frames.
//!
//! A message is one or more frames; every frame but the last is sent with
//! `SNDMORE`. Receiving reads single frames into a bounded buffer or whole
//! messages frame by frame.

use crate::socket::Socket;
use bytes::Bytes;
use tracing::trace;
use zocket_core::error::{Error, Result};
use zocket_core::flags::Flags;
use zocket_core::option::SocketOption;
use zocket_core::transport::Multipart;

impl Socket {
    /// Send one frame. `more` marks it as not the last frame of its message.
    ///
    /// Returns the number of bytes queued.
    pub fn send(&self, data: &[u8], more: bool) -> Result<usize> {
        self.send_with_flags(data, Flags::for_part(more))
    }

    /// Send one frame with explicit flags (`DONTWAIT`, `SNDMORE`).
    pub fn send_with_flags(&self, data: &[u8], flags: Flags) -> Result<usize> {
        let raw = self.raw()?;
        let sent = self.transport().send(raw, data, flags)?;
        trace!("[SOCKET] {} sent {} bytes [{}]", raw, sent, flags);
        Ok(sent)
    }

    /// Send a UTF-8 string as one frame.
    pub fn send_str(&self, text: &str, more: bool) -> Result<usize> {
        self.send(text.as_bytes(), more)
    }

    /// Send a whole message.
    ///
    /// An empty message is rejected with [`Error::EmptyMessage`] without
    /// touching the engine. Sending stops at the first failed frame; frames
    /// already queued stay queued.
    ///
    /// # Examples
    ///
    /// ```
    /// use zocket::prelude::*;
    ///
    /// let ctx = Context::new();
    /// let server = ctx.socket(SocketType::Pair)?;
    /// let client = ctx.socket(SocketType::Pair)?;
    /// server.bind("inproc://multipart-doc")?;
    /// client.connect("inproc://multipart-doc")?;
    ///
    /// client.send_multipart([&b"header"[..], &b"body"[..]])?;
    /// let msg = server.recv_multipart(Flags::NONE)?;
    /// assert_eq!(msg.len(), 2);
    /// # Ok::<(), zocket::Error>(())
    /// ```
    pub fn send_multipart<I, T>(&self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut parts = parts.into_iter().peekable();
        if parts.peek().is_none() {
            return Err(Error::EmptyMessage);
        }
        while let Some(part) = parts.next() {
            let more = parts.peek().is_some();
            self.send(part.as_ref(), more)?;
        }
        Ok(())
    }

    /// Receive one frame of at most `max_len` bytes.
    ///
    /// Longer frames are truncated to `max_len` without error. Only
    /// `Flags::NONE` and `Flags::DONTWAIT` are accepted.
    pub fn recv(&self, max_len: usize, flags: Flags) -> Result<Bytes> {
        let flags = flags.validate_recv()?;
        let raw = self.raw()?;
        let mut buf = vec![0u8; max_len];
        let size = self.transport().recv(raw, &mut buf, flags)?;
        if size > max_len {
            trace!("[SOCKET] {} truncated {}-byte frame to {}", raw, size, max_len);
        }
        buf.truncate(size.min(max_len));
        Ok(Bytes::from(buf))
    }

    /// Receive one frame and decode it as UTF-8.
    pub fn recv_string(&self, max_len: usize, flags: Flags) -> Result<String> {
        let data = self.recv(max_len, flags)?;
        Ok(std::str::from_utf8(&data)?.to_owned())
    }

    /// Receive every frame of the next message.
    ///
    /// `flags` applies to each frame; once the first frame has arrived the
    /// rest of the message is already queued.
    pub fn recv_multipart(&self, flags: Flags) -> Result<Multipart> {
        let flags = flags.validate_recv()?;
        let raw = self.raw()?;
        let mut parts = Multipart::new();
        loop {
            let frame = self.transport().recv_frame(raw, flags)?;
            parts.push(frame.data);
            if !frame.more {
                break;
            }
        }
        trace!("[SOCKET] {} received {}-part message", raw, parts.len());
        Ok(parts)
    }

    /// Whether the last received frame has more frames after it (`ZMQ_RCVMORE`).
    pub fn has_more(&self) -> Result<bool> {
        self.option(SocketOption::RcvMore)
    }
}
