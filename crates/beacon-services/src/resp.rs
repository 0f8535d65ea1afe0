//! Minimal RESP2 client — just enough protocol for the TTL directory store.
//!
//! Commands always go out as arrays of bulk strings:
//!
//! ```text
//! *3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n
//! ```
//!
//! Replies are decoded incrementally from a read buffer; a partial reply
//! simply waits for more bytes.

use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::directory::StoreError;

/// A decoded server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    /// `None` is the null bulk string (`$-1`).
    Bulk(Option<Bytes>),
    /// `None` is the null array (`*-1`).
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// True for the `+OK` status reply.
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Simple(s) if s == "OK")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("unknown reply type byte 0x{0:02x}")]
    UnknownType(u8),
    #[error("malformed integer {0:?}")]
    BadInteger(String),
    #[error("reply line is not valid UTF-8")]
    NotUtf8,
    #[error("bulk string missing CRLF terminator")]
    MissingTerminator,
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Append one command to `buf`.
pub fn encode_command(parts: &[&[u8]], buf: &mut BytesMut) {
    buf.extend_from_slice(format!("*{}\r\n", parts.len()).as_bytes());
    for part in parts {
        buf.extend_from_slice(format!("${}\r\n", part.len()).as_bytes());
        buf.extend_from_slice(part);
        buf.extend_from_slice(b"\r\n");
    }
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode one reply from the front of `buf`.
///
/// Returns the reply and the number of bytes it occupied, or `Ok(None)` if
/// `buf` does not hold a complete reply yet.
pub fn parse_reply(buf: &[u8]) -> Result<Option<(Reply, usize)>, RespError> {
    parse_at(buf, 0)
}

fn parse_at(buf: &[u8], pos: usize) -> Result<Option<(Reply, usize)>, RespError> {
    let Some(&kind) = buf.get(pos) else {
        return Ok(None);
    };
    let Some((line, next)) = read_line(buf, pos + 1) else {
        return Ok(None);
    };

    match kind {
        b'+' => Ok(Some((Reply::Simple(utf8(line)?), next))),
        b'-' => Ok(Some((Reply::Error(utf8(line)?), next))),
        b':' => Ok(Some((Reply::Integer(parse_int(line)?), next))),
        b'$' => {
            let len = parse_int(line)?;
            if len < 0 {
                return Ok(Some((Reply::Bulk(None), next)));
            }
            let end = next + len as usize;
            if buf.len() < end + 2 {
                return Ok(None);
            }
            if &buf[end..end + 2] != b"\r\n" {
                return Err(RespError::MissingTerminator);
            }
            let data = Bytes::copy_from_slice(&buf[next..end]);
            Ok(Some((Reply::Bulk(Some(data)), end + 2)))
        }
        b'*' => {
            let len = parse_int(line)?;
            if len < 0 {
                return Ok(Some((Reply::Array(None), next)));
            }
            let mut items = Vec::with_capacity((len as usize).min(64));
            let mut cursor = next;
            for _ in 0..len {
                match parse_at(buf, cursor)? {
                    Some((item, after)) => {
                        items.push(item);
                        cursor = after;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((Reply::Array(Some(items)), cursor)))
        }
        other => Err(RespError::UnknownType(other)),
    }
}

/// The line starting at `start` without its CRLF, plus the offset after it.
fn read_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    rest.windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| (&rest[..i], start + i + 2))
}

fn utf8(line: &[u8]) -> Result<String, RespError> {
    std::str::from_utf8(line)
        .map(str::to_string)
        .map_err(|_| RespError::NotUtf8)
}

fn parse_int(line: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| RespError::BadInteger(String::from_utf8_lossy(line).into_owned()))
}

// ── Connection ────────────────────────────────────────────────────────────────

/// One TCP connection to a RESP server.
///
/// A connection that hit an I/O error, a timeout or a protocol violation is
/// marked broken: its stream may hold half a reply, so it must not be reused.
pub struct RespConnection {
    stream: TcpStream,
    buf: BytesMut,
    io_timeout: Duration,
    broken: bool,
}

impl std::fmt::Debug for RespConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespConnection")
            .field("peer", &self.stream.peer_addr().ok())
            .field("broken", &self.broken)
            .finish()
    }
}

impl RespConnection {
    pub async fn connect(
        addr: &str,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| StoreError::Timeout(connect_timeout))?
            .map_err(|source| StoreError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;

        tracing::debug!(addr, "resp connection established");

        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(512),
            io_timeout,
            broken: false,
        })
    }

    /// Send one command and wait for its reply.
    ///
    /// Server `-ERR` replies come back as `Ok(Reply::Error)`; they do not
    /// break the connection.
    pub async fn call(&mut self, parts: &[&[u8]]) -> Result<Reply, StoreError> {
        if self.broken {
            return Err(StoreError::Closed);
        }
        match tokio::time::timeout(self.io_timeout, self.round_trip(parts)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                self.broken = true;
                Err(e)
            }
            Err(_) => {
                self.broken = true;
                Err(StoreError::Timeout(self.io_timeout))
            }
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    async fn round_trip(&mut self, parts: &[&[u8]]) -> Result<Reply, StoreError> {
        let mut out = BytesMut::new();
        encode_command(parts, &mut out);
        self.stream.write_all(&out).await?;

        loop {
            if let Some((reply, used)) = parse_reply(&self.buf)? {
                self.buf.advance(used);
                return Ok(reply);
            }
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                return Err(StoreError::Closed);
            }
        }
    }
}
