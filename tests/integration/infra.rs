//! In-process fake Redis.
//!
//! Speaks just enough RESP2 for the directory store: `PING`, `AUTH`,
//! `SELECT`, `GET` and `SET key value [PX ms]`. Expiry is checked lazily on
//! read against `Instant::now()`, like the real server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use beacon_services::resp::{parse_reply, Reply};

#[derive(Default)]
struct Shared {
    password: Option<String>,
    entries: Mutex<HashMap<Vec<u8>, (Bytes, Option<Instant>)>>,
    /// Upper-cased command names in arrival order.
    log: Mutex<Vec<String>>,
}

pub struct FakeRedis {
    pub addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl FakeRedis {
    pub async fn start() -> Result<Self> {
        Self::spawn(None).await
    }

    /// Every connection must `AUTH` with `password` before anything else.
    pub async fn start_with_password(password: &str) -> Result<Self> {
        Self::spawn(Some(password.to_string())).await
    }

    async fn spawn(password: Option<String>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            password,
            ..Shared::default()
        });

        let accept_shared = shared.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_conn(stream, accept_shared.clone()));
            }
        });

        Ok(Self { addr, shared, task })
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    /// Live value under the raw Redis `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        let entries = self.shared.entries.lock().unwrap();
        entries
            .get(key.as_bytes())
            .filter(|(_, expires)| expires.is_none_or(|at| Instant::now() < at))
            .map(|(v, _)| String::from_utf8_lossy(v).into_owned())
    }

    /// Remaining lifetime of `key`, if it has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.shared.entries.lock().unwrap();
        entries
            .get(key.as_bytes())
            .and_then(|(_, expires)| *expires)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn commands(&self) -> Vec<String> {
        self.shared.log.lock().unwrap().clone()
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_conn(mut stream: TcpStream, shared: Arc<Shared>) {
    let mut buf = BytesMut::with_capacity(512);
    let mut authed = shared.password.is_none();

    loop {
        match parse_reply(&buf) {
            Ok(Some((command, used))) => {
                buf.advance(used);
                let out = handle(&shared, &mut authed, command);
                if stream.write_all(&out).await.is_err() {
                    return;
                }
                continue;
            }
            Ok(None) => {}
            Err(_) => return,
        }

        match stream.read_buf(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

fn handle(shared: &Shared, authed: &mut bool, command: Reply) -> Vec<u8> {
    let args: Vec<Bytes> = match command {
        Reply::Array(Some(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Reply::Bulk(Some(b)) => Some(b),
                _ => None,
            })
            .collect(),
        _ => return error("ERR expected array of bulk strings"),
    };
    let Some(name) = args.first() else {
        return error("ERR empty command");
    };
    let name = String::from_utf8_lossy(name).to_ascii_uppercase();
    shared.log.lock().unwrap().push(name.clone());

    match (name.as_str(), &args[1..]) {
        ("PING", _) => simple("PONG"),
        ("AUTH", [password]) | ("AUTH", [_, password]) => {
            if shared.password.as_deref().map(str::as_bytes) == Some(&password[..]) {
                *authed = true;
                simple("OK")
            } else {
                error("WRONGPASS invalid username-password pair or user is disabled.")
            }
        }
        _ if !*authed => error("NOAUTH Authentication required."),
        ("SELECT", [_]) => simple("OK"),
        ("GET", [key]) => {
            let mut entries = shared.entries.lock().unwrap();
            let live = match entries.get(&key[..]) {
                Some((_, Some(at))) if Instant::now() >= *at => None,
                Some((value, _)) => Some(value.clone()),
                None => None,
            };
            if live.is_none() {
                entries.remove(&key[..]);
            }
            bulk(live.as_deref())
        }
        ("SET", [key, value]) => {
            set(shared, key, value, None);
            simple("OK")
        }
        ("SET", [key, value, px, ms]) if px.eq_ignore_ascii_case(b"PX") => {
            let ms = std::str::from_utf8(ms)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|ms| *ms > 0);
            match ms {
                Some(ms) => {
                    set(shared, key, value, Some(Duration::from_millis(ms)));
                    simple("OK")
                }
                None => error("ERR invalid expire time in 'set' command"),
            }
        }
        _ => error(&format!("ERR unknown command '{}'", name)),
    }
}

fn set(shared: &Shared, key: &Bytes, value: &Bytes, ttl: Option<Duration>) {
    let expires = ttl.map(|ttl| Instant::now() + ttl);
    shared
        .entries
        .lock()
        .unwrap()
        .insert(key.to_vec(), (value.clone(), expires));
}

fn simple(s: &str) -> Vec<u8> {
    format!("+{}\r\n", s).into_bytes()
}

fn error(s: &str) -> Vec<u8> {
    format!("-{}\r\n", s).into_bytes()
}

fn bulk(value: Option<&[u8]>) -> Vec<u8> {
    match value {
        None => b"$-1\r\n".to_vec(),
        Some(v) => {
            let mut out = format!("${}\r\n", v.len()).into_bytes();
            out.extend_from_slice(v);
            out.extend_from_slice(b"\r\n");
            out
        }
    }
}

/// An address nothing is listening on.
pub async fn dead_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}
