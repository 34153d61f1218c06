#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::codec::FramedRead;

use keyaudit::client::protocol::{RespCodec, RespFrame};
use keyaudit::client::{
    DebugReply, KeyStore, ProbeReply, StoreError, TTL_MISSING, TTL_NO_EXPIRY, TYPE_NONE,
};

// =========================================================================================
// MOCK STORE (deterministic key sequence, no network)
// =========================================================================================

pub fn debug_payload(serialized_length: u64, idle_secs: u64) -> String {
    format!(
        "Value at:0x7f00 refcount:1 encoding:raw serializedlength:{} lru:1234 lru_seconds_idle:{}",
        serialized_length, idle_secs
    )
}

pub struct MockStore {
    keys: HashMap<Bytes, ProbeReply>,
    sequence: Vec<Bytes>,
    cursor: usize,
    db_size: Option<u64>,
    probe_delay: Option<Duration>,
    timeout_after: Option<usize>,
    pub probes: usize,
    pub calls: Vec<&'static str>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            sequence: Vec::new(),
            cursor: 0,
            db_size: None,
            probe_delay: None,
            timeout_after: None,
            probes: 0,
            calls: Vec::new(),
        }
    }

    /// A key whose DEBUG OBJECT payload parses cleanly.
    pub fn with_key(
        self,
        key: &str,
        key_type: &str,
        ttl: Option<u64>,
        serialized_length: u64,
        idle_secs: u64,
    ) -> Self {
        let reply = ProbeReply {
            key_type: key_type.to_string(),
            ttl: ttl.map_or(TTL_NO_EXPIRY, |t| t as i64),
            debug: DebugReply::Payload(debug_payload(serialized_length, idle_secs)),
        };
        self.with_reply(key, reply)
    }

    pub fn with_reply(mut self, key: &str, reply: ProbeReply) -> Self {
        self.keys.insert(Bytes::copy_from_slice(key.as_bytes()), reply);
        self
    }

    /// Order in which RANDOMKEY hands out keys; wraps around when exhausted.
    /// Names never registered behave as keys deleted after selection.
    pub fn sampling(mut self, order: &[&str]) -> Self {
        self.sequence = order
            .iter()
            .map(|k| Bytes::copy_from_slice(k.as_bytes()))
            .collect();
        self
    }

    pub fn with_db_size(mut self, db_size: u64) -> Self {
        self.db_size = Some(db_size);
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    /// Probes after the first `n` time out.
    pub fn timing_out_after(mut self, n: usize) -> Self {
        self.timeout_after = Some(n);
        self
    }
}

impl KeyStore for MockStore {
    async fn db_size(&mut self) -> Result<u64, StoreError> {
        self.calls.push("DBSIZE");
        Ok(self.db_size.unwrap_or(self.keys.len() as u64))
    }

    async fn random_key(&mut self) -> Result<Option<Bytes>, StoreError> {
        self.calls.push("RANDOMKEY");
        if self.sequence.is_empty() {
            return Ok(None);
        }
        let key = self.sequence[self.cursor % self.sequence.len()].clone();
        self.cursor += 1;
        Ok(Some(key))
    }

    async fn probe(&mut self, key: &Bytes) -> Result<ProbeReply, StoreError> {
        self.calls.push("PROBE");
        if self.timeout_after.is_some_and(|n| self.probes >= n) {
            return Err(StoreError::Timeout {
                command: "TYPE+TTL+DEBUG".to_string(),
            });
        }
        self.probes += 1;
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.keys.get(key).cloned().unwrap_or(ProbeReply {
            key_type: TYPE_NONE.to_string(),
            ttl: TTL_MISSING,
            debug: DebugReply::NoSuchKey,
        }))
    }
}

// =========================================================================================
// FAKE RESP SERVER (loopback TCP, scripted replies)
// =========================================================================================

pub const FAKE_PASSWORD: &str = "s3cret";

/// A key name that is not valid UTF-8.
pub const BINARY_KEY: &[u8] = b"\xff\x01session:7";

pub struct FakeServer {
    pub port: u16,
    pub received: Arc<Mutex<Vec<Vec<Bytes>>>>,
}

impl FakeServer {
    /// Received commands with every argument decoded lossily.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.raw_commands()
            .iter()
            .map(|args| {
                args.iter()
                    .map(|a| String::from_utf8_lossy(a).into_owned())
                    .collect()
            })
            .collect()
    }

    pub fn raw_commands(&self) -> Vec<Vec<Bytes>> {
        self.received.lock().unwrap().clone()
    }
}

/// Serves `user:1` (string, no expiry, 12 bytes, idle 7); every other key is already gone.
pub async fn spawn_fake_store() -> FakeServer {
    spawn_fake_store_serving(b"user:1").await
}

/// Like `spawn_fake_store`, but RANDOMKEY answers `random_key`. Both `user:1` and
/// `BINARY_KEY` exist with the same metadata.
pub async fn spawn_fake_store_serving(random_key: &'static [u8]) -> FakeServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(Mutex::new(Vec::new()));

    let log = received.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                let (reader, mut writer) = socket.into_split();
                let mut frames = FramedRead::new(reader, RespCodec::new());
                while let Some(Ok(frame)) = frames.next().await {
                    let args = command_args(frame);
                    let reply = scripted_reply(&args, random_key);
                    log.lock().unwrap().push(args);
                    if writer.write_all(&reply).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    FakeServer { port, received }
}

/// Accepts connections and reads forever without answering.
pub async fn spawn_silent_store() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1024];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });

    port
}

fn command_args(frame: RespFrame) -> Vec<Bytes> {
    match frame {
        RespFrame::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                RespFrame::Bulk(arg) => Some(arg),
                RespFrame::Simple(arg) => Some(Bytes::from(arg)),
                _ => None,
            })
            .collect(),
        other => vec![Bytes::from(other.describe())],
    }
}

fn bulk(payload: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", payload.len()).into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n");
    out
}

fn scripted_reply(args: &[Bytes], random_key: &[u8]) -> Vec<u8> {
    let exists = |key: &[u8]| key == b"user:1" || key == BINARY_KEY;
    let words: Vec<&[u8]> = args.iter().map(|a| a.as_ref()).collect();
    let text = match words.as_slice() {
        [b"AUTH", password] if *password == FAKE_PASSWORD.as_bytes() => "+OK\r\n".to_string(),
        [b"AUTH", _] => "-WRONGPASS invalid username-password pair\r\n".to_string(),
        [b"SELECT", _] => "+OK\r\n".to_string(),
        [b"DBSIZE"] => ":2\r\n".to_string(),
        [b"RANDOMKEY"] => return bulk(random_key),
        [b"TYPE", key] if exists(*key) => "+string\r\n".to_string(),
        [b"TYPE", _] => "+none\r\n".to_string(),
        [b"TTL", key] if exists(*key) => ":-1\r\n".to_string(),
        [b"TTL", _] => ":-2\r\n".to_string(),
        [b"DEBUG", b"OBJECT", key] if exists(*key) => format!("+{}\r\n", debug_payload(12, 7)),
        [b"DEBUG", b"OBJECT", _] => "-ERR no such key\r\n".to_string(),
        _ => "-ERR unknown command\r\n".to_string(),
    };
    text.into_bytes()
}
