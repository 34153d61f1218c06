//! Connection Layer: one TCP connection to the store, framed with `RespCodec`.
//! Requests are strictly sequential; a pipeline writes every command, flushes once,
//! then reads the replies back in order.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, info};

use crate::client::protocol::{Command, RespCodec, RespFrame};
use crate::client::{DebugReply, KeyStore, ProbeReply, StoreError};
use crate::config::ConnectionConfig;

pub struct RedisClient {
    framed: Framed<TcpStream, RespCodec>,
    addr: String,
    round_trip_timeout: Duration,
}

impl RedisClient {
    /// Connects, authenticates when a password is configured, and selects `db`.
    pub async fn connect(
        host: &str,
        port: u16,
        db: i64,
        config: &ConnectionConfig,
    ) -> Result<Self, StoreError> {
        let addr = format!("{}:{}", host, port);

        let socket = match timeout(config.connect_timeout(), TcpStream::connect(&addr)).await {
            Ok(Ok(socket)) => socket,
            Ok(Err(source)) => return Err(StoreError::Connect { addr, source }),
            Err(_) => return Err(StoreError::ConnectTimeout { addr }),
        };
        socket.set_nodelay(true).ok();

        let mut client = Self {
            framed: Framed::new(socket, RespCodec::new()),
            addr,
            round_trip_timeout: config.round_trip_timeout(),
        };

        if let Some(password) = &config.password {
            client.expect_ok(Command::new("AUTH").arg(password.clone())).await?;
        }
        if db != 0 {
            client.expect_ok(Command::new("SELECT").arg(db.to_string())).await?;
        }

        info!("Connected to {} (db {})", client.addr, db);
        Ok(client)
    }

    /// Sends a single command and waits for its reply.
    pub async fn command(&mut self, command: Command) -> Result<RespFrame, StoreError> {
        let mut replies = self.pipeline(vec![command]).await?;
        replies.pop().ok_or(StoreError::Closed)
    }

    /// Sends all `commands` in one write and reads exactly one reply per command.
    /// The whole exchange is bounded by the round-trip timeout.
    pub async fn pipeline(&mut self, commands: Vec<Command>) -> Result<Vec<RespFrame>, StoreError> {
        let label = commands
            .iter()
            .map(Command::name)
            .collect::<Vec<_>>()
            .join("+");

        match timeout(self.round_trip_timeout, self.exchange(commands)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout { command: label }),
        }
    }

    async fn exchange(&mut self, commands: Vec<Command>) -> Result<Vec<RespFrame>, StoreError> {
        let expected = commands.len();
        for command in commands {
            self.framed.feed(command).await?;
        }
        self.framed.flush().await?;

        let mut replies = Vec::with_capacity(expected);
        while replies.len() < expected {
            match self.framed.next().await {
                Some(frame) => replies.push(frame?),
                None => return Err(StoreError::Closed),
            }
        }
        Ok(replies)
    }

    async fn expect_ok(&mut self, command: Command) -> Result<(), StoreError> {
        let name = command.name();
        match self.command(command).await? {
            RespFrame::Simple(s) if s.eq_ignore_ascii_case("OK") => Ok(()),
            other => Err(reply_error(name, other)),
        }
    }
}

impl KeyStore for RedisClient {
    async fn db_size(&mut self) -> Result<u64, StoreError> {
        match self.command(Command::new("DBSIZE")).await? {
            RespFrame::Integer(n) if n >= 0 => Ok(n as u64),
            other => Err(reply_error("DBSIZE".to_string(), other)),
        }
    }

    async fn random_key(&mut self) -> Result<Option<Bytes>, StoreError> {
        match self.command(Command::new("RANDOMKEY")).await? {
            RespFrame::Null => Ok(None),
            RespFrame::Bulk(key) => Ok(Some(key)),
            RespFrame::Simple(key) => Ok(Some(Bytes::from(key))),
            other => Err(reply_error("RANDOMKEY".to_string(), other)),
        }
    }

    async fn probe(&mut self, key: &Bytes) -> Result<ProbeReply, StoreError> {
        let replies = self
            .pipeline(vec![
                Command::new("TYPE").arg(key.clone()),
                Command::new("TTL").arg(key.clone()),
                Command::new("DEBUG").arg("OBJECT").arg(key.clone()),
            ])
            .await?;

        let mut replies = replies.into_iter();
        let (Some(type_reply), Some(ttl_reply), Some(debug_reply)) =
            (replies.next(), replies.next(), replies.next())
        else {
            return Err(StoreError::Closed);
        };

        let key_type = match type_reply.as_text() {
            Some(t) => t,
            None => return Err(reply_error("TYPE".to_string(), type_reply)),
        };
        let ttl = match ttl_reply {
            RespFrame::Integer(ttl) => ttl,
            other => return Err(reply_error("TTL".to_string(), other)),
        };
        let debug = match debug_reply {
            RespFrame::Error(message) => DebugReply::from_error(message),
            other => match other.as_text() {
                Some(payload) => DebugReply::Payload(payload),
                None => return Err(reply_error("DEBUG OBJECT".to_string(), other)),
            },
        };

        debug!("Probed {:?}: type={} ttl={}", String::from_utf8_lossy(key), key_type, ttl);
        Ok(ProbeReply { key_type, ttl, debug })
    }
}

fn reply_error(command: String, reply: RespFrame) -> StoreError {
    match reply {
        RespFrame::Error(message) => StoreError::Command { command, message },
        other => StoreError::UnexpectedReply {
            command,
            reply: other.describe(),
        },
    }
}
