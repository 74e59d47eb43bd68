// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-shot admin connection: four bytes in, one report out.

use keeper_flw::CommandCode;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// A connected operator or monitoring agent.
pub struct AdminConnection {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl AdminConnection {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self { stream, peer_addr }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Read the four byte command word.
    ///
    /// Returns `Ok(None)` if the peer closes before sending four bytes.
    pub async fn read_code(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<CommandCode>, ConnectionError> {
        let mut word = [0u8; 4];
        let read = tokio::time::timeout(timeout, self.stream.read_exact(&mut word))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout))?;

        match read {
            Ok(_) => Ok(Some(CommandCode::from_bytes(word))),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the report. No framing, the close marks the end.
    pub async fn write_reply(&mut self, reply: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(reply).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Shut down the write half.
    pub async fn shutdown(&mut self) -> Result<(), ConnectionError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Connection error types.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no command word within {0:?}")]
    Timeout(Duration),

    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (AdminConnection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (AdminConnection::new(server, peer), client)
    }

    #[tokio::test]
    async fn test_read_code_in_pieces() {
        let (mut conn, mut client) = pair().await;
        assert_eq!(conn.peer_addr(), client.local_addr().unwrap());
        client.write_all(b"mn").await.unwrap();
        client.write_all(b"tr").await.unwrap();

        let code = conn.read_code(Duration::from_secs(5)).await.unwrap();
        assert_eq!(code, CommandCode::parse("mntr"));
    }

    #[tokio::test]
    async fn test_short_word_then_close() {
        let (mut conn, mut client) = pair().await;
        client.write_all(b"ru").await.unwrap();
        drop(client);

        assert!(conn.read_code(Duration::from_secs(5)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_times_out() {
        let (mut conn, _client) = pair().await;
        let err = conn
            .read_code(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_reply_then_eof() {
        let (mut conn, mut client) = pair().await;
        conn.write_reply(b"imok").await.unwrap();
        conn.shutdown().await.unwrap();

        let mut reply = String::new();
        client.read_to_string(&mut reply).await.unwrap();
        assert_eq!(reply, "imok");
    }

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::Timeout(Duration::from_secs(1));
        assert!(err.to_string().contains("no command word"));

        let err = ConnectionError::Dispatch("panicked".into());
        assert!(err.to_string().contains("dispatch"));
    }
}
