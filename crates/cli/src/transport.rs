// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text-frame transport to relief-remote.
//!
//! A transport only moves JSON frames. Encoding, request ids and reply
//! matching live in [`crate::remote::TransportRemote`].

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A connection that carries text frames to and from the remote.
pub trait Transport: Send + Sync {
    /// Opens the connection, failing with [`TransportError::Timeout`] after `limit`.
    fn connect<'a>(&'a mut self, url: &'a str, limit: Duration) -> TransportFuture<'a, ()>;

    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    fn send(&mut self, frame: String) -> TransportFuture<'_, ()>;

    /// Next text frame, or `None` once the peer has closed.
    fn recv(&mut self) -> TransportFuture<'_, Option<String>>;

    fn is_connected(&self) -> bool;
}

/// [`Transport`] over a tokio-tungstenite client socket.
#[derive(Default)]
pub struct WebSocketTransport {
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

impl Transport for WebSocketTransport {
    fn connect<'a>(&'a mut self, url: &'a str, limit: Duration) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let (ws, _) = tokio::time::timeout(limit, tokio_tungstenite::connect_async(url))
                .await
                .map_err(|_| TransportError::Timeout(limit))??;
            self.ws = Some(ws);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                // The peer may already be gone.
                let _ = ws.close(None).await;
            }
            Ok(())
        })
    }

    fn send(&mut self, frame: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;
            // `send` flushes, so a broken socket surfaces here rather than on recv
            if let Err(e) = ws.send(Message::Text(frame.into())).await {
                self.ws = None;
                return Err(e.into());
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<String>> {
        Box::pin(async move {
            let ws = self.ws.as_mut().ok_or(TransportError::NotConnected)?;
            loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                    Some(Ok(Message::Close(_))) | None => {
                        self.ws = None;
                        return Ok(None);
                    }
                    // tungstenite answers pings itself; binary frames are not part of the protocol
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(e.into());
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
pub(crate) mod tests;
