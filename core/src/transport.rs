/*
 * transport.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Aquilone, a pinned-transport network client library.
 *
 * Aquilone is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Aquilone is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Aquilone.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Transport capabilities consumed by the clients. The actual socket I/O,
//! TLS handshake, and connection pooling live behind these traits; Aquilone
//! only builds requests, interprets replies, and drives lifecycles.
//!
//! Traits are object-safe: async operations return boxed futures so that a
//! client can hold `Arc<dyn HttpTransport>` / `Arc<dyn SocketTransport>`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::error::NetError;
use crate::http::Method;

/// Boxed future used by the object-safe transport traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A fully built request, ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
    /// Always re-fetch; request-level caching is disabled.
    pub ignore_cache: bool,
}

/// Status, headers, and body of a completed exchange.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// One network exchange. The transport enforces the request timeout; on
/// expiry it fails with a transport error rather than hanging.
pub trait HttpTransport: Send + Sync {
    fn perform<'a>(
        &'a self,
        request: &'a TransportRequest,
    ) -> BoxFuture<'a, Result<TransportReply, NetError>>;
}

/// One WebSocket frame as seen by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketFrame {
    Text(String),
    Binary(Vec<u8>),
    Pong,
    Close { code: Option<u16>, reason: String },
}

/// Live socket connection handle. Writes are serialized by the transport;
/// the session never takes a lock around send/receive.
pub trait SocketHandle: Send + Sync {
    fn send(&self, frame: SocketFrame) -> BoxFuture<'_, Result<(), NetError>>;

    /// Transport-level ping; resolves when the pong arrives.
    fn ping(&self) -> BoxFuture<'_, Result<(), NetError>>;

    /// Await the next frame (suspending). Errors end the receive loop.
    fn receive(&self) -> BoxFuture<'_, Result<SocketFrame, NetError>>;

    fn close(
        &self,
        code: Option<u16>,
        reason: Option<String>,
    ) -> BoxFuture<'_, Result<(), NetError>>;
}

/// Opens socket connections. Reconnection acquires a fresh handle from the
/// same transport.
pub trait SocketTransport: Send + Sync {
    fn open<'a>(
        &'a self,
        url: &'a str,
        headers: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, Result<Arc<dyn SocketHandle>, NetError>>;
}

/// Parsed components of an http(s) or ws(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Path plus query, always starting with '/'.
    pub path_and_query: String,
}

/// Split a URL into scheme, host, port, and path. Used to validate assembled
/// URLs before any I/O; failure aborts the call with `InvalidUrl`.
pub fn split_url(url: &str) -> Result<UrlParts, NetError> {
    let (scheme, rest) = match url.split_once("://") {
        Some((s, r)) => (s, r),
        None => return Err(NetError::invalid_url(url)),
    };
    let default_port: u16 = match scheme {
        "https" | "wss" => 443,
        "http" | "ws" => 80,
        _ => return Err(NetError::invalid_url(url)),
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };

    // Host and optional port; IPv6 literal [::1]:port
    let (host, port) = if authority.starts_with('[') {
        match authority.find(']') {
            Some(end) => {
                let h = &authority[1..end];
                let after = &authority[end + 1..];
                let p = if let Some(port_str) = after.strip_prefix(':') {
                    port_str
                        .parse::<u16>()
                        .map_err(|_| NetError::invalid_url(url))?
                } else {
                    default_port
                };
                (h, p)
            }
            None => return Err(NetError::invalid_url(url)),
        }
    } else {
        match authority.rfind(':') {
            Some(i) => {
                let h = &authority[..i];
                let p = authority[i + 1..]
                    .parse::<u16>()
                    .map_err(|_| NetError::invalid_url(url))?;
                (h, p)
            }
            None => (authority, default_port),
        }
    };

    if host.is_empty() || host.contains(' ') {
        return Err(NetError::invalid_url(url));
    }

    Ok(UrlParts {
        scheme: scheme.to_string(),
        host: host.to_string(),
        port,
        path_and_query: path.to_string(),
    })
}
