/*
 * error.rs
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

//! Client errors. HTTP-layer failures are captured into the ResponseEnvelope
//! rather than returned as Err; WebSocket failures surface as error events.

use std::fmt;

/// Errors from request building, transports, pinning, and decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The descriptor produced an unparseable URL. Fatal for that call only.
    InvalidUrl(String),
    /// Connection refused, timeout, DNS failure, TLS rejection.
    Transport(String),
    /// Body or model decoding failed. Non-fatal: the model simply stays absent.
    Decode(String),
    /// The TLS handshake was rejected by the certificate pinning verifier.
    /// Constructed by transports built on `pinned_client_config` when they
    /// map the handshake's certificate error; HTTP callers see it captured
    /// in the envelope like any other transport failure.
    PinningRejected(String),
    /// A socket operation was attempted while the session is not Connected.
    SocketNotReady,
}

impl NetError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl(url.into())
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::InvalidUrl(url) => write!(f, "invalid URL: {}", url),
            NetError::Transport(msg) => write!(f, "transport error: {}", msg),
            NetError::Decode(msg) => write!(f, "decode error: {}", msg),
            NetError::PinningRejected(host) => {
                write!(f, "certificate pinning rejected handshake for {}", host)
            }
            NetError::SocketNotReady => write!(f, "socket is not connected"),
        }
    }
}

impl std::error::Error for NetError {}

impl From<std::io::Error> for NetError {
    fn from(e: std::io::Error) -> Self {
        NetError::Transport(e.to_string())
    }
}
