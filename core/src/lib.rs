/*
 * lib.rs
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

//! Aquilone core: a pinned-certificate network client library.
//!
//! Two client surfaces over injected transports:
//! - HTTP: `RequestDescriptor` -> `HttpClient::send` -> `ResponseEnvelope`.
//!   Sending never returns Err; every failure is captured in the envelope.
//! - WebSocket: `ReconnectingSocket`, a lifecycle state machine that emits
//!   events and reconnects automatically after any close.
//!
//! Certificate pinning plugs into rustls through `pinned_client_config`;
//! hosts without a matching rule fall back to ordinary WebPKI validation.

pub mod config;
pub mod error;
pub mod http;
pub mod pinning;
pub mod socket;
pub mod transport;

pub use config::{default_config, set_default_base_url, set_default_config, NetConfig};
pub use error::NetError;
pub use http::{HttpClient, RequestDescriptor, ResponseEnvelope};
pub use pinning::{pinned_client_config, PinningMode, PinningRule};
pub use socket::{ReconnectingSocket, SocketEvent, SocketState};
