/*
 * session.rs
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

//! Reconnecting WebSocket session. One session owns one URL and drives the
//! Closed -> Connecting -> Connected -> Closing -> Closed lifecycle; every
//! close, expected or not, emits a Close event and, when auto-reconnect is
//! on, schedules a fresh attempt after a fixed delay.
//!
//! State transitions take a short std Mutex; no lock is held across await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::error::NetError;
use crate::socket::events::{EventEmitter, SocketEvent, SocketEventKind};
use crate::transport::{SocketFrame, SocketHandle, SocketTransport};

/// Delay between a close and the automatic reconnection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Closed,
    Connecting,
    Connected,
    Closing,
}

struct Shared {
    url: String,
    headers: HashMap<String, String>,
    transport: Arc<dyn SocketTransport>,
    state: Mutex<SocketState>,
    handle: Mutex<Option<Arc<dyn SocketHandle>>>,
    auto_reconnect: AtomicBool,
    print_log: bool,
    emitter: EventEmitter,
}

/// WebSocket session with automatic reconnection.
///
/// Cloning yields another handle to the same session. Sends while not
/// Connected are dropped with a log line; pings while not Connected are
/// rejected so callers can detect a dead session.
#[derive(Clone)]
pub struct ReconnectingSocket {
    shared: Arc<Shared>,
}

impl ReconnectingSocket {
    pub fn new(url: impl Into<String>, transport: Arc<dyn SocketTransport>) -> Self {
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                headers: HashMap::new(),
                transport,
                state: Mutex::new(SocketState::Closed),
                handle: Mutex::new(None),
                auto_reconnect: AtomicBool::new(true),
                print_log: false,
                emitter: EventEmitter::new(),
            }),
        }
    }

    pub fn with_headers(
        url: impl Into<String>,
        headers: HashMap<String, String>,
        transport: Arc<dyn SocketTransport>,
        print_log: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                headers,
                transport,
                state: Mutex::new(SocketState::Closed),
                handle: Mutex::new(None),
                auto_reconnect: AtomicBool::new(true),
                print_log,
                emitter: EventEmitter::new(),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn state(&self) -> SocketState {
        *self.shared.state.lock().unwrap()
    }

    pub fn auto_reconnect(&self) -> bool {
        self.shared.auto_reconnect.load(Ordering::Relaxed)
    }

    /// Toggle automatic reconnection. Takes effect at the next close.
    pub fn set_auto_reconnect(&self, enabled: bool) {
        self.shared.auto_reconnect.store(enabled, Ordering::Relaxed);
    }

    /// Subscribe to all session events.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SocketEvent> {
        self.shared.emitter.subscribe()
    }

    /// Wait for the next event of one kind.
    pub fn subscribe_once(&self, kind: SocketEventKind) -> oneshot::Receiver<SocketEvent> {
        self.shared.emitter.subscribe_once(kind)
    }

    /// Begin connecting. A no-op unless the session is Closed; the attempt
    /// itself runs on a spawned task and reports through events.
    pub fn open(&self) {
        open_shared(&self.shared);
    }

    /// Send a text frame. Dropped with a log line when not Connected.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), NetError> {
        self.send_frame(SocketFrame::Text(text.into())).await
    }

    /// Send a binary frame. Dropped with a log line when not Connected.
    pub async fn send_binary(&self, data: Vec<u8>) -> Result<(), NetError> {
        self.send_frame(SocketFrame::Binary(data)).await
    }

    async fn send_frame(&self, frame: SocketFrame) -> Result<(), NetError> {
        let handle = match self.connected_handle() {
            Some(handle) => handle,
            None => {
                self.shared.log("send dropped: not connected");
                return Ok(());
            }
        };
        handle.send(frame).await
    }

    /// Send a ping. Unlike data frames this fails when not Connected, so a
    /// caller probing liveness gets a definite answer.
    pub async fn send_ping(&self) -> Result<(), NetError> {
        let handle = self
            .connected_handle()
            .ok_or(NetError::SocketNotReady)?;
        handle.ping().await
    }

    /// Close the connection. Only acts from Connected; the Close event is
    /// emitted when the transport confirms the close.
    pub async fn close(
        &self,
        code: Option<u16>,
        reason: Option<String>,
    ) -> Result<(), NetError> {
        let handle = {
            let mut state = self.shared.state.lock().unwrap();
            if *state != SocketState::Connected {
                self.shared.log("close ignored: not connected");
                return Ok(());
            }
            *state = SocketState::Closing;
            self.shared.handle.lock().unwrap().clone()
        };
        match handle {
            Some(handle) => handle.close(code, reason).await,
            None => Ok(()),
        }
    }

    fn connected_handle(&self) -> Option<Arc<dyn SocketHandle>> {
        if *self.shared.state.lock().unwrap() != SocketState::Connected {
            return None;
        }
        self.shared.handle.lock().unwrap().clone()
    }
}

impl Shared {
    fn log(&self, message: &str) {
        if self.print_log {
            eprintln!("[socket] {}: {}", self.url, message);
        }
    }
}

fn open_shared(shared: &Arc<Shared>) {
    {
        let mut state = shared.state.lock().unwrap();
        if *state != SocketState::Closed {
            shared.log("open ignored: already active");
            return;
        }
        *state = SocketState::Connecting;
    }
    shared.log("connecting");
    shared.emitter.emit(SocketEvent::WillOpen);
    let shared = shared.clone();
    tokio::spawn(async move {
        run_connection(shared).await;
    });
}

async fn run_connection(shared: Arc<Shared>) {
    let handle = match shared.transport.open(&shared.url, &shared.headers).await {
        Ok(handle) => handle,
        Err(error) => {
            shared.log("connect failed");
            shared.emitter.emit(SocketEvent::Error(error.to_string()));
            finish_closed(&shared, None, error.to_string());
            return;
        }
    };

    let raced = {
        let mut state = shared.state.lock().unwrap();
        if *state != SocketState::Connecting {
            true
        } else {
            *state = SocketState::Connected;
            *shared.handle.lock().unwrap() = Some(handle.clone());
            false
        }
    };
    if raced {
        // The session was torn down while connecting; discard the handle.
        let _ = handle.close(None, None).await;
        return;
    }
    shared.log("connected");
    shared.emitter.emit(SocketEvent::Open);

    let (code, reason) = receive_loop(&shared, &handle).await;
    *shared.handle.lock().unwrap() = None;
    finish_closed(&shared, code, reason);
}

async fn receive_loop(
    shared: &Arc<Shared>,
    handle: &Arc<dyn SocketHandle>,
) -> (Option<u16>, String) {
    loop {
        match handle.receive().await {
            Ok(SocketFrame::Text(text)) => {
                shared.emitter.emit(SocketEvent::Data(text.into_bytes()));
            }
            Ok(SocketFrame::Binary(data)) => {
                shared.emitter.emit(SocketEvent::Data(data));
            }
            Ok(SocketFrame::Pong) => {
                shared.emitter.emit(SocketEvent::Pong);
            }
            Ok(SocketFrame::Close { code, reason }) => {
                return (code, reason);
            }
            Err(error) => {
                shared.emitter.emit(SocketEvent::Error(error.to_string()));
                return (None, error.to_string());
            }
        }
    }
}

fn finish_closed(shared: &Arc<Shared>, code: Option<u16>, reason: String) {
    *shared.state.lock().unwrap() = SocketState::Closed;
    shared.log("closed");
    shared.emitter.emit(SocketEvent::Close { code, reason });
    if shared.auto_reconnect.load(Ordering::Relaxed) {
        let shared = shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(RECONNECT_DELAY).await;
            open_shared(&shared);
        });
    }
}
