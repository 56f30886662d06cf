/*
 * events.rs
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

//! Session event fan-out. Every emitted event is pushed to all live
//! subscriber channels; closed channels are pruned on the next emit.
//! One-shot waiters live in a process-wide registry keyed by emitter id so a
//! caller can await "the next Open" without holding a long-lived channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, RwLock};

use tokio::sync::{mpsc, oneshot};

/// Observable session event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Emitted just before a connection attempt begins.
    WillOpen,
    Open,
    /// An inbound text or binary frame, as bytes.
    Data(Vec<u8>),
    Pong,
    Error(String),
    Close { code: Option<u16>, reason: String },
}

/// Event discriminant, used for one-shot subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketEventKind {
    WillOpen,
    Open,
    Data,
    Pong,
    Error,
    Close,
}

impl SocketEvent {
    pub fn kind(&self) -> SocketEventKind {
        match self {
            SocketEvent::WillOpen => SocketEventKind::WillOpen,
            SocketEvent::Open => SocketEventKind::Open,
            SocketEvent::Data(_) => SocketEventKind::Data,
            SocketEvent::Pong => SocketEventKind::Pong,
            SocketEvent::Error(_) => SocketEventKind::Error,
            SocketEvent::Close { .. } => SocketEventKind::Close,
        }
    }
}

struct OnceWaiter {
    kind: SocketEventKind,
    tx: oneshot::Sender<SocketEvent>,
}

fn once_registry() -> &'static RwLock<HashMap<u64, Vec<OnceWaiter>>> {
    static INSTANCE: OnceLock<RwLock<HashMap<u64, Vec<OnceWaiter>>>> = OnceLock::new();
    INSTANCE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn next_emitter_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Fan-out point for one session's events.
pub struct EventEmitter {
    id: u64,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SocketEvent>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            id: next_emitter_id(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to all future events of this emitter.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SocketEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Wait for the next event of one kind. The waiter is removed after it
    /// fires; dropping the receiver abandons it harmlessly.
    pub fn subscribe_once(&self, kind: SocketEventKind) -> oneshot::Receiver<SocketEvent> {
        let (tx, rx) = oneshot::channel();
        once_registry()
            .write()
            .unwrap()
            .entry(self.id)
            .or_default()
            .push(OnceWaiter { kind, tx });
        rx
    }

    /// Deliver an event to every live subscriber and matching one-shot
    /// waiter. Subscribers whose receiver has been dropped are pruned.
    pub fn emit(&self, event: SocketEvent) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
        self.fire_once(&event);
    }

    fn fire_once(&self, event: &SocketEvent) {
        let registry = once_registry();
        let has_match = registry
            .read()
            .unwrap()
            .get(&self.id)
            .map(|waiters| waiters.iter().any(|w| w.kind == event.kind()))
            .unwrap_or(false);
        if !has_match {
            return;
        }
        let mut map = registry.write().unwrap();
        if let Some(waiters) = map.get_mut(&self.id) {
            let mut keep = Vec::with_capacity(waiters.len());
            for waiter in waiters.drain(..) {
                if waiter.kind == event.kind() {
                    let _ = waiter.tx.send(event.clone());
                } else {
                    keep.push(waiter);
                }
            }
            *waiters = keep;
            if waiters.is_empty() {
                map.remove(&self.id);
            }
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventEmitter {
    fn drop(&mut self) {
        once_registry().write().unwrap().remove(&self.id);
    }
}
