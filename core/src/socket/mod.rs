/*
 * mod.rs
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

//! WebSocket session: lifecycle state machine with automatic reconnection,
//! broadcast into per-subscriber event channels, and one-shot waits for a
//! particular event kind.

mod events;
mod session;

pub use events::{EventEmitter, SocketEvent, SocketEventKind};
pub use session::{ReconnectingSocket, SocketState, RECONNECT_DELAY};
