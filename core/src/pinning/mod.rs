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

//! Certificate pinning: host-matched rules decide whether a presented chain
//! is accepted outright, rejected, or handed to ordinary WebPKI validation.

mod spki;
mod tls;
mod verifier;

pub use spki::subject_public_key_info;
pub use tls::{pinned_client_config, PinnedServerVerifier};
pub use verifier::{PinningMode, PinningRule, PinningVerifier, Verdict};
