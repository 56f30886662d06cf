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

//! HTTP pipeline: describe a request, build it into a transport request,
//! send it, and wrap the outcome in a ResponseEnvelope.
//!
//! - `RequestDescriptor` is an immutable description of one call.
//! - `build` is a pure transform; a malformed URL aborts before any I/O.
//! - `HttpClient::send` never fails: every failure is captured inside the
//!   envelope so callers always inspect a uniform result shape.

mod builder;
mod client;
mod descriptor;
mod envelope;

pub use builder::build;
pub use client::{DecryptHook, HttpClient};
pub use descriptor::{FormPart, Method, Params, RequestDescriptor};
pub use envelope::ResponseEnvelope;
