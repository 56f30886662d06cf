/*
 * config.rs
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

//! Client configuration: base URL, default timeout, pinning rules, logging.
//! Configuration is passed explicitly to client construction; a process-wide
//! default exists for convenience only and is never required.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use crate::pinning::{PinningMode, PinningRule};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sink for formatted diagnostic strings. Fire-and-forget; called off the
/// request path. When absent, diagnostics go to stderr.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration for an HttpClient or ReconnectingSocket.
#[derive(Clone)]
pub struct NetConfig {
    /// Prefix joined to descriptor paths that are not absolute URLs.
    pub base_url: String,
    /// Timeout applied to descriptors that do not set their own.
    pub timeout: Duration,
    /// Certificate pinning allow-list, first matching host wins.
    pub pinning_rules: Vec<PinningRule>,
    /// Leaf-certificate hash or chain-wide public-key count strictness.
    pub pinning_mode: PinningMode,
    /// Emit the request diagnostic even when the descriptor does not ask for it.
    pub print_log: bool,
    pub log_sink: Option<LogSink>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            pinning_rules: Vec::new(),
            pinning_mode: PinningMode::LeafCertificate,
            print_log: false,
            log_sink: None,
        }
    }
}

impl NetConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

fn default_config_cell() -> &'static RwLock<NetConfig> {
    static INSTANCE: OnceLock<RwLock<NetConfig>> = OnceLock::new();
    INSTANCE.get_or_init(|| RwLock::new(NetConfig::default()))
}

/// Replace the process-wide default configuration used by `HttpClient::new`.
pub fn set_default_config(config: NetConfig) {
    *default_config_cell().write().unwrap() = config;
}

/// Set only the base URL of the process-wide default configuration.
pub fn set_default_base_url(base_url: impl Into<String>) {
    default_config_cell().write().unwrap().base_url = base_url.into();
}

/// Snapshot of the process-wide default configuration.
pub fn default_config() -> NetConfig {
    default_config_cell().read().unwrap().clone()
}
