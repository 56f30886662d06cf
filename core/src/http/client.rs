/*
 * client.rs
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

//! The request pipeline. `send` never returns Err: build failures, transport
//! failures, and decrypt failures are all captured inside the envelope so
//! callers inspect one uniform shape.

use std::sync::Arc;

use crate::config::{default_config, NetConfig};
use crate::error::NetError;
use crate::http::builder::build;
use crate::http::descriptor::RequestDescriptor;
use crate::http::envelope::{now_ms, ResponseEnvelope};
use crate::transport::HttpTransport;

/// Optional body transform applied after the reply arrives and before any
/// decoding. Returns the replacement plaintext or an error, which is captured
/// on the envelope like a transport failure.
pub type DecryptHook = Arc<dyn Fn(&ResponseEnvelope) -> Result<Vec<u8>, NetError> + Send + Sync>;

/// HTTP client bound to one configuration and one transport.
#[derive(Clone)]
pub struct HttpClient {
    config: NetConfig,
    transport: Arc<dyn HttpTransport>,
    decrypt: Option<DecryptHook>,
}

impl HttpClient {
    /// Client over the process-wide default configuration.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_config(default_config(), transport)
    }

    pub fn with_config(config: NetConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            decrypt: None,
        }
    }

    /// Install a body decrypt hook, applied to every reply.
    pub fn decrypt_hook(mut self, hook: DecryptHook) -> Self {
        self.decrypt = Some(hook);
        self
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Perform one call. Always yields an envelope: an unbuildable request
    /// produces an error envelope with zero timing and no transport activity.
    pub async fn send(&self, descriptor: RequestDescriptor) -> ResponseEnvelope {
        let built = match build(&descriptor, &self.config) {
            Ok(request) => request,
            Err(error) => {
                let envelope = ResponseEnvelope::unbuilt(descriptor, error);
                self.log(&envelope);
                return envelope;
            }
        };

        let start = now_ms();
        let mut envelope = match self.transport.perform(&built).await {
            Ok(reply) => ResponseEnvelope::completed(descriptor, built, start, reply),
            Err(error) => ResponseEnvelope::failed(descriptor, built, start, error),
        };

        if envelope.transport_error.is_none() {
            if let Some(hook) = &self.decrypt {
                match hook(&envelope) {
                    Ok(plain) => {
                        envelope.raw_body = Some(plain);
                        envelope.reset_caches();
                    }
                    Err(error) => envelope.transport_error = Some(error),
                }
            }
        }

        let wants_model = envelope
            .request
            .as_ref()
            .map(|r| r.decode_model)
            .unwrap_or(false);
        if wants_model && envelope.succeeded() && envelope.transport_error.is_none() {
            let extracted = envelope.extracted_data().cloned();
            envelope.decoded_model = extracted;
        }

        self.log(&envelope);
        envelope
    }

    /// Fire-and-forget diagnostic emission; never blocks the send path.
    fn log(&self, envelope: &ResponseEnvelope) {
        let requested = envelope
            .request
            .as_ref()
            .map(|r| r.print_log)
            .unwrap_or(false);
        if !requested && !self.config.print_log {
            return;
        }
        let message = envelope.diagnostic();
        let sink = self.config.log_sink.clone();
        tokio::spawn(async move {
            match sink {
                Some(sink) => sink(&message),
                None => eprintln!("[http] {}", message),
            }
        });
    }
}
