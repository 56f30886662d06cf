/*
 * envelope.rs
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

//! Response envelope: outcome of one completed or failed call. Created once
//! per attempt, immutable afterwards except for the lazy text/JSON caches
//! and the assigned decoded model. Never shared across calls, no pooling.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::NetError;
use crate::http::descriptor::RequestDescriptor;
use crate::transport::{TransportReply, TransportRequest};

/// Diagnostic body rendering is cut off past this many characters.
const LOG_BODY_LIMIT: usize = 2048;

/// Milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Outcome of one HTTP call: body, metadata, timing, decoded payload, or the
/// error that prevented any of those.
#[derive(Debug)]
pub struct ResponseEnvelope {
    /// The descriptor this envelope answers. Absent only when construction
    /// predates a descriptor (not produced by HttpClient).
    pub request: Option<RequestDescriptor>,
    /// The transport request actually sent; absent when the build failed.
    pub built: Option<TransportRequest>,
    pub start_ms: u128,
    pub duration_ms: u128,
    pub raw_body: Option<Vec<u8>>,
    pub status: Option<u16>,
    pub response_headers: Option<HashMap<String, String>>,
    pub transport_error: Option<NetError>,
    /// JSON payload located via the descriptor's data key, stored after a
    /// successful call when the descriptor asks for model decoding.
    pub decoded_model: Option<Value>,
    body_text: OnceLock<Option<String>>,
    body_json: OnceLock<Option<Value>>,
    extracted: OnceLock<Option<Value>>,
}

impl ResponseEnvelope {
    /// Envelope for a completed exchange (any status code).
    pub fn completed(
        request: RequestDescriptor,
        built: TransportRequest,
        start_ms: u128,
        reply: TransportReply,
    ) -> Self {
        Self {
            request: Some(request),
            built: Some(built),
            start_ms,
            duration_ms: now_ms().saturating_sub(start_ms),
            raw_body: Some(reply.body),
            status: Some(reply.status),
            response_headers: Some(reply.headers),
            transport_error: None,
            decoded_model: None,
            body_text: OnceLock::new(),
            body_json: OnceLock::new(),
            extracted: OnceLock::new(),
        }
    }

    /// Envelope for a transport failure after the request was built.
    pub fn failed(
        request: RequestDescriptor,
        built: TransportRequest,
        start_ms: u128,
        error: NetError,
    ) -> Self {
        Self {
            request: Some(request),
            built: Some(built),
            start_ms,
            duration_ms: now_ms().saturating_sub(start_ms),
            raw_body: None,
            status: None,
            response_headers: None,
            transport_error: Some(error),
            decoded_model: None,
            body_text: OnceLock::new(),
            body_json: OnceLock::new(),
            extracted: OnceLock::new(),
        }
    }

    /// Envelope for a request that never built: zero timing, no transport.
    pub fn unbuilt(request: RequestDescriptor, error: NetError) -> Self {
        Self {
            request: Some(request),
            built: None,
            start_ms: 0,
            duration_ms: 0,
            raw_body: None,
            status: None,
            response_headers: None,
            transport_error: Some(error),
            decoded_model: None,
            body_text: OnceLock::new(),
            body_json: OnceLock::new(),
            extracted: OnceLock::new(),
        }
    }

    /// True iff the status code is present and in [200, 300).
    pub fn succeeded(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }

    /// Body as UTF-8 text; computed once and cached.
    pub fn body_text(&self) -> Option<&str> {
        self.body_text
            .get_or_init(|| {
                self.raw_body
                    .as_ref()
                    .and_then(|b| std::str::from_utf8(b).ok().map(str::to_string))
            })
            .as_deref()
    }

    /// Body parsed as JSON; computed once and cached.
    pub fn body_json(&self) -> Option<&Value> {
        self.body_json
            .get_or_init(|| {
                self.raw_body
                    .as_ref()
                    .and_then(|b| serde_json::from_slice(b).ok())
            })
            .as_ref()
    }

    /// Payload located by navigating the body JSON with the descriptor's
    /// dot-delimited data key. A direct key hit wins; otherwise the key is
    /// walked segment by segment; when the path does not resolve the whole
    /// body JSON is returned. Computed once and cached.
    pub fn extracted_data(&self) -> Option<&Value> {
        self.extracted
            .get_or_init(|| {
                let json = self.body_json()?;
                let key = match self.request.as_ref().and_then(|r| r.data_key.as_deref()) {
                    Some(k) => k,
                    None => return Some(json.clone()),
                };
                let map = match json.as_object() {
                    Some(m) => m,
                    None => return Some(json.clone()),
                };
                if let Some(found) = map.get(key) {
                    return Some(found.clone());
                }
                if key.contains('.') {
                    let mut current = json;
                    for segment in key.split('.') {
                        match current.as_object().and_then(|m| m.get(segment)) {
                            Some(next) => current = next,
                            None => return Some(json.clone()),
                        }
                    }
                    return Some(current.clone());
                }
                Some(json.clone())
            })
            .as_ref()
    }

    /// Best-effort typed decode of the located payload. Failure yields None,
    /// never an error; callers check presence.
    pub fn model<T: DeserializeOwned>(&self) -> Option<T> {
        let value = match &self.decoded_model {
            Some(v) => v,
            None => self.extracted_data()?,
        };
        serde_json::from_value(value.clone()).ok()
    }

    /// Drop the lazy caches. Used after the decrypt hook replaces the body so
    /// stale text/JSON derived from ciphertext cannot survive.
    pub(crate) fn reset_caches(&mut self) {
        self.body_text = OnceLock::new();
        self.body_json = OnceLock::new();
        self.extracted = OnceLock::new();
    }

    /// Multi-line diagnostic in curl form: start stamp, replayable command,
    /// status/duration, then the (truncated) body or error.
    pub fn diagnostic(&self) -> String {
        let mut message = format!(">>>>>>>>>>Start:{}", format_start(self.start_ms));
        if let Some(built) = &self.built {
            message.push_str(&format!(
                "\ncurl -X {} \"{}\"",
                built.method.as_str(),
                built.url
            ));
            for (name, value) in &built.headers {
                message.push_str(&format!(" \\\n -H \"{}:{}\"", name, value));
            }
            if let Some(body) = &built.body {
                message.push_str(&format!(
                    " \\\n -d \"{}\"",
                    String::from_utf8_lossy(body)
                ));
            }
        } else if let Some(request) = &self.request {
            message.push_str(&format!("\n{} {}", request.method.as_str(), request.path));
        }
        message.push_str(&format!("\n------Response:{}ms", self.duration_ms));
        if let Some(code) = self.status {
            message.push_str(&format!(" status:{}", code));
        }
        message.push('\n');
        if let Some(text) = self.body_text() {
            message.push_str(&truncate(text, LOG_BODY_LIMIT));
        } else if let Some(error) = &self.transport_error {
            message.push_str(&error.to_string());
        }
        message.push_str("\nEnd<<<<<<<<<<");
        message
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &text[..end])
}

fn format_start(start_ms: u128) -> String {
    match chrono::DateTime::from_timestamp_millis(start_ms as i64) {
        Some(stamp) => stamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => start_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::descriptor::Method;

    fn built(url: &str) -> TransportRequest {
        TransportRequest {
            url: url.to_string(),
            method: Method::Get,
            headers: HashMap::new(),
            body: None,
            timeout: std::time::Duration::from_secs(10),
            ignore_cache: true,
        }
    }

    fn reply(status: u16, body: &[u8]) -> TransportReply {
        TransportReply {
            status,
            headers: HashMap::new(),
            body: body.to_vec(),
        }
    }

    fn envelope_with(status: u16, body: &[u8], data_key: Option<&str>) -> ResponseEnvelope {
        let mut descriptor = RequestDescriptor::new("/x");
        if let Some(key) = data_key {
            descriptor = descriptor.data_key(key);
        }
        ResponseEnvelope::completed(
            descriptor,
            built("https://h/x"),
            now_ms(),
            reply(status, body),
        )
    }

    #[test]
    fn succeeded_is_2xx_only() {
        assert!(envelope_with(200, b"", None).succeeded());
        assert!(envelope_with(204, b"", None).succeeded());
        assert!(envelope_with(299, b"", None).succeeded());
        assert!(!envelope_with(300, b"", None).succeeded());
        assert!(!envelope_with(404, b"", None).succeeded());
        assert!(!envelope_with(199, b"", None).succeeded());

        let failed = ResponseEnvelope::failed(
            RequestDescriptor::new("/x"),
            built("https://h/x"),
            now_ms(),
            NetError::transport("refused"),
        );
        assert!(!failed.succeeded());
    }

    #[test]
    fn body_caches_are_idempotent() {
        let envelope = envelope_with(200, b"{\"a\":1}", None);
        let first = envelope.body_text().map(str::to_string);
        let second = envelope.body_text().map(str::to_string);
        assert_eq!(first, second);
        let j1 = envelope.body_json().cloned();
        let j2 = envelope.body_json().cloned();
        assert_eq!(j1, j2);
        assert_eq!(j1.unwrap()["a"], Value::from(1));
    }

    #[test]
    fn non_utf8_body_has_no_text() {
        let envelope = envelope_with(200, &[0xff, 0xfe], None);
        assert!(envelope.body_text().is_none());
        assert!(envelope.body_json().is_none());
    }

    #[test]
    fn extracted_data_walks_dot_path() {
        let body = br#"{"code":0,"data":{"user":{"name":"ada"}}}"#;
        let envelope = envelope_with(200, body, Some("data.user"));
        let extracted = envelope.extracted_data().unwrap();
        assert_eq!(extracted["name"], Value::from("ada"));
    }

    #[test]
    fn extracted_data_prefers_direct_key() {
        let body = br#"{"a.b":1,"a":{"b":2}}"#;
        let envelope = envelope_with(200, body, Some("a.b"));
        assert_eq!(envelope.extracted_data().unwrap(), &Value::from(1));
    }

    #[test]
    fn extracted_data_falls_back_to_whole_body() {
        let body = br#"{"code":0}"#;
        let envelope = envelope_with(200, body, Some("data.user"));
        let extracted = envelope.extracted_data().unwrap();
        assert_eq!(extracted["code"], Value::from(0));
    }

    #[test]
    fn model_decodes_best_effort() {
        let body = br#"{"data":{"name":"ada","role":"admin"}}"#;
        let envelope = envelope_with(200, body, Some("data"));
        let model: Option<HashMap<String, String>> = envelope.model();
        assert_eq!(model.unwrap().get("name").unwrap(), "ada");

        let mismatched: Option<Vec<u32>> = envelope.model();
        assert!(mismatched.is_none());
    }

    #[test]
    fn unbuilt_envelope_has_zero_timing() {
        let envelope = ResponseEnvelope::unbuilt(
            RequestDescriptor::new(""),
            NetError::invalid_url("(empty path)"),
        );
        assert_eq!(envelope.start_ms, 0);
        assert_eq!(envelope.duration_ms, 0);
        assert!(envelope.transport_error.is_some());
        assert!(!envelope.succeeded());
    }

    #[test]
    fn diagnostic_contains_curl_command_and_body() {
        let envelope = envelope_with(200, b"{\"ok\":true}", None);
        let diagnostic = envelope.diagnostic();
        assert!(diagnostic.contains("curl -X GET \"https://h/x\""));
        assert!(diagnostic.contains("{\"ok\":true}"));
        assert!(diagnostic.starts_with(">>>>>>>>>>Start:"));
        assert!(diagnostic.ends_with("End<<<<<<<<<<"));
    }

    #[test]
    fn diagnostic_truncates_long_bodies() {
        let long = "x".repeat(5000);
        let envelope = envelope_with(200, long.as_bytes(), None);
        assert!(envelope.diagnostic().contains("...(truncated)"));
    }
}
