/*
 * descriptor.rs
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

//! Request descriptor: method, path, params or multipart parts, headers,
//! timeout, and response-parsing hints. Built via chainable setters, then
//! handed to `HttpClient::send`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::DEFAULT_TIMEOUT;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

/// Request parameters. For GET they become the query string; otherwise the
/// body: a mapping is JSON-encoded, bytes pass through, a string is UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Bytes(Vec<u8>),
    Text(String),
    /// Ordered mapping (insertion order is preserved on serialization).
    Map(Map<String, Value>),
}

/// One part of a multipart/form-data body.
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

impl FormPart {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            content_type: None,
            filename: None,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Immutable description of one outgoing HTTP call.
///
/// `path` may be an absolute URL or a suffix joined to the configured base
/// URL. When `parts` is set it takes precedence over `params`; a multipart
/// body is invalid with GET.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub path: String,
    pub method: Method,
    pub params: Option<Params>,
    pub headers: Option<HashMap<String, String>>,
    pub timeout: Duration,
    pub parts: Option<Vec<FormPart>>,
    /// Dot-delimited path into the decoded JSON body locating the payload.
    pub data_key: Option<String>,
    /// Store the located payload on the envelope after a successful call.
    pub decode_model: bool,
    pub print_log: bool,
}

impl RequestDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: Method::Get,
            params: None,
            headers: None,
            timeout: DEFAULT_TIMEOUT,
            parts: None,
            data_key: None,
            decode_model: false,
            print_log: false,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn params_map(mut self, map: Map<String, Value>) -> Self {
        self.params = Some(Params::Map(map));
        self
    }

    pub fn params_text(mut self, text: impl Into<String>) -> Self {
        self.params = Some(Params::Text(text.into()));
        self
    }

    pub fn params_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.params = Some(Params::Bytes(bytes));
        self
    }

    /// Add or replace a header. Stored as given; HTTP compares names
    /// case-insensitively.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn parts(mut self, parts: Vec<FormPart>) -> Self {
        self.parts = Some(parts);
        self
    }

    pub fn data_key(mut self, key: impl Into<String>) -> Self {
        self.data_key = Some(key.into());
        self
    }

    pub fn decode_model(mut self, decode: bool) -> Self {
        self.decode_model = decode;
        self
    }

    pub fn print_log(mut self, print: bool) -> Self {
        self.print_log = print;
        self
    }

    /// Body rendered for diagnostics: string as-is, bytes lossily decoded,
    /// mapping as compact JSON.
    pub fn body_text(&self) -> String {
        match &self.params {
            Some(Params::Text(s)) => s.clone(),
            Some(Params::Bytes(b)) => String::from_utf8_lossy(b).into_owned(),
            Some(Params::Map(m)) => {
                serde_json::to_string(&Value::Object(m.clone())).unwrap_or_default()
            }
            None => String::new(),
        }
    }

    /// Stable identity for request de-duplication: URL + method + canonical
    /// headers + body text. Headers are serialized with sorted keys.
    pub fn identity(&self, base_url: &str) -> String {
        let url = if self.path.starts_with("http://") || self.path.starts_with("https://") {
            self.path.clone()
        } else {
            format!("{}{}", base_url, self.path)
        };
        let headers = match &self.headers {
            Some(h) => {
                let sorted: BTreeMap<&String, &String> = h.iter().collect();
                serde_json::to_string(&sorted).unwrap_or_default()
            }
            None => String::new(),
        };
        format!("{}{}{}{}", url, self.method.as_str(), headers, self.body_text())
    }
}
