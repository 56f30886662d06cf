/*
 * builder.rs
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

//! Pure transform from a RequestDescriptor to a TransportRequest: URL
//! assembly, percent-encoded query strings, JSON bodies, multipart encoding.
//! No side effects; a malformed URL fails with InvalidUrl before any I/O.

use bytes::BytesMut;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;

use crate::config::NetConfig;
use crate::error::NetError;
use crate::http::descriptor::{FormPart, Method, Params, RequestDescriptor};
use crate::transport::{split_url, TransportRequest};

/// Fixed multipart boundary token.
const BOUNDARY: &str = "wfWiEWrgEFA9A78512weF7106A";

/// Query component safe set: encode space, quotes, separators, and anything
/// that would terminate or restructure the query.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?')
    .add(b'/')
    .add(b'[')
    .add(b']')
    .add(b'@');

/// Build a transport-ready request from a descriptor and configuration.
///
/// The final URL is the path itself when absolute, else base URL + path.
/// Multipart parts take precedence over params; params are encoded per
/// method (GET: query string, otherwise body).
pub fn build(
    descriptor: &RequestDescriptor,
    config: &NetConfig,
) -> Result<TransportRequest, NetError> {
    if descriptor.path.is_empty() {
        return Err(NetError::invalid_url("(empty path)"));
    }
    if descriptor.method == Method::Get && descriptor.parts.is_some() {
        return Err(NetError::invalid_url(
            "multipart body is not valid with GET",
        ));
    }

    let mut url = if descriptor.path.starts_with("http://")
        || descriptor.path.starts_with("https://")
    {
        descriptor.path.clone()
    } else {
        format!("{}{}", config.base_url, descriptor.path)
    };
    split_url(&url)?;

    let mut headers = descriptor.headers.clone().unwrap_or_default();
    let mut body: Option<Vec<u8>> = None;

    if let Some(parts) = &descriptor.parts {
        body = Some(encode_multipart(parts));
        headers.insert(
            "Content-Type".to_string(),
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    } else if let Some(params) = &descriptor.params {
        match (descriptor.method, params) {
            (Method::Get, Params::Map(map)) => {
                url = append_query(&url, map);
            }
            (Method::Get, _) => {
                // Raw bytes/string carry no key-value structure for a query.
            }
            (_, Params::Map(map)) => {
                let encoded = serde_json::to_vec(&Value::Object(map.clone()))
                    .map_err(|e| NetError::Decode(e.to_string()))?;
                body = Some(encoded);
            }
            (_, Params::Bytes(bytes)) => {
                body = Some(bytes.clone());
            }
            (_, Params::Text(text)) => {
                body = Some(text.as_bytes().to_vec());
            }
        }
    }

    Ok(TransportRequest {
        url,
        method: descriptor.method,
        headers,
        body,
        timeout: descriptor.timeout,
        ignore_cache: true,
    })
}

/// Append a percent-encoded query string, extending an existing query with
/// '&' rather than overwriting it. Non-string values are JSON-serialized
/// before encoding.
fn append_query(url: &str, map: &serde_json::Map<String, Value>) -> String {
    if map.is_empty() {
        return url.to_string();
    }
    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        let value_str = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        pairs.push(format!(
            "{}={}",
            utf8_percent_encode(key, QUERY_COMPONENT),
            utf8_percent_encode(&value_str, QUERY_COMPONENT)
        ));
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, pairs.join("&"))
}

/// Encode a multipart/form-data body with the fixed boundary. Each part is
/// a Content-Disposition line (with filename when present, else a bare
/// file attribute), an optional Content-Type line, a blank line, then the
/// raw bytes; the body ends with the closing boundary marker.
fn encode_multipart(parts: &[FormPart]) -> Vec<u8> {
    let mut body = BytesMut::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        if let Some(filename) = &part.filename {
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, filename
                )
                .as_bytes(),
            );
        } else {
            body.extend_from_slice(
                format!("Content-Disposition: form-data; file=\"{}\"\r\n", part.name)
                    .as_bytes(),
            );
        }
        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        } else {
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(&part.data);
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn config() -> NetConfig {
        NetConfig::new("https://api.example.com")
    }

    fn map(entries: &[(&str, Value)]) -> Map<String, Value> {
        let mut m = Map::new();
        for (k, v) in entries {
            m.insert((*k).to_string(), v.clone());
        }
        m
    }

    #[test]
    fn joins_base_url_and_path() {
        let request = build(&RequestDescriptor::new("/v1/users"), &config()).unwrap();
        assert_eq!(request.url, "https://api.example.com/v1/users");
        assert!(request.ignore_cache);
        assert!(request.body.is_none());
    }

    #[test]
    fn absolute_path_is_used_as_is() {
        let request =
            build(&RequestDescriptor::new("https://other.example.com/x"), &config()).unwrap();
        assert_eq!(request.url, "https://other.example.com/x");
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = build(&RequestDescriptor::new(""), &config()).unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }

    #[test]
    fn malformed_url_is_invalid() {
        let err = build(&RequestDescriptor::new("/x"), &NetConfig::new("nonsense")).unwrap_err();
        assert!(matches!(err, NetError::InvalidUrl(_)));
    }

    #[test]
    fn get_map_becomes_percent_encoded_query() {
        let descriptor = RequestDescriptor::new("/search").params_map(map(&[
            ("q", Value::from("a b&c")),
            ("page", Value::from(2)),
        ]));
        let request = build(&descriptor, &config()).unwrap();
        assert_eq!(
            request.url,
            "https://api.example.com/search?q=a%20b%26c&page=2"
        );
    }

    #[test]
    fn existing_query_is_extended_not_overwritten() {
        let descriptor =
            RequestDescriptor::new("/search?lang=en").params_map(map(&[("q", Value::from("x"))]));
        let request = build(&descriptor, &config()).unwrap();
        assert_eq!(request.url, "https://api.example.com/search?lang=en&q=x");
    }

    #[test]
    fn non_get_map_round_trips_as_json_body() {
        let entries = map(&[("name", Value::from("ada")), ("age", Value::from(36))]);
        let descriptor = RequestDescriptor::new("/users")
            .method(Method::Post)
            .params_map(entries.clone());
        let request = build(&descriptor, &config()).unwrap();
        let body = request.body.unwrap();
        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, Value::Object(entries));
    }

    #[test]
    fn bytes_and_text_pass_through() {
        let request = build(
            &RequestDescriptor::new("/raw")
                .method(Method::Put)
                .params_bytes(vec![1, 2, 3]),
            &config(),
        )
        .unwrap();
        assert_eq!(request.body.unwrap(), vec![1, 2, 3]);

        let request = build(
            &RequestDescriptor::new("/raw")
                .method(Method::Post)
                .params_text("plain"),
            &config(),
        )
        .unwrap();
        assert_eq!(request.body.unwrap(), b"plain".to_vec());
    }

    #[test]
    fn multipart_layout() {
        let descriptor = RequestDescriptor::new("/upload")
            .method(Method::Post)
            .parts(vec![FormPart::new("f", b"ab".to_vec()).filename("a.txt")]);
        let request = build(&descriptor, &config()).unwrap();
        assert_eq!(
            request.headers.get("Content-Type").unwrap(),
            &format!("multipart/form-data; boundary={}", BOUNDARY)
        );
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        assert!(body.starts_with(&format!("--{}\r\n", BOUNDARY)));
        assert!(body.contains("Content-Disposition: form-data; name=\"f\"; filename=\"a.txt\""));
        assert!(body.contains("ab"));
        assert!(body.ends_with(&format!("--{}--\r\n", BOUNDARY)));
    }

    #[test]
    fn multipart_without_filename_uses_file_attribute() {
        let descriptor = RequestDescriptor::new("/upload")
            .method(Method::Post)
            .parts(vec![FormPart::new("blob", b"xyz".to_vec()).content_type("text/plain")]);
        let request = build(&descriptor, &config()).unwrap();
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        assert!(body.contains("Content-Disposition: form-data; file=\"blob\""));
        assert!(body.contains("Content-Type: text/plain\r\n\r\nxyz"));
    }

    #[test]
    fn multipart_takes_precedence_over_params() {
        let descriptor = RequestDescriptor::new("/upload")
            .method(Method::Post)
            .params_text("ignored")
            .parts(vec![FormPart::new("f", b"d".to_vec())]);
        let request = build(&descriptor, &config()).unwrap();
        let body = String::from_utf8(request.body.unwrap()).unwrap();
        assert!(!body.contains("ignored"));
        assert!(body.contains(BOUNDARY));
    }

    #[test]
    fn multipart_with_get_is_rejected() {
        let descriptor =
            RequestDescriptor::new("/upload").parts(vec![FormPart::new("f", b"d".to_vec())]);
        assert!(matches!(
            build(&descriptor, &config()),
            Err(NetError::InvalidUrl(_))
        ));
    }
}
