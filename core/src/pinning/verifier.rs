/*
 * verifier.rs
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

//! The pinning decision itself, independent of any TLS stack. Given a host
//! and the presented DER chain, produce a Verdict. Anything that prevents a
//! definite decision degrades to Default (ordinary WebPKI validation), never
//! to Reject.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::pinning::spki::subject_public_key_info;

/// How pinned hashes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinningMode {
    /// Hashes are uppercase-hex SHA-256 digests of the whole leaf
    /// certificate in DER form. Only the leaf is examined.
    LeafCertificate,
    /// Hashes are base64 SHA-256 digests of each certificate's
    /// SubjectPublicKeyInfo. The whole chain is examined and at least as
    /// many certificates must match as there are configured hashes.
    PublicKeyChain,
}

/// One pinning rule: a host pattern and the hashes accepted for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinningRule {
    host: String,
    hashes: Vec<String>,
}

impl PinningRule {
    /// A leading "*." on the host pattern is stripped; matching is by
    /// containment, so "*.example.com" and "example.com" behave alike.
    pub fn new(host: impl Into<String>, hashes: Vec<String>) -> Self {
        let host = host.into();
        let host = host.strip_prefix("*.").unwrap_or(&host).to_string();
        Self { host, hashes }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn hashes(&self) -> &[String] {
        &self.hashes
    }

    fn matches(&self, host: &str) -> bool {
        host.contains(self.host.as_str())
    }
}

/// Outcome of a pinning decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The chain matched a pin; trust it without further validation.
    Accept,
    /// A rule applied and the chain did not match; fail the handshake.
    Reject,
    /// No applicable rule or no usable material; fall back to WebPKI.
    Default,
}

/// Stateless evaluator over a fixed rule set and mode.
#[derive(Debug, Clone)]
pub struct PinningVerifier {
    rules: Vec<PinningRule>,
    mode: PinningMode,
}

impl PinningVerifier {
    pub fn new(rules: Vec<PinningRule>, mode: PinningMode) -> Self {
        Self { rules, mode }
    }

    /// Decide for one handshake. `chain` is the presented certificate chain
    /// in DER form, leaf first.
    pub fn decide(&self, host: &str, chain: &[&[u8]]) -> Verdict {
        let rule = match self.rules.iter().find(|r| r.matches(host)) {
            Some(rule) => rule,
            None => return Verdict::Default,
        };
        if rule.hashes.is_empty() || chain.is_empty() {
            return Verdict::Default;
        }
        match self.mode {
            PinningMode::LeafCertificate => {
                let digest = hex_upper(&Sha256::digest(chain[0]));
                if rule
                    .hashes
                    .iter()
                    .any(|pin| pin.eq_ignore_ascii_case(&digest))
                {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                }
            }
            PinningMode::PublicKeyChain => {
                let mut matched = 0usize;
                for cert in chain {
                    let spki = match subject_public_key_info(cert) {
                        Some(spki) => spki,
                        // Unparseable certificate: leave the decision to WebPKI.
                        None => return Verdict::Default,
                    };
                    let digest = BASE64.encode(Sha256::digest(spki));
                    if rule.hashes.iter().any(|pin| pin == &digest) {
                        matched += 1;
                    }
                }
                if matched >= rule.hashes.len() {
                    Verdict::Accept
                } else {
                    Verdict::Reject
                }
            }
        }
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02X}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_pin(cert: &[u8]) -> String {
        hex_upper(&Sha256::digest(cert))
    }

    #[test]
    fn wildcard_prefix_is_stripped() {
        let rule = PinningRule::new("*.example.com", vec![]);
        assert_eq!(rule.host(), "example.com");
        assert!(rule.matches("api.example.com"));
        assert!(rule.matches("example.com"));
    }

    #[test]
    fn no_matching_rule_is_default() {
        let verifier = PinningVerifier::new(
            vec![PinningRule::new("example.com", vec!["AB".into()])],
            PinningMode::LeafCertificate,
        );
        assert_eq!(verifier.decide("other.net", &[b"cert"]), Verdict::Default);
    }

    #[test]
    fn empty_rules_or_chain_is_default() {
        let verifier = PinningVerifier::new(vec![], PinningMode::LeafCertificate);
        assert_eq!(verifier.decide("example.com", &[b"cert"]), Verdict::Default);

        let verifier = PinningVerifier::new(
            vec![PinningRule::new("example.com", vec!["AB".into()])],
            PinningMode::LeafCertificate,
        );
        assert_eq!(verifier.decide("example.com", &[]), Verdict::Default);

        let verifier = PinningVerifier::new(
            vec![PinningRule::new("example.com", vec![])],
            PinningMode::LeafCertificate,
        );
        assert_eq!(verifier.decide("example.com", &[b"cert"]), Verdict::Default);
    }

    #[test]
    fn leaf_mode_matches_case_insensitively() {
        let cert = b"leaf certificate bytes";
        let pin = leaf_pin(cert).to_lowercase();
        let verifier = PinningVerifier::new(
            vec![PinningRule::new("example.com", vec![pin])],
            PinningMode::LeafCertificate,
        );
        assert_eq!(
            verifier.decide("api.example.com", &[cert]),
            Verdict::Accept
        );
    }

    #[test]
    fn leaf_mode_rejects_wrong_leaf() {
        let verifier = PinningVerifier::new(
            vec![PinningRule::new(
                "example.com",
                vec![leaf_pin(b"expected cert")],
            )],
            PinningMode::LeafCertificate,
        );
        assert_eq!(
            verifier.decide("example.com", &[b"presented cert"]),
            Verdict::Reject
        );
    }

    #[test]
    fn leaf_mode_only_examines_first_certificate() {
        let expected = b"expected cert";
        let verifier = PinningVerifier::new(
            vec![PinningRule::new("example.com", vec![leaf_pin(expected)])],
            PinningMode::LeafCertificate,
        );
        // Pinned cert present only as intermediate: still a reject.
        let chain: [&[u8]; 2] = [b"other leaf", expected];
        assert_eq!(verifier.decide("example.com", &chain), Verdict::Reject);
    }

    #[test]
    fn first_matching_rule_wins() {
        let cert = b"cert";
        let verifier = PinningVerifier::new(
            vec![
                PinningRule::new("example.com", vec![leaf_pin(b"mismatch")]),
                PinningRule::new("api.example.com", vec![leaf_pin(cert)]),
            ],
            PinningMode::LeafCertificate,
        );
        // The broad rule matches first and rejects, even though the later
        // narrower rule would accept.
        assert_eq!(verifier.decide("api.example.com", &[cert]), Verdict::Reject);
    }

    fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
        let mut out = vec![tag, content.len() as u8];
        out.extend_from_slice(content);
        out
    }

    // Minimal parseable certificate whose SubjectPublicKeyInfo wraps `key`.
    fn cert_with_key(key: &[u8]) -> Vec<u8> {
        let mut tbs = Vec::new();
        tbs.extend(tlv(0x02, &[1])); // serialNumber
        tbs.extend(tlv(0x30, &[0x06, 0x01, 0x2a])); // signature
        tbs.extend(tlv(0x30, b"issuer"));
        tbs.extend(tlv(0x30, b"validity"));
        tbs.extend(tlv(0x30, b"subject"));
        tbs.extend(tlv(0x30, key)); // subjectPublicKeyInfo
        let mut cert = tlv(0x30, &tbs);
        cert.extend(tlv(0x30, &[0x06, 0x01, 0x2a])); // signatureAlgorithm
        cert.extend(tlv(0x03, &[0x00, 0xaa])); // signature
        tlv(0x30, &cert)
    }

    fn spki_pin(cert: &[u8]) -> String {
        BASE64.encode(Sha256::digest(subject_public_key_info(cert).unwrap()))
    }

    #[test]
    fn chain_mode_accepts_when_matches_reach_pin_count() {
        let leaf = cert_with_key(b"leaf key");
        let intermediate = cert_with_key(b"intermediate key");
        let verifier = PinningVerifier::new(
            vec![PinningRule::new(
                "example.com",
                vec![spki_pin(&leaf), spki_pin(&intermediate)],
            )],
            PinningMode::PublicKeyChain,
        );
        let chain: [&[u8]; 2] = [&leaf, &intermediate];
        assert_eq!(verifier.decide("example.com", &chain), Verdict::Accept);
    }

    #[test]
    fn chain_mode_single_pin_matches_anywhere_in_the_chain() {
        let leaf = cert_with_key(b"rotated leaf key");
        let intermediate = cert_with_key(b"pinned intermediate key");
        let verifier = PinningVerifier::new(
            vec![PinningRule::new(
                "example.com",
                vec![spki_pin(&intermediate)],
            )],
            PinningMode::PublicKeyChain,
        );
        let chain: [&[u8]; 2] = [&leaf, &intermediate];
        assert_eq!(verifier.decide("example.com", &chain), Verdict::Accept);
    }

    #[test]
    fn chain_mode_rejects_when_matches_fall_short() {
        let leaf = cert_with_key(b"leaf key");
        let presented = cert_with_key(b"unrelated key");
        let verifier = PinningVerifier::new(
            vec![PinningRule::new(
                "example.com",
                vec![spki_pin(&leaf), spki_pin(&cert_with_key(b"other key"))],
            )],
            PinningMode::PublicKeyChain,
        );
        // Only one of the two configured pins appears in the chain.
        let chain: [&[u8]; 2] = [&leaf, &presented];
        assert_eq!(verifier.decide("example.com", &chain), Verdict::Reject);
    }

    #[test]
    fn chain_mode_unparseable_cert_is_default() {
        let verifier = PinningVerifier::new(
            vec![PinningRule::new("example.com", vec!["pin".into()])],
            PinningMode::PublicKeyChain,
        );
        assert_eq!(
            verifier.decide("example.com", &[b"not der at all"]),
            Verdict::Default
        );
    }
}
