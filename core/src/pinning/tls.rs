/*
 * tls.rs
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

//! rustls integration: a ServerCertVerifier that consults the pinning rules
//! first and delegates everything else (including all signature checks) to
//! the stock WebPKI verifier.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::NetError;
use crate::pinning::verifier::{PinningMode, PinningRule, PinningVerifier, Verdict};

/// Root certificate store: platform native certs first, then webpki-roots as
/// fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

/// Certificate verifier with a pinning fast path. Accept short-circuits all
/// WebPKI validation; Reject fails the handshake; Default behaves exactly as
/// the stock verifier would.
#[derive(Debug)]
pub struct PinnedServerVerifier {
    pins: PinningVerifier,
    webpki: Arc<WebPkiServerVerifier>,
}

impl PinnedServerVerifier {
    pub fn new(rules: Vec<PinningRule>, mode: PinningMode) -> Result<Self, NetError> {
        let webpki = WebPkiServerVerifier::builder(Arc::new(build_root_store()))
            .build()
            .map_err(|e| NetError::transport(e.to_string()))?;
        Ok(Self {
            pins: PinningVerifier::new(rules, mode),
            webpki,
        })
    }

    fn host_of(server_name: &ServerName<'_>) -> String {
        match server_name {
            ServerName::DnsName(dns) => dns.as_ref().to_string(),
            ServerName::IpAddress(ip) => std::net::IpAddr::from(*ip).to_string(),
            _ => String::new(),
        }
    }
}

impl ServerCertVerifier for PinnedServerVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = Self::host_of(server_name);
        let chain: Vec<&[u8]> = std::iter::once(end_entity)
            .chain(intermediates.iter())
            .map(|cert| cert.as_ref())
            .collect();
        match self.pins.decide(&host, &chain) {
            Verdict::Accept => Ok(ServerCertVerified::assertion()),
            Verdict::Reject => Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            )),
            Verdict::Default => self.webpki.verify_server_cert(
                end_entity,
                intermediates,
                server_name,
                ocsp_response,
                now,
            ),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.webpki.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.webpki.supported_verify_schemes()
    }
}

/// TLS client config for HTTP/1.1 + HTTP/2 with ALPN, verifying server
/// certificates through the pinning rules.
pub fn pinned_client_config(
    rules: Vec<PinningRule>,
    mode: PinningMode,
) -> Result<Arc<ClientConfig>, NetError> {
    let verifier = PinnedServerVerifier::new(rules, mode)?;
    let mut config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sha2::{Digest, Sha256};

    fn leaf_pin(cert: &[u8]) -> String {
        Sha256::digest(cert)
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect()
    }

    fn verifier_for(rules: Vec<PinningRule>) -> PinnedServerVerifier {
        PinnedServerVerifier::new(rules, PinningMode::LeafCertificate).unwrap()
    }

    #[test]
    fn pinned_leaf_short_circuits_webpki() {
        let cert_bytes = b"self signed nonsense".to_vec();
        let verifier = verifier_for(vec![PinningRule::new(
            "example.com",
            vec![leaf_pin(&cert_bytes)],
        )]);
        let cert = CertificateDer::from(cert_bytes);
        let name = ServerName::try_from("api.example.com").unwrap();
        let result =
            verifier.verify_server_cert(&cert, &[], &name, &[], UnixTime::now());
        assert!(result.is_ok());
    }

    #[test]
    fn mismatched_pin_fails_the_handshake() {
        let verifier = verifier_for(vec![PinningRule::new(
            "example.com",
            vec![leaf_pin(b"the expected certificate")],
        )]);
        let cert = CertificateDer::from(b"a different certificate".to_vec());
        let name = ServerName::try_from("example.com").unwrap();
        let result =
            verifier.verify_server_cert(&cert, &[], &name, &[], UnixTime::now());
        assert!(matches!(
            result,
            Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure
            ))
        ));
    }

    #[test]
    fn unpinned_host_falls_through_to_webpki() {
        let verifier = verifier_for(vec![PinningRule::new(
            "example.com",
            vec![leaf_pin(b"cert")],
        )]);
        let cert = CertificateDer::from(b"not a real certificate".to_vec());
        let name = ServerName::try_from("other.net").unwrap();
        // WebPKI cannot parse the garbage certificate, so this errors, but
        // crucially not with the pinning rejection error.
        let result =
            verifier.verify_server_cert(&cert, &[], &name, &[], UnixTime::now());
        assert!(!matches!(
            result,
            Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure
            ))
        ));
    }

    #[test]
    fn client_config_builds_with_alpn() {
        let config = pinned_client_config(vec![], PinningMode::PublicKeyChain).unwrap();
        assert_eq!(
            config.alpn_protocols,
            vec![b"h2".to_vec(), b"http/1.1".to_vec()]
        );
    }
}
