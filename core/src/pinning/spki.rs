/*
 * spki.rs
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

//! Just enough DER to locate the SubjectPublicKeyInfo inside an X.509
//! certificate. Walks the TBSCertificate fields positionally; any structural
//! surprise yields None and the caller falls back to ordinary validation.

/// One parsed tag-length-value: content bounds plus total encoded length.
struct Tlv {
    content_start: usize,
    content_len: usize,
    total_len: usize,
}

/// Parse the TLV at `data[offset..]`. Definite-length forms only (short form
/// and long form up to four length octets); indefinite length yields None.
fn read_tlv(data: &[u8], offset: usize) -> Option<Tlv> {
    if offset + 2 > data.len() {
        return None;
    }
    let first_len = data[offset + 1];
    let (content_start, content_len) = if first_len < 0x80 {
        (offset + 2, first_len as usize)
    } else if first_len == 0x80 {
        return None;
    } else {
        let n = (first_len & 0x7f) as usize;
        if n > 4 || offset + 2 + n > data.len() {
            return None;
        }
        let mut len = 0usize;
        for i in 0..n {
            len = (len << 8) | data[offset + 2 + i] as usize;
        }
        (offset + 2 + n, len)
    };
    let end = content_start.checked_add(content_len)?;
    if end > data.len() {
        return None;
    }
    Some(Tlv {
        content_start,
        content_len,
        total_len: end - offset,
    })
}

/// Extract the full SubjectPublicKeyInfo TLV (header included) from a DER
/// certificate. Returns None when the certificate does not parse.
pub fn subject_public_key_info(cert_der: &[u8]) -> Option<&[u8]> {
    // Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm, signature }
    let outer = read_tlv(cert_der, 0)?;
    if cert_der[0] != 0x30 {
        return None;
    }
    let tbs_offset = outer.content_start;
    let tbs = read_tlv(cert_der, tbs_offset)?;
    if cert_der[tbs_offset] != 0x30 {
        return None;
    }
    let tbs_end = tbs.content_start + tbs.content_len;

    // TBSCertificate fields, in order: [0] version (optional), serialNumber,
    // signature, issuer, validity, subject, subjectPublicKeyInfo.
    let mut cursor = tbs.content_start;
    if cert_der.get(cursor) == Some(&0xa0) {
        cursor += read_tlv(cert_der, cursor)?.total_len;
    }
    for _ in 0..5 {
        cursor += read_tlv(cert_der, cursor)?.total_len;
        if cursor >= tbs_end {
            return None;
        }
    }
    let spki = read_tlv(cert_der, cursor)?;
    if cert_der[cursor] != 0x30 || cursor + spki.total_len > tbs_end {
        return None;
    }
    Some(&cert_der[cursor..cursor + spki.total_len])
}
