//! OpenSSL-compatible subject name hashing
//!
//! Computes `X509_NAME_hash` as used by the `c_rehash` filename
//! convention: SHA-1 over the canonical encoding of the subject Name,
//! low four digest bytes read little-endian, printed as eight lowercase
//! hex digits. The canonical encoding normalizes attribute values so
//! that names differing only in string type, case, or whitespace hash
//! identically.

use sha1::{Digest, Sha1};

const UTF8_STRING: u8 = 0x0c;
const NUMERIC_STRING: u8 = 0x12;
const PRINTABLE_STRING: u8 = 0x13;
const T61_STRING: u8 = 0x14;
const IA5_STRING: u8 = 0x16;
const VISIBLE_STRING: u8 = 0x1a;
const UNIVERSAL_STRING: u8 = 0x1c;
const BMP_STRING: u8 = 0x1e;

/// Hash a DER-encoded X.501 Name (the raw subject TLV).
///
/// Returns `None` when the DER structure is not a well-formed Name.
pub fn subject_hash(name_der: &[u8]) -> Option<String> {
    let canon = canonical_name(name_der)?;
    let digest = Sha1::digest(&canon);
    let word = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
    Some(format!("{word:08x}"))
}

/// Re-encode a Name in OpenSSL's canonical form.
///
/// Each RDN SET is rebuilt with its attribute values normalized and the
/// outer SEQUENCE header omitted. Entry order is preserved.
fn canonical_name(name_der: &[u8]) -> Option<Vec<u8>> {
    let (name_tag, rdns, _) = read_tlv(name_der, 0)?;
    if name_tag != 0x30 {
        return None;
    }

    let mut canon = Vec::new();
    let mut offset = 0;
    while offset < rdns.len() {
        let (set_tag, set_content, set_end) = read_tlv(rdns, offset)?;
        if set_tag != 0x31 {
            return None;
        }
        offset = set_end;

        let mut attrs = Vec::new();
        let mut inner = 0;
        while inner < set_content.len() {
            let (seq_tag, seq_content, seq_end) = read_tlv(set_content, inner)?;
            if seq_tag != 0x30 {
                return None;
            }
            inner = seq_end;

            // The attribute type OID is carried over verbatim.
            let (oid_tag, _, value_start) = read_tlv(seq_content, 0)?;
            if oid_tag != 0x06 {
                return None;
            }
            let (value_tag, value, _) = read_tlv(seq_content, value_start)?;

            let mut attr = seq_content[..value_start].to_vec();
            attr.extend(canonical_value(value_tag, value)?);
            attrs.extend(tlv(0x30, &attr));
        }
        canon.extend(tlv(0x31, &attrs));
    }
    Some(canon)
}

/// Normalize one attribute value.
///
/// String types become UTF8String with whitespace trimmed, interior
/// runs collapsed to a single space, and ASCII characters lowercased.
/// Every other type is copied verbatim.
fn canonical_value(tag: u8, content: &[u8]) -> Option<Vec<u8>> {
    let utf8 = match tag {
        BMP_STRING => decode_utf16_be(content)?,
        UNIVERSAL_STRING => decode_utf32_be(content)?,
        // T61String is treated as Latin-1, following OpenSSL
        T61_STRING => content.iter().map(|&b| b as char).collect::<String>().into_bytes(),
        UTF8_STRING | NUMERIC_STRING | PRINTABLE_STRING | IA5_STRING | VISIBLE_STRING => {
            content.to_vec()
        }
        _ => return Some(tlv(tag, content)),
    };
    Some(tlv(UTF8_STRING, &normalize(&utf8)))
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Trim, collapse whitespace runs, and ASCII-lowercase.
///
/// Operates on bytes: multi-byte UTF-8 sequences are all >= 0x80 and
/// pass through untouched, which is exactly OpenSSL's behavior.
fn normalize(s: &[u8]) -> Vec<u8> {
    let mut start = 0;
    let mut end = s.len();
    while start < end && is_space(s[start]) {
        start += 1;
    }
    while end > start && is_space(s[end - 1]) {
        end -= 1;
    }

    let mut out = Vec::with_capacity(end - start);
    let mut in_run = false;
    for &b in &s[start..end] {
        if is_space(b) {
            in_run = true;
            continue;
        }
        if in_run {
            out.push(b' ');
            in_run = false;
        }
        out.push(b.to_ascii_lowercase());
    }
    out
}

fn decode_utf16_be(content: &[u8]) -> Option<Vec<u8>> {
    if content.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = content
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    Some(String::from_utf16(&units).ok()?.into_bytes())
}

fn decode_utf32_be(content: &[u8]) -> Option<Vec<u8>> {
    if content.len() % 4 != 0 {
        return None;
    }
    let mut out = String::with_capacity(content.len() / 4);
    for chunk in content.chunks_exact(4) {
        let cp = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        out.push(char::from_u32(cp)?);
    }
    Some(out.into_bytes())
}

/// Read one TLV at `offset`, returning the tag, content slice, and the
/// offset just past the value. Only definite lengths are accepted.
fn read_tlv(buf: &[u8], offset: usize) -> Option<(u8, &[u8], usize)> {
    let tag = *buf.get(offset)?;
    let mut pos = offset + 1;
    let first = *buf.get(pos)?;
    pos += 1;

    let len = if first & 0x80 == 0 {
        first as usize
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 {
            return None;
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | *buf.get(pos)? as usize;
            pos += 1;
        }
        len
    };

    let end = pos.checked_add(len)?;
    if end > buf.len() {
        return None;
    }
    Some((tag, &buf[pos..end], end))
}

/// Serialize a TLV with a minimal definite length.
fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    out.push(tag);
    if content.len() < 0x80 {
        out.push(content.len() as u8);
    } else {
        let bytes = content.len().to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        let body = &bytes[skip..];
        out.push(0x80 | body.len() as u8);
        out.extend_from_slice(body);
    }
    out.extend_from_slice(content);
    out
}
