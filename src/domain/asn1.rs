//! ASN.1 primitive codec.
//!
//! Hand-rolled DER tag/length/value helpers used by every EP11 structure:
//! admin blocks, SignerInfo and RecipientInfo. Decoders take a buffer plus an
//! offset and return the value together with the offset of the next element.
//! A declared length that runs past the buffer, or a tag that does not match,
//! is an [`Ep11Error::Asn1Error`]; nothing here indexes out of bounds.

use crate::domain::constants::{
    ASN1_BIT_STRING_TAG, ASN1_INTEGER_TAG, ASN1_OCTET_STRING_TAG, ASN1_OID_TAG,
    ASN1_SEQUENCE_TAG, DER_LONG_FORM_1_BYTE, DER_LONG_FORM_2_BYTE, DER_MAX_LENGTH_OCTETS,
};
use crate::infra::error::{Ep11Error, Ep11Result};

/// Encode a DER length in short or long form.
#[must_use]
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 128 {
        vec![len as u8]
    } else if len < 256 {
        vec![DER_LONG_FORM_1_BYTE, len as u8]
    } else if len < 65536 {
        vec![DER_LONG_FORM_2_BYTE, (len >> 8) as u8, (len & 0xFF) as u8]
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        let mut out = vec![0x80 | (bytes.len() - skip) as u8];
        out.extend_from_slice(&bytes[skip..]);
        out
    }
}

/// Wrap `value` as a single TLV with the given tag.
#[must_use]
pub fn encode_tagged(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 6);
    out.push(tag);
    out.extend_from_slice(&encode_length(value.len()));
    out.extend_from_slice(value);
    out
}

/// Concatenate already-encoded elements and wrap them in a SEQUENCE.
#[must_use]
pub fn encode_sequence(items: &[&[u8]]) -> Vec<u8> {
    let body: Vec<u8> = items.concat();
    encode_tagged(ASN1_SEQUENCE_TAG, &body)
}

#[must_use]
pub fn encode_octet_string(value: &[u8]) -> Vec<u8> {
    encode_tagged(ASN1_OCTET_STRING_TAG, value)
}

/// Encode an OID from its pre-encoded body.
#[must_use]
pub fn encode_oid(body: &[u8]) -> Vec<u8> {
    encode_tagged(ASN1_OID_TAG, body)
}

/// Encode a BIT STRING with zero unused bits.
#[must_use]
pub fn encode_bit_string(bits: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bits.len() + 1);
    body.push(0x00);
    body.extend_from_slice(bits);
    encode_tagged(ASN1_BIT_STRING_TAG, &body)
}

/// Encode an unsigned big-endian magnitude as a minimal INTEGER.
#[must_use]
pub fn encode_integer(magnitude: &[u8]) -> Vec<u8> {
    let trimmed = unsigned_magnitude(magnitude);
    let mut body = Vec::with_capacity(trimmed.len() + 1);
    if trimmed.is_empty() {
        body.push(0x00);
    } else {
        if trimmed[0] & 0x80 != 0 {
            body.push(0x00);
        }
        body.extend_from_slice(trimmed);
    }
    encode_tagged(ASN1_INTEGER_TAG, &body)
}

#[must_use]
pub fn encode_small_integer(value: u32) -> Vec<u8> {
    encode_integer(&value.to_be_bytes())
}

/// Strip leading zero bytes from a big-endian magnitude.
#[must_use]
pub fn unsigned_magnitude(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    &bytes[skip..]
}

/// Left-pad an unsigned magnitude to exactly `width` bytes.
pub fn left_pad(bytes: &[u8], width: usize) -> Ep11Result<Vec<u8>> {
    let magnitude = unsigned_magnitude(bytes);
    if magnitude.len() > width {
        return Err(Ep11Error::Asn1Error(format!(
            "integer of {} bytes does not fit in {width} bytes",
            magnitude.len()
        )));
    }
    let mut out = vec![0u8; width - magnitude.len()];
    out.extend_from_slice(magnitude);
    Ok(out)
}

/// Read the tag byte at `offset` without consuming it.
pub fn peek_tag(buf: &[u8], offset: usize) -> Ep11Result<u8> {
    buf.get(offset).copied().ok_or_else(|| {
        Ep11Error::Asn1Error(format!(
            "expected tag at offset {offset}, buffer holds {} bytes",
            buf.len()
        ))
    })
}

/// Decode the length octets starting at `offset`.
///
/// Returns the declared content length and the offset of the first content byte.
/// The content itself is checked against the buffer as well.
pub fn decode_length(buf: &[u8], offset: usize) -> Ep11Result<(usize, usize)> {
    let first = *buf.get(offset).ok_or_else(|| {
        Ep11Error::Asn1Error(format!("missing length octet at offset {offset}"))
    })?;

    let (len, content_start) = if first & 0x80 == 0 {
        (first as usize, offset + 1)
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 {
            return Err(Ep11Error::Asn1Error(
                "indefinite length form is not allowed".to_string(),
            ));
        }
        if count > DER_MAX_LENGTH_OCTETS {
            return Err(Ep11Error::Asn1Error(format!(
                "length uses {count} octets, at most {DER_MAX_LENGTH_OCTETS} supported"
            )));
        }
        let octets = buf.get(offset + 1..offset + 1 + count).ok_or_else(|| {
            Ep11Error::Asn1Error(format!("truncated long form length at offset {offset}"))
        })?;
        let len = octets
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        (len, offset + 1 + count)
    };

    let remaining = buf.len().saturating_sub(content_start);
    if len > remaining {
        return Err(Ep11Error::Asn1Error(format!(
            "declared length {len} at offset {offset} exceeds remaining {remaining} bytes"
        )));
    }
    Ok((len, content_start))
}

/// Decode one TLV whose tag must equal `expected_tag`.
pub fn decode_tlv(buf: &[u8], offset: usize, expected_tag: u8) -> Ep11Result<(&[u8], usize)> {
    let tag = peek_tag(buf, offset)?;
    if tag != expected_tag {
        return Err(Ep11Error::Asn1Error(format!(
            "expected tag 0x{expected_tag:02x} at offset {offset}, found 0x{tag:02x}"
        )));
    }
    let (len, start) = decode_length(buf, offset + 1)?;
    Ok((&buf[start..start + len], start + len))
}

/// Decode a TLV of any tag, returning `(tag, value, next_offset)`.
pub fn decode_any(buf: &[u8], offset: usize) -> Ep11Result<(u8, &[u8], usize)> {
    let tag = peek_tag(buf, offset)?;
    let (len, start) = decode_length(buf, offset + 1)?;
    Ok((tag, &buf[start..start + len], start + len))
}

pub fn decode_sequence(buf: &[u8], offset: usize) -> Ep11Result<(&[u8], usize)> {
    decode_tlv(buf, offset, ASN1_SEQUENCE_TAG)
}

pub fn decode_octet_string(buf: &[u8], offset: usize) -> Ep11Result<(&[u8], usize)> {
    decode_tlv(buf, offset, ASN1_OCTET_STRING_TAG)
}

pub fn decode_oid(buf: &[u8], offset: usize) -> Ep11Result<(&[u8], usize)> {
    let (value, next) = decode_tlv(buf, offset, ASN1_OID_TAG)?;
    if value.is_empty() {
        return Err(Ep11Error::Asn1Error(format!("empty OID at offset {offset}")));
    }
    Ok((value, next))
}

/// Decode a BIT STRING, returning the bits without the unused-bits octet.
pub fn decode_bit_string(buf: &[u8], offset: usize) -> Ep11Result<(&[u8], usize)> {
    let (value, next) = decode_tlv(buf, offset, ASN1_BIT_STRING_TAG)?;
    match value.split_first() {
        Some((0, bits)) => Ok((bits, next)),
        Some((unused, _)) => Err(Ep11Error::Asn1Error(format!(
            "BIT STRING at offset {offset} has {unused} unused bits"
        ))),
        None => Err(Ep11Error::Asn1Error(format!(
            "empty BIT STRING at offset {offset}"
        ))),
    }
}

/// Decode an INTEGER, returning its raw two's complement content.
pub fn decode_integer(buf: &[u8], offset: usize) -> Ep11Result<(&[u8], usize)> {
    let (value, next) = decode_tlv(buf, offset, ASN1_INTEGER_TAG)?;
    if value.is_empty() {
        return Err(Ep11Error::Asn1Error(format!(
            "zero-length INTEGER at offset {offset}"
        )));
    }
    Ok((value, next))
}

/// Decode a small non-negative INTEGER into a `u32`.
pub fn decode_small_integer(buf: &[u8], offset: usize) -> Ep11Result<(u32, usize)> {
    let (value, next) = decode_integer(buf, offset)?;
    if value[0] & 0x80 != 0 {
        return Err(Ep11Error::Asn1Error(format!(
            "negative INTEGER at offset {offset}"
        )));
    }
    let magnitude = unsigned_magnitude(value);
    if magnitude.len() > 4 {
        return Err(Ep11Error::Asn1Error(format!(
            "INTEGER at offset {offset} does not fit in 32 bits"
        )));
    }
    let parsed = magnitude.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
    Ok((parsed, next))
}

/// Skip the TLV at `offset`, re-validating its framing, and return the next offset.
pub fn skip_tlv(buf: &[u8], offset: usize) -> Ep11Result<usize> {
    let (_, _, next) = decode_any(buf, offset)?;
    Ok(next)
}

/// Decode `buf` as exactly one SEQUENCE of OCTET STRINGs.
pub fn decode_sequence_of_octet_strings(buf: &[u8]) -> Ep11Result<Vec<&[u8]>> {
    let (body, end) = decode_sequence(buf, 0)?;
    if end != buf.len() {
        return Err(Ep11Error::Asn1Error(format!(
            "{} trailing bytes after SEQUENCE",
            buf.len() - end
        )));
    }
    let mut items = Vec::new();
    let mut offset = 0;
    while offset < body.len() {
        let (value, next) = decode_octet_string(body, offset)?;
        items.push(value);
        offset = next;
    }
    Ok(items)
}
