//! OA2 certificate layout (CEX6 / CEX6P).
//!
//! ```text
//! header (32 bytes, big-endian)
//!   u16 struct id | u16 version | u32 total length | u32 cert index
//!   u32 metadata length | u32 aux length | u32 public key length
//!   u32 signature length | u32 reserved
//! metadata            (metadata length)
//! aux data            (aux length)
//! subject SKI         (32)
//! signer SKI          (32)
//! subject public key  (public key length, must be 133)
//! signature section   (signature length, must be 136)
//!   u32 algorithm | R (66) | S (66)
//! ```
//!
//! The ECC signature covers everything before the signature section.

use std::fmt;

use super::cursor::{Cursor, Section};
use super::OaCertificate;
use crate::domain::constants::{
    OA_SIG_ALG_ECDSA_P521_SHA512, P521_COORDINATE_BYTES, P521_PUBLIC_KEY_BYTES, SKI_BYTES,
};
use crate::domain::types::Ski;
use crate::infra::error::{Ep11Error, Ep11Result};

pub const OA2_HEADER_BYTES: usize = 32;

/// u32 algorithm id followed by R and S
pub const OA2_SIGNATURE_SECTION_BYTES: usize = 4 + 2 * P521_COORDINATE_BYTES;

pub struct Oa2Certificate<'a> {
    pub struct_id: u16,
    pub version: u16,
    pub cert_index: u32,
    pub metadata: &'a [u8],
    pub aux_data: &'a [u8],
    subject_ski: Ski,
    signer_ski: Ski,
    public_key: &'a [u8],
    pub signature_algorithm: u32,
    r: &'a [u8],
    s: &'a [u8],
    body: &'a [u8],
    sections: Vec<Section>,
}

impl<'a> Oa2Certificate<'a> {
    /// Parse an OA2 certificate, checking every section length against the header.
    pub fn init(data: &'a [u8]) -> Ep11Result<Self> {
        let mut cursor = Cursor::new(data);
        let struct_id = cursor.u16("header")?;
        let version = cursor.u16("header")?;
        let total_length = cursor.u32("header")? as usize;
        let cert_index = cursor.u32("header")?;
        let metadata_length = cursor.u32("header")? as usize;
        let aux_length = cursor.u32("header")? as usize;
        let public_key_length = cursor.u32("header")? as usize;
        let signature_length = cursor.u32("header")? as usize;
        cursor.take(4, "header")?;

        if total_length != data.len() {
            return Err(Ep11Error::format(
                "header",
                format!(
                    "declared total length {total_length} but buffer holds {} bytes",
                    data.len()
                ),
            ));
        }
        if public_key_length != P521_PUBLIC_KEY_BYTES {
            return Err(Ep11Error::format(
                "public key",
                format!("length {public_key_length}, expected {P521_PUBLIC_KEY_BYTES}"),
            ));
        }
        if signature_length != OA2_SIGNATURE_SECTION_BYTES {
            return Err(Ep11Error::format(
                "signature",
                format!("length {signature_length}, expected {OA2_SIGNATURE_SECTION_BYTES}"),
            ));
        }
        let computed = [
            OA2_HEADER_BYTES,
            metadata_length,
            aux_length,
            2 * SKI_BYTES,
            public_key_length,
            signature_length,
        ]
        .iter()
        .try_fold(0usize, |acc, len| acc.checked_add(*len));
        if computed != Some(data.len()) {
            return Err(Ep11Error::format(
                "section lengths",
                format!(
                    "sections add up to {computed:?} bytes, buffer holds {}",
                    data.len()
                ),
            ));
        }

        let metadata = cursor.take(metadata_length, "metadata")?;
        let aux_data = cursor.take(aux_length, "aux data")?;
        let subject_ski = Ski::from_slice(cursor.take(SKI_BYTES, "subject key identifier")?)?;
        let signer_ski = Ski::from_slice(cursor.take(SKI_BYTES, "signer key identifier")?)?;
        let public_key = cursor.take(public_key_length, "public key")?;
        let body = &data[..cursor.position()];
        let signature_algorithm = cursor.u32("signature")?;
        let r = cursor.take(P521_COORDINATE_BYTES, "signature")?;
        let s = cursor.take(P521_COORDINATE_BYTES, "signature")?;
        let sections = cursor.finish("signature")?;

        if signature_algorithm != OA_SIG_ALG_ECDSA_P521_SHA512 {
            return Err(Ep11Error::format(
                "signature",
                format!("unsupported algorithm 0x{signature_algorithm:08x}"),
            ));
        }

        Ok(Self {
            struct_id,
            version,
            cert_index,
            metadata,
            aux_data,
            subject_ski,
            signer_ski,
            public_key,
            signature_algorithm,
            r,
            s,
            body,
            sections,
        })
    }
}

impl OaCertificate for Oa2Certificate<'_> {
    fn subject_ski(&self) -> Ski {
        self.subject_ski
    }

    fn signer_ski(&self) -> Ski {
        self.signer_ski
    }

    fn public_key(&self) -> &[u8] {
        self.public_key
    }

    fn ecc_body(&self) -> &[u8] {
        self.body
    }

    fn ecc_signature_r(&self) -> &[u8] {
        self.r
    }

    fn ecc_signature_s(&self) -> &[u8] {
        self.s
    }

    fn sections(&self) -> &[Section] {
        &self.sections
    }
}

impl fmt::Debug for Oa2Certificate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Oa2Certificate(index={}, subject={}, signer={}, metadata_len={}, aux_len={})",
            self.cert_index,
            self.subject_ski,
            self.signer_ski,
            self.metadata.len(),
            self.aux_data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(metadata: usize, aux: usize) -> Vec<u8> {
        let total = OA2_HEADER_BYTES + metadata + aux + 64 + 133 + 136;
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(&0x0002u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        for value in [total, 0, metadata, aux, 133, 136, 0] {
            out.extend_from_slice(&(value as u32).to_be_bytes());
        }
        out.extend(std::iter::repeat(0xaa).take(metadata));
        out.extend(std::iter::repeat(0xbb).take(aux));
        out.extend_from_slice(&[0x01; 32]);
        out.extend_from_slice(&[0x02; 32]);
        out.push(0x04);
        out.extend_from_slice(&[0x03; 132]);
        out.extend_from_slice(&1u32.to_be_bytes());
        out.extend_from_slice(&[0x05; 66]);
        out.extend_from_slice(&[0x06; 66]);
        out
    }

    #[test]
    fn test_parses_header_described_sections() {
        let data = build(10, 7);
        let cert = Oa2Certificate::init(&data).unwrap();
        assert_eq!(cert.metadata.len(), 10);
        assert_eq!(cert.aux_data.len(), 7);
        assert_eq!(cert.subject_ski(), Ski::new([1; 32]));
        assert_eq!(cert.signer_ski(), Ski::new([2; 32]));
        assert_eq!(cert.public_key_x(), &[0x03; 66][..]);
        assert_eq!(cert.ecc_body().len(), data.len() - 136);
        assert_eq!(cert.ecc_signature_s(), &[0x06; 66][..]);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let mut data = build(10, 0);
        data.push(0);
        let err = Oa2Certificate::init(&data).unwrap_err();
        assert!(err.to_string().contains("header"));

        // header claims more metadata than present
        let mut data = build(10, 0);
        data[12..16].copy_from_slice(&11u32.to_be_bytes());
        let err = Oa2Certificate::init(&data).unwrap_err();
        assert!(err.to_string().contains("section lengths"));
    }

    #[test]
    fn test_rejects_truncated_header() {
        assert!(Oa2Certificate::init(&[0u8; 20]).is_err());
    }
}
