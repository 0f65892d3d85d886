//! SignerInfo codec for administrator and HSM signatures.
//!
//! Wire layout of one block:
//!
//! ```text
//! SEQUENCE {
//!   INTEGER 3,
//!   [0] IMPLICIT OCTET STRING ski,          -- tag 0x80
//!   SEQUENCE { OID digestAlgorithm },
//!   SEQUENCE { OID signatureAlgorithm },
//!   OCTET STRING signature
//! }
//! ```
//!
//! For ECDSA the signature octets hold `SEQUENCE { INTEGER r, INTEGER s }`.
//! Several blocks may be concatenated; the HSM signs its responses with an
//! ECC key and, on newer firmware, additionally with Dilithium.

use std::fmt;

use crate::domain::asn1;
use crate::domain::constants::{
    ASN1_CONTEXT_0_PRIMITIVE_TAG, ECDSA_WITH_SHA512_OID, P521_COORDINATE_BYTES,
    SHA256_ALGORITHM_OID, SHA256_WITH_RSA_OID, SHA512_ALGORITHM_OID, SIGNER_INFO_VERSION,
};
use crate::domain::types::Ski;
use crate::infra::error::{Ep11Error, Ep11Result};

/// RSA-2048 PKCS#1 v1.5 signature length
pub const RSA2048_SIGNATURE_BYTES: usize = 256;

/// Where an administrator signature key lives and how to unlock it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRef {
    /// Key file path, or key name on a remote signing service
    pub location: String,
    pub ski: Ski,
    /// Password or access token for the key
    pub token: Option<String>,
}

/// Administrator signature key, resolved once when configuration loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureKey {
    Rsa2048(KeyRef),
    P521Ec(KeyRef),
}

impl SignatureKey {
    #[must_use]
    pub fn key_ref(&self) -> &KeyRef {
        match self {
            SignatureKey::Rsa2048(key) | SignatureKey::P521Ec(key) => key,
        }
    }
}

/// The per-algorithm parts of a SignerInfo.
pub trait SignerInfoFields {
    fn digest_algorithm(&self) -> &'static [u8];
    fn signature_algorithm(&self) -> &'static [u8];
    fn ski(&self) -> &Ski;

    /// Combine the fixed fields with a raw signature from the signing primitive.
    fn signer_info_fields(&self, signature: &[u8]) -> Ep11Result<SignerInfo>;
}

impl SignerInfoFields for SignatureKey {
    fn digest_algorithm(&self) -> &'static [u8] {
        match self {
            SignatureKey::Rsa2048(_) => SHA256_ALGORITHM_OID,
            SignatureKey::P521Ec(_) => SHA512_ALGORITHM_OID,
        }
    }

    fn signature_algorithm(&self) -> &'static [u8] {
        match self {
            SignatureKey::Rsa2048(_) => SHA256_WITH_RSA_OID,
            SignatureKey::P521Ec(_) => ECDSA_WITH_SHA512_OID,
        }
    }

    fn ski(&self) -> &Ski {
        &self.key_ref().ski
    }

    fn signer_info_fields(&self, signature: &[u8]) -> Ep11Result<SignerInfo> {
        match self {
            SignatureKey::Rsa2048(key) => create_2048_rsa_signer_info_fields(key.ski, signature),
            SignatureKey::P521Ec(key) => create_p521_ec_signer_info_fields(key.ski, signature),
        }
    }
}

/// One parsed or to-be-encoded SignerInfo.
#[derive(Clone, PartialEq, Eq)]
pub struct SignerInfo {
    pub version: u32,
    pub ski: Ski,
    pub digest_algorithm: Vec<u8>,
    pub signature_algorithm: Vec<u8>,
    pub signature: Vec<u8>,
    /// ECDSA R, left-padded to 66 bytes (ECC signer infos only)
    pub r: Option<Vec<u8>>,
    /// ECDSA S, left-padded to 66 bytes (ECC signer infos only)
    pub s: Option<Vec<u8>>,
}

/// SignerInfo fields for a P-521 EC key; `signature` is a DER Ecdsa-Sig-Value.
pub fn create_p521_ec_signer_info_fields(ski: Ski, signature: &[u8]) -> Ep11Result<SignerInfo> {
    let (r, s) = decompose_ecdsa_signature(signature)?;
    Ok(SignerInfo {
        version: SIGNER_INFO_VERSION,
        ski,
        digest_algorithm: SHA512_ALGORITHM_OID.to_vec(),
        signature_algorithm: ECDSA_WITH_SHA512_OID.to_vec(),
        signature: signature.to_vec(),
        r: Some(r),
        s: Some(s),
    })
}

/// SignerInfo fields for an RSA-2048 key; `signature` is a raw PKCS#1 v1.5 signature.
pub fn create_2048_rsa_signer_info_fields(ski: Ski, signature: &[u8]) -> Ep11Result<SignerInfo> {
    if signature.len() != RSA2048_SIGNATURE_BYTES {
        return Err(Ep11Error::LengthMismatch {
            field: "RSA-2048 signature",
            expected: RSA2048_SIGNATURE_BYTES,
            actual: signature.len(),
        });
    }
    Ok(SignerInfo {
        version: SIGNER_INFO_VERSION,
        ski,
        digest_algorithm: SHA256_ALGORITHM_OID.to_vec(),
        signature_algorithm: SHA256_WITH_RSA_OID.to_vec(),
        signature: signature.to_vec(),
        r: None,
        s: None,
    })
}

/// Split a DER `SEQUENCE { INTEGER r, INTEGER s }` into 66-byte halves.
pub fn decompose_ecdsa_signature(der: &[u8]) -> Ep11Result<(Vec<u8>, Vec<u8>)> {
    let (body, end) = asn1::decode_sequence(der, 0)?;
    if end != der.len() {
        return Err(Ep11Error::Asn1Error(
            "trailing bytes after ECDSA signature".to_string(),
        ));
    }
    let (r, offset) = asn1::decode_integer(body, 0)?;
    let (s, offset) = asn1::decode_integer(body, offset)?;
    if offset != body.len() {
        return Err(Ep11Error::Asn1Error(
            "unexpected fields in ECDSA signature".to_string(),
        ));
    }
    if r[0] & 0x80 != 0 || s[0] & 0x80 != 0 {
        return Err(Ep11Error::Asn1Error(
            "negative ECDSA signature component".to_string(),
        ));
    }
    Ok((
        asn1::left_pad(r, P521_COORDINATE_BYTES)?,
        asn1::left_pad(s, P521_COORDINATE_BYTES)?,
    ))
}

/// Encode 66-byte R and S halves as a DER Ecdsa-Sig-Value.
#[must_use]
pub fn compose_ecdsa_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    asn1::encode_sequence(&[&asn1::encode_integer(r), &asn1::encode_integer(s)])
}

impl SignerInfo {
    #[must_use]
    pub fn is_ecc(&self) -> bool {
        self.signature_algorithm == ECDSA_WITH_SHA512_OID
    }

    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        let mut ski = asn1::encode_octet_string(self.ski.as_bytes());
        ski[0] = ASN1_CONTEXT_0_PRIMITIVE_TAG;
        asn1::encode_sequence(&[
            &asn1::encode_small_integer(self.version),
            &ski,
            &asn1::encode_sequence(&[&asn1::encode_oid(&self.digest_algorithm)]),
            &asn1::encode_sequence(&[&asn1::encode_oid(&self.signature_algorithm)]),
            &asn1::encode_octet_string(&self.signature),
        ])
    }
}

impl fmt::Debug for SignerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignerInfo(version={}, ski={}, ecc={}, sig_len={})",
            self.version,
            self.ski,
            self.is_ecc(),
            self.signature.len()
        )
    }
}

/// Raw fields of one SignerInfo before algorithm-specific checks.
struct RawSignerInfo<'a> {
    version: u32,
    sid: &'a [u8],
    digest_algorithm: &'a [u8],
    signature_algorithm: &'a [u8],
    signature: &'a [u8],
}

fn decode_algorithm_identifier(buf: &[u8], offset: usize) -> Ep11Result<(&[u8], usize)> {
    let (body, next) = asn1::decode_sequence(buf, offset)?;
    let (oid, oid_end) = asn1::decode_oid(body, 0)?;
    // Parameters, when present, are skipped but must still be framed correctly.
    let mut cursor = oid_end;
    while cursor < body.len() {
        cursor = asn1::skip_tlv(body, cursor)?;
    }
    Ok((oid, next))
}

fn decode_raw_signer_info(buf: &[u8], offset: usize) -> Ep11Result<(RawSignerInfo<'_>, usize)> {
    let (body, next) = asn1::decode_sequence(buf, offset)?;
    let (version, pos) = asn1::decode_small_integer(body, 0)?;
    let (sid, pos) = asn1::decode_tlv(body, pos, ASN1_CONTEXT_0_PRIMITIVE_TAG)?;
    let (digest_algorithm, pos) = decode_algorithm_identifier(body, pos)?;
    let (signature_algorithm, pos) = decode_algorithm_identifier(body, pos)?;
    let (signature, pos) = asn1::decode_octet_string(body, pos)?;
    if pos != body.len() {
        return Err(Ep11Error::Asn1Error(format!(
            "{} unexpected bytes at the end of SignerInfo",
            body.len() - pos
        )));
    }
    Ok((
        RawSignerInfo {
            version,
            sid,
            digest_algorithm,
            signature_algorithm,
            signature,
        },
        next,
    ))
}

/// Parse every SignerInfo in a concatenated buffer, without decomposing signatures.
pub fn parse_signer_infos(buf: &[u8]) -> Ep11Result<Vec<SignerInfo>> {
    let mut infos = Vec::new();
    let mut offset = 0;
    while offset < buf.len() {
        let (raw, next) = decode_raw_signer_info(buf, offset)?;
        infos.push(SignerInfo {
            version: raw.version,
            ski: Ski::from_slice(raw.sid)?,
            digest_algorithm: raw.digest_algorithm.to_vec(),
            signature_algorithm: raw.signature_algorithm.to_vec(),
            signature: raw.signature.to_vec(),
            r: None,
            s: None,
        });
        offset = next;
    }
    Ok(infos)
}

/// Find the ECDSA-with-SHA512 SignerInfo in a concatenated buffer.
///
/// Non-ECC blocks (Dilithium) are skipped after their framing is validated.
/// The ECC block must be version 3 with a 32-byte SKI; its signature is
/// decomposed into R and S.
pub fn get_ecc_signer_info(buf: &[u8]) -> Ep11Result<SignerInfo> {
    let mut offset = 0;
    while offset < buf.len() {
        let (raw, next) = decode_raw_signer_info(buf, offset)?;
        if raw.signature_algorithm != ECDSA_WITH_SHA512_OID {
            log::debug!(
                "Skipping non-ECC SignerInfo at offset {offset} (algorithm {})",
                hex::encode(raw.signature_algorithm)
            );
            offset = next;
            continue;
        }
        if raw.version != SIGNER_INFO_VERSION {
            return Err(Ep11Error::Asn1Error(format!(
                "ECC SignerInfo version {} (expected {SIGNER_INFO_VERSION})",
                raw.version
            )));
        }
        if raw.digest_algorithm != SHA512_ALGORITHM_OID {
            return Err(Ep11Error::Asn1Error(
                "ECC SignerInfo digest algorithm is not SHA-512".to_string(),
            ));
        }
        let (r, s) = decompose_ecdsa_signature(raw.signature)?;
        return Ok(SignerInfo {
            version: raw.version,
            ski: Ski::from_slice(raw.sid)?,
            digest_algorithm: raw.digest_algorithm.to_vec(),
            signature_algorithm: raw.signature_algorithm.to_vec(),
            signature: raw.signature.to_vec(),
            r: Some(r),
            s: Some(s),
        });
    }
    Err(Ep11Error::Asn1Error(
        "no ECC SignerInfo found in response".to_string(),
    ))
}
