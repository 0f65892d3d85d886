//! OA3 certificate layout (CEX8).
//!
//! Two sub-variants exist and are told apart only by total length: a
//! certificate issued by miniboot is 7810 bytes, one issued by segment 3
//! carries an extra 163-byte aux section and is 7973 bytes. Any other length
//! is rejected.
//!
//! ```text
//! header                      16   u16 struct id | u16 version | u32 total length
//!                                  | u32 cert index | u32 flags
//! metadata                   238
//! aux data                   163   (segment-3 only)
//! subject SKI                 32
//! subject ECC public key     133
//! subject Dilithium key     2592
//! signer ECC SKI              32
//! signer Dilithium SKI        32
//! ECC signer info            136   u32 algorithm | R (66) | S (66)
//! Dilithium signer info     4599   u32 algorithm | signature (4595)
//! ```
//!
//! The ECC signature covers every byte before the ECC signer info; the
//! Dilithium signature covers every byte before the Dilithium signer info.

use std::fmt;

use super::cursor::{Cursor, Section};
use super::OaCertificate;
use crate::domain::constants::{
    OA_SIG_ALG_DILITHIUM, OA_SIG_ALG_ECDSA_P521_SHA512, P521_COORDINATE_BYTES,
    P521_PUBLIC_KEY_BYTES, SKI_BYTES,
};
use crate::domain::types::Ski;
use crate::infra::error::{Ep11Error, Ep11Result};

pub const OA3_MINIBOOT_LENGTH: usize = 7810;
pub const OA3_SEGMENT3_LENGTH: usize = 7973;
pub const OA3_HEADER_BYTES: usize = 16;
pub const OA3_METADATA_BYTES: usize = 238;
pub const OA3_SEGMENT3_AUX_BYTES: usize = 163;
pub const OA3_DILITHIUM_PUBLIC_KEY_BYTES: usize = 2592;
pub const OA3_DILITHIUM_SIGNATURE_BYTES: usize = 4595;

/// Which firmware layer issued the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oa3Variant {
    Miniboot,
    Segment3,
}

pub struct Oa3Certificate<'a> {
    pub variant: Oa3Variant,
    pub struct_id: u16,
    pub version: u16,
    pub cert_index: u32,
    pub flags: u32,
    pub metadata: &'a [u8],
    /// Empty for miniboot-issued certificates
    pub aux_data: &'a [u8],
    subject_ski: Ski,
    subject_ecc_public_key: &'a [u8],
    pub subject_dilithium_public_key: &'a [u8],
    signer_ecc_ski: Ski,
    pub signer_dilithium_ski: Ski,
    ecc_r: &'a [u8],
    ecc_s: &'a [u8],
    pub dilithium_signature: &'a [u8],
    /// Copy of the bytes signed by the ECC key
    pub ecc_body: Vec<u8>,
    /// Copy of the bytes signed by the Dilithium key
    pub dilithium_body: Vec<u8>,
    sections: Vec<Section>,
}

impl<'a> Oa3Certificate<'a> {
    pub fn init(data: &'a [u8]) -> Ep11Result<Self> {
        let variant = match data.len() {
            OA3_MINIBOOT_LENGTH => Oa3Variant::Miniboot,
            OA3_SEGMENT3_LENGTH => Oa3Variant::Segment3,
            other => {
                return Err(Ep11Error::format(
                    "total length",
                    format!(
                        "{other} bytes, expected {OA3_MINIBOOT_LENGTH} (miniboot) or {OA3_SEGMENT3_LENGTH} (segment 3)"
                    ),
                ))
            }
        };

        let mut cursor = Cursor::new(data);
        let struct_id = cursor.u16("header")?;
        let version = cursor.u16("header")?;
        let total_length = cursor.u32("header")? as usize;
        let cert_index = cursor.u32("header")?;
        let flags = cursor.u32("header")?;
        if total_length != data.len() {
            return Err(Ep11Error::format(
                "header",
                format!(
                    "declared total length {total_length} but buffer holds {} bytes",
                    data.len()
                ),
            ));
        }

        let metadata = cursor.take(OA3_METADATA_BYTES, "metadata")?;
        let aux_data = match variant {
            Oa3Variant::Miniboot => &data[cursor.position()..cursor.position()],
            Oa3Variant::Segment3 => cursor.take(OA3_SEGMENT3_AUX_BYTES, "aux data")?,
        };
        let subject_ski = Ski::from_slice(cursor.take(SKI_BYTES, "subject key identifier")?)?;
        let subject_ecc_public_key = cursor.take(P521_PUBLIC_KEY_BYTES, "subject ECC public key")?;
        let subject_dilithium_public_key =
            cursor.take(OA3_DILITHIUM_PUBLIC_KEY_BYTES, "subject Dilithium public key")?;
        let signer_ecc_ski = Ski::from_slice(cursor.take(SKI_BYTES, "signer ECC key identifier")?)?;
        let signer_dilithium_ski =
            Ski::from_slice(cursor.take(SKI_BYTES, "signer Dilithium key identifier")?)?;

        let ecc_body = data[..cursor.position()].to_vec();
        let ecc_algorithm = cursor.u32("ECC signer info")?;
        let ecc_r = cursor.take(P521_COORDINATE_BYTES, "ECC signer info")?;
        let ecc_s = cursor.take(P521_COORDINATE_BYTES, "ECC signer info")?;

        let dilithium_body = data[..cursor.position()].to_vec();
        let dilithium_algorithm = cursor.u32("Dilithium signer info")?;
        let dilithium_signature =
            cursor.take(OA3_DILITHIUM_SIGNATURE_BYTES, "Dilithium signer info")?;
        let sections = cursor.finish("Dilithium signer info")?;

        if ecc_algorithm != OA_SIG_ALG_ECDSA_P521_SHA512 {
            return Err(Ep11Error::format(
                "ECC signer info",
                format!("unsupported algorithm 0x{ecc_algorithm:08x}"),
            ));
        }
        if dilithium_algorithm != OA_SIG_ALG_DILITHIUM {
            return Err(Ep11Error::format(
                "Dilithium signer info",
                format!("unsupported algorithm 0x{dilithium_algorithm:08x}"),
            ));
        }

        log::debug!(
            "Parsed OA3 certificate index {cert_index} ({variant:?}, {} bytes)",
            data.len()
        );
        Ok(Self {
            variant,
            struct_id,
            version,
            cert_index,
            flags,
            metadata,
            aux_data,
            subject_ski,
            subject_ecc_public_key,
            subject_dilithium_public_key,
            signer_ecc_ski,
            signer_dilithium_ski,
            ecc_r,
            ecc_s,
            dilithium_signature,
            ecc_body,
            dilithium_body,
            sections,
        })
    }
}

impl OaCertificate for Oa3Certificate<'_> {
    fn subject_ski(&self) -> Ski {
        self.subject_ski
    }

    fn signer_ski(&self) -> Ski {
        self.signer_ecc_ski
    }

    fn public_key(&self) -> &[u8] {
        self.subject_ecc_public_key
    }

    fn ecc_body(&self) -> &[u8] {
        &self.ecc_body
    }

    fn ecc_signature_r(&self) -> &[u8] {
        self.ecc_r
    }

    fn ecc_signature_s(&self) -> &[u8] {
        self.ecc_s
    }

    fn sections(&self) -> &[Section] {
        &self.sections
    }
}

impl fmt::Debug for Oa3Certificate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Oa3Certificate({:?}, index={}, subject={}, signer={})",
            self.variant, self.cert_index, self.subject_ski, self.signer_ecc_ski
        )
    }
}
