//! Outbound authentication (OA) device certificates.
//!
//! Two hardware generations return two incompatible fixed-offset layouts:
//! - OA2, CEX6-class: header-described section lengths, single ECC signature
//! - OA3, CEX8-class: fixed total length, ECC plus Dilithium signer info
//!
//! Both parse into views over the caller's buffer and expose the same
//! [`OaCertificate`] capability, which is all the chain verifier needs.

mod cursor;
mod oa2;
mod oa3;

pub use cursor::{Cursor, Section};
pub use oa2::{Oa2Certificate, OA2_HEADER_BYTES, OA2_SIGNATURE_SECTION_BYTES};
pub use oa3::{
    Oa3Certificate, Oa3Variant, OA3_DILITHIUM_PUBLIC_KEY_BYTES, OA3_DILITHIUM_SIGNATURE_BYTES,
    OA3_HEADER_BYTES, OA3_METADATA_BYTES, OA3_MINIBOOT_LENGTH, OA3_SEGMENT3_AUX_BYTES,
    OA3_SEGMENT3_LENGTH,
};

use crate::domain::constants::P521_COORDINATE_BYTES;
use crate::domain::types::Ski;
use crate::infra::error::Ep11Result;

/// What the chain verifier reads from a parsed OA certificate.
pub trait OaCertificate {
    /// Key identifier of the certified (subject) key.
    fn subject_ski(&self) -> Ski;

    /// Key identifier of the ECC key that signed this certificate.
    fn signer_ski(&self) -> Ski;

    /// Subject P-521 public key as an uncompressed point (133 bytes).
    fn public_key(&self) -> &[u8];

    fn public_key_x(&self) -> &[u8] {
        &self.public_key()[1..1 + P521_COORDINATE_BYTES]
    }

    fn public_key_y(&self) -> &[u8] {
        &self.public_key()[1 + P521_COORDINATE_BYTES..]
    }

    /// Exact byte range covered by the ECC signature.
    fn ecc_body(&self) -> &[u8];

    fn ecc_signature_r(&self) -> &[u8];

    fn ecc_signature_s(&self) -> &[u8];

    /// Named sections in buffer order.
    fn sections(&self) -> &[Section];
}

/// A certificate layout that can be parsed from raw bytes.
pub trait OaFormat {
    const NAME: &'static str;

    type Certificate<'a>: OaCertificate;

    fn parse(data: &[u8]) -> Ep11Result<Self::Certificate<'_>>;
}

/// CEX6-class layout marker.
pub struct Oa2Format;

/// CEX8-class layout marker.
pub struct Oa3Format;

impl OaFormat for Oa2Format {
    const NAME: &'static str = "OA2";
    type Certificate<'a> = Oa2Certificate<'a>;

    fn parse(data: &[u8]) -> Ep11Result<Oa2Certificate<'_>> {
        Oa2Certificate::init(data)
    }
}

impl OaFormat for Oa3Format {
    const NAME: &'static str = "OA3";
    type Certificate<'a> = Oa3Certificate<'a>;

    fn parse(data: &[u8]) -> Ep11Result<Oa3Certificate<'_>> {
        Oa3Certificate::init(data)
    }
}

/// Either certificate generation, picked by total length.
pub enum AnyOaCertificate<'a> {
    Oa2(Oa2Certificate<'a>),
    Oa3(Oa3Certificate<'a>),
}

impl<'a> AnyOaCertificate<'a> {
    /// OA3 certificates have one of two exact lengths; everything else is tried as OA2.
    pub fn parse(data: &'a [u8]) -> Ep11Result<Self> {
        if data.len() == OA3_MINIBOOT_LENGTH || data.len() == OA3_SEGMENT3_LENGTH {
            Ok(Self::Oa3(Oa3Certificate::init(data)?))
        } else {
            Ok(Self::Oa2(Oa2Certificate::init(data)?))
        }
    }

    #[must_use]
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Oa2(_) => Oa2Format::NAME,
            Self::Oa3(_) => Oa3Format::NAME,
        }
    }

    #[must_use]
    pub fn as_certificate(&self) -> &dyn OaCertificate {
        match self {
            Self::Oa2(cert) => cert,
            Self::Oa3(cert) => cert,
        }
    }
}
