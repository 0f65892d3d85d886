//! OA certificate chain verification.
//!
//! Starting from a device certificate at some chain index, the parent is
//! always the certificate at `index + 1`. Each link is checked with ECDSA
//! P-521 over the SHA-512 digest of the child's signed body. When the HSM
//! reports the parent as not found, the child must have been signed by the
//! trust anchor.

use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::ecdsa::EcdsaSig;
use openssl::nid::Nid;
use sha2::{Digest, Sha512};

use crate::domain::constants::{EC_POINT_UNCOMPRESSED, P521_COORDINATE_BYTES, P521_PUBLIC_KEY_BYTES};
use crate::domain::oa::{
    Oa2Certificate, Oa2Format, Oa3Certificate, Oa3Format, OaCertificate, OaFormat,
};
use crate::domain::types::Ski;
use crate::infra::error::{Ep11Error, Ep11Result};

/// Longest chain walked before giving up.
pub const MAX_CHAIN_DEPTH: u32 = 16;

/// Fetches the raw OA certificate at a chain index.
///
/// A missing certificate must be reported as
/// [`Ep11Error::Hsm`] with return code 96 / reason code 60.
pub trait CertificateSource {
    fn query_device_certificate(&self, index: u32) -> Ep11Result<Vec<u8>>;
}

/// Root public key that terminates every OA chain.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    ski: Ski,
    public_key: Vec<u8>,
}

impl TrustAnchor {
    pub fn new(ski: Ski, public_key: Vec<u8>) -> Ep11Result<Self> {
        if public_key.len() != P521_PUBLIC_KEY_BYTES {
            return Err(Ep11Error::LengthMismatch {
                field: "root public key",
                expected: P521_PUBLIC_KEY_BYTES,
                actual: public_key.len(),
            });
        }
        if public_key[0] != EC_POINT_UNCOMPRESSED {
            return Err(Ep11Error::InvalidInput(
                "root public key must be an uncompressed P-521 point".to_string(),
            ));
        }
        Ok(Self { ski, public_key })
    }

    pub fn from_hex(ski: &str, public_key: &str) -> Ep11Result<Self> {
        Self::new(Ski::from_hex(ski)?, hex::decode(public_key.trim())?)
    }

    #[must_use]
    pub fn ski(&self) -> Ski {
        self.ski
    }

    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    fn x(&self) -> &[u8] {
        &self.public_key[1..1 + P521_COORDINATE_BYTES]
    }

    fn y(&self) -> &[u8] {
        &self.public_key[1 + P521_COORDINATE_BYTES..]
    }
}

impl std::fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TrustAnchor(ski={})", self.ski)
    }
}

/// Verify an ECDSA P-521 signature over a precomputed digest.
pub fn verify_ecdsa_p521(x: &[u8], y: &[u8], digest: &[u8], r: &[u8], s: &[u8]) -> Ep11Result<bool> {
    let group = EcGroup::from_curve_name(Nid::SECP521R1)?;
    let (x, y) = (BigNum::from_slice(x)?, BigNum::from_slice(y)?);
    let key = EcKey::from_public_key_affine_coordinates(&group, &x, &y)
        .map_err(|e| Ep11Error::CryptographicError(format!("invalid P-521 public key: {e}")))?;
    let signature = EcdsaSig::from_private_components(BigNum::from_slice(r)?, BigNum::from_slice(s)?)?;
    Ok(signature.verify(digest, &key)?)
}

fn verify_link(index: u32, cert: &dyn OaCertificate, x: &[u8], y: &[u8]) -> Ep11Result<()> {
    let digest = Sha512::digest(cert.ecc_body());
    let valid = verify_ecdsa_p521(
        x,
        y,
        &digest,
        cert.ecc_signature_r(),
        cert.ecc_signature_s(),
    )?;
    if !valid {
        log::warn!("Signature check failed for certificate at index {index}");
        return Err(Ep11Error::SignatureVerification { index });
    }
    Ok(())
}

/// Verify an OA3 certificate and every ancestor up to the trust anchor.
pub fn verify_oa3_certificate<S: CertificateSource + ?Sized>(
    source: &S,
    anchor: &TrustAnchor,
    index: u32,
    cert: &Oa3Certificate<'_>,
) -> Ep11Result<()> {
    verify_oa_certificate_chain::<Oa3Format, S>(source, anchor, index, cert)
}

/// Verify an OA2 certificate and every ancestor up to the trust anchor.
pub fn verify_oa2_certificate<S: CertificateSource + ?Sized>(
    source: &S,
    anchor: &TrustAnchor,
    index: u32,
    cert: &Oa2Certificate<'_>,
) -> Ep11Result<()> {
    verify_oa_certificate_chain::<Oa2Format, S>(source, anchor, index, cert)
}

/// Walk the chain above `cert`, parsing parents with format `F`.
pub fn verify_oa_certificate_chain<F: OaFormat, S: CertificateSource + ?Sized>(
    source: &S,
    anchor: &TrustAnchor,
    index: u32,
    cert: &dyn OaCertificate,
) -> Ep11Result<()> {
    log::info!("Verifying {} certificate chain from index {index}", F::NAME);
    walk::<F, S>(source, anchor, index, cert, 0)
}

fn walk<F: OaFormat, S: CertificateSource + ?Sized>(
    source: &S,
    anchor: &TrustAnchor,
    index: u32,
    cert: &dyn OaCertificate,
    depth: u32,
) -> Ep11Result<()> {
    if depth >= MAX_CHAIN_DEPTH {
        return Err(Ep11Error::InvalidInput(format!(
            "certificate chain exceeds {MAX_CHAIN_DEPTH} links"
        )));
    }

    let signer = cert.signer_ski();
    if cert.subject_ski() == signer {
        log::warn!("Certificate at index {index} is self-signed");
        return Err(Ep11Error::SelfSignedCertificate { index });
    }

    let parent_index = index
        .checked_add(1)
        .ok_or_else(|| Ep11Error::InvalidInput("certificate index overflow".to_string()))?;

    match source.query_device_certificate(parent_index) {
        Ok(raw) => {
            let parent = F::parse(&raw)?;
            if parent.subject_ski() != signer {
                return Err(Ep11Error::WrongParentCertificate {
                    index: parent_index,
                    expected: signer.to_hex(),
                    found: parent.subject_ski().to_hex(),
                });
            }
            verify_link(index, cert, parent.public_key_x(), parent.public_key_y())?;
            log::debug!("Certificate {index} verified against parent {parent_index}");
            walk::<F, S>(source, anchor, parent_index, &parent, depth + 1)
        }
        Err(e) if e.is_not_found() => {
            if signer != anchor.ski() {
                return Err(Ep11Error::UnrecognizedRootKey(signer.to_hex()));
            }
            verify_link(index, cert, anchor.x(), anchor.y())?;
            log::info!("Certificate {index} verified against the root key");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
