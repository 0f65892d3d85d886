//! Shared fixtures for integration tests.
//!
//! P-521 keys come from OpenSSL; OA certificates are assembled byte by byte
//! and signed the way a crypto module signs them (SHA-512 over the ECC body,
//! R and S left-padded to 66 bytes).

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use ep11_tke::domain::constants::{HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND};
use ep11_tke::domain::oa::{
    OA3_DILITHIUM_PUBLIC_KEY_BYTES, OA3_DILITHIUM_SIGNATURE_BYTES, OA3_METADATA_BYTES,
    OA3_MINIBOOT_LENGTH, OA3_SEGMENT3_AUX_BYTES, OA3_SEGMENT3_LENGTH,
};
use ep11_tke::{CertificateSource, Ep11Error, Ep11Result, Ski, TrustAnchor};
use openssl::bn::BigNumContext;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::ecdsa::EcdsaSig;
use openssl::nid::Nid;
use openssl::pkey::Private;
use sha2::{Digest, Sha512};

pub fn p521_key() -> EcKey<Private> {
    let group = EcGroup::from_curve_name(Nid::SECP521R1).unwrap();
    EcKey::generate(&group).unwrap()
}

/// 133-byte uncompressed public point.
pub fn public_point(key: &EcKey<Private>) -> Vec<u8> {
    let mut ctx = BigNumContext::new().unwrap();
    key.public_key()
        .to_bytes(key.group(), PointConversionForm::UNCOMPRESSED, &mut ctx)
        .unwrap()
}

pub fn ski(tag: u8) -> Ski {
    Ski::new([tag; 32])
}

/// SHA-512 + ECDSA over `body`, returned as 66-byte R and S.
pub fn sign_body(key: &EcKey<Private>, body: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let digest = Sha512::digest(body);
    let sig = EcdsaSig::sign(&digest, key).unwrap();
    (
        sig.r().to_vec_padded(66).unwrap(),
        sig.s().to_vec_padded(66).unwrap(),
    )
}

pub fn anchor_for(tag: u8, key: &EcKey<Private>) -> TrustAnchor {
    TrustAnchor::new(ski(tag), public_point(key)).unwrap()
}

/// Subject and signer of one certificate.
pub struct Link<'a> {
    pub index: u32,
    pub subject: Ski,
    pub subject_key: &'a EcKey<Private>,
    pub signer: Ski,
    pub signer_key: &'a EcKey<Private>,
}

/// Assemble a signed OA3 certificate (miniboot or segment-3 variant).
pub fn build_oa3(link: &Link<'_>, segment3: bool) -> Vec<u8> {
    let total = if segment3 {
        OA3_SEGMENT3_LENGTH
    } else {
        OA3_MINIBOOT_LENGTH
    };
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&0x0003u16.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&link.index.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend(std::iter::repeat(0x4d).take(OA3_METADATA_BYTES));
    if segment3 {
        out.extend(std::iter::repeat(0xa5).take(OA3_SEGMENT3_AUX_BYTES));
    }
    out.extend_from_slice(link.subject.as_bytes());
    out.extend_from_slice(&public_point(link.subject_key));
    out.extend(std::iter::repeat(0xd1).take(OA3_DILITHIUM_PUBLIC_KEY_BYTES));
    out.extend_from_slice(link.signer.as_bytes());
    out.extend_from_slice(&[0xee; 32]);

    let (r, s) = sign_body(link.signer_key, &out);
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out.extend_from_slice(&2u32.to_be_bytes());
    out.extend(std::iter::repeat(0xd2).take(OA3_DILITHIUM_SIGNATURE_BYTES));
    assert_eq!(out.len(), total);
    out
}

/// Assemble a signed OA2 certificate with small metadata and aux sections.
pub fn build_oa2(link: &Link<'_>) -> Vec<u8> {
    let (metadata, aux) = (24usize, 8usize);
    let total = 32 + metadata + aux + 64 + 133 + 136;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&0x0002u16.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    for value in [total as u32, link.index, metadata as u32, aux as u32, 133, 136, 0] {
        out.extend_from_slice(&value.to_be_bytes());
    }
    out.extend(std::iter::repeat(0x4d).take(metadata));
    out.extend(std::iter::repeat(0xa5).take(aux));
    out.extend_from_slice(link.subject.as_bytes());
    out.extend_from_slice(link.signer.as_bytes());
    out.extend_from_slice(&public_point(link.subject_key));

    let (r, s) = sign_body(link.signer_key, &out);
    out.extend_from_slice(&1u32.to_be_bytes());
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    assert_eq!(out.len(), total);
    out
}

/// In-memory certificate store; absent indices answer "not found".
#[derive(Default)]
pub struct MapSource {
    pub certs: HashMap<u32, Vec<u8>>,
    pub fetched: RefCell<Vec<u32>>,
}

impl MapSource {
    pub fn with(certs: impl IntoIterator<Item = (u32, Vec<u8>)>) -> Self {
        Self {
            certs: certs.into_iter().collect(),
            fetched: RefCell::new(Vec::new()),
        }
    }
}

impl CertificateSource for MapSource {
    fn query_device_certificate(&self, index: u32) -> Ep11Result<Vec<u8>> {
        self.fetched.borrow_mut().push(index);
        self.certs
            .get(&index)
            .cloned()
            .ok_or_else(|| Ep11Error::hsm(HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND))
    }
}

/// Source whose transport is down.
pub struct FailingSource;

impl CertificateSource for FailingSource {
    fn query_device_certificate(&self, _index: u32) -> Ep11Result<Vec<u8>> {
        Err(Ep11Error::Transport("connection refused".to_string()))
    }
}
