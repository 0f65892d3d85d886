//! Signed admin request assembly.
//!
//! An administrative command travels as
//! `SEQUENCE { AdminBlk, SignerInfo, SignerInfo, ... }` with one SignerInfo
//! per administrator signature key, in configuration order. Queries carry no
//! signatures.

use crate::domain::admin_blk::AdminBlk;
use crate::domain::asn1;
use crate::domain::signer_info::{parse_signer_infos, SignatureKey, SignerInfo, SignerInfoFields};
use crate::infra::error::{Ep11Error, Ep11Result};

/// Produces raw signatures with an administrator key.
///
/// P-521 EC keys return a DER `Ecdsa-Sig-Value` over the SHA-512 digest of
/// `data`; RSA-2048 keys return a PKCS#1 v1.5 signature over SHA-256.
pub trait SignatureProvider {
    fn sign(&self, key: &SignatureKey, data: &[u8]) -> Ep11Result<Vec<u8>>;
}

impl<P: SignatureProvider + ?Sized> SignatureProvider for &P {
    fn sign(&self, key: &SignatureKey, data: &[u8]) -> Ep11Result<Vec<u8>> {
        (**self).sign(key, data)
    }
}

/// Sign `payload` with every key and concatenate the SignerInfos in key order.
pub fn create_signer_info<P: SignatureProvider + ?Sized>(
    payload: &[u8],
    keys: &[SignatureKey],
    provider: &P,
) -> Ep11Result<Vec<u8>> {
    if keys.is_empty() {
        return Err(Ep11Error::InvalidInput(
            "at least one signature key is required".to_string(),
        ));
    }

    let mut out = Vec::new();
    for key in keys {
        let signature = provider.sign(key, payload).map_err(|e| match e {
            Ep11Error::Signing(_) => e,
            other => Ep11Error::Signing(format!(
                "signing with key {} failed: {other}",
                key.key_ref().ski
            )),
        })?;
        let info = key.signer_info_fields(&signature)?;
        log::debug!("Created {info:?}");
        out.extend_from_slice(&info.to_der());
    }
    Ok(out)
}

/// Build the request body for a signed administrative command.
pub fn build_signed_admin_request<P: SignatureProvider + ?Sized>(
    blk: &AdminBlk,
    keys: &[SignatureKey],
    provider: &P,
) -> Ep11Result<Vec<u8>> {
    let blk_der = blk.to_der();
    let signer_infos = create_signer_info(&blk_der, keys, provider)?;
    log::info!(
        "Signed {} with {} administrator key(s)",
        blk.cmd_id,
        keys.len()
    );
    Ok(asn1::encode_sequence(&[&blk_der, &signer_infos]))
}

/// Build the request body for an unsigned admin query.
#[must_use]
pub fn build_query_request(blk: &AdminBlk) -> Vec<u8> {
    asn1::encode_sequence(&[&blk.to_der()])
}

/// Split a request body back into its admin block and signer infos.
pub fn parse_admin_request(body: &[u8]) -> Ep11Result<(AdminBlk, Vec<SignerInfo>)> {
    let (content, end) = asn1::decode_sequence(body, 0)?;
    if end != body.len() {
        return Err(Ep11Error::Asn1Error(format!(
            "{} trailing bytes after admin request",
            body.len() - end
        )));
    }
    let blk_end = asn1::skip_tlv(content, 0)?;
    let blk = AdminBlk::from_der(&content[..blk_end])?;
    let infos = parse_signer_infos(&content[blk_end..])?;
    Ok((blk, infos))
}
