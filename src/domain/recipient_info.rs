//! RecipientInfo for delivering an encrypted key part to an HSM domain.
//!
//! The key part is wrapped with a key derived by ECDH between an ephemeral
//! P-521 key and the domain's importer key; this module only assembles the
//! KeyAgreeRecipientInfo (RFC 5753) around the already computed values.

use crate::domain::asn1;
use crate::domain::constants::{
    AES256_WRAP_OID, ASN1_CONTEXT_0_TAG, ASN1_CONTEXT_1_TAG, EC_POINT_UNCOMPRESSED,
    EC_PUBLIC_KEY_OID, P521_PUBLIC_KEY_BYTES, RECIPIENT_INFO_VERSION, SECP521R1_OID, SKI_BYTES,
    STD_DH_SHA256_KDF_OID, UKM_BYTES, WRAPPED_KEY_PART_BYTES,
};
use crate::infra::error::{Ep11Error, Ep11Result};

fn require_len(field: &'static str, value: &[u8], expected: usize) -> Ep11Result<()> {
    if value.len() != expected {
        return Err(Ep11Error::LengthMismatch {
            field,
            expected,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Build the RecipientInfo for a P-521 key agreement.
///
/// * `public_key` - originator's uncompressed P-521 point (133 bytes)
/// * `ukm` - user keying material fed into the KDF (40 bytes)
/// * `ski` - subject key identifier of the importer key (32 bytes)
/// * `encrypted_key_part` - AES-256 key-wrapped key part (40 bytes)
pub fn create_recipient_info_p521_ec(
    public_key: &[u8],
    ukm: &[u8],
    ski: &[u8],
    encrypted_key_part: &[u8],
) -> Ep11Result<Vec<u8>> {
    require_len("originator public key", public_key, P521_PUBLIC_KEY_BYTES)?;
    require_len("user keying material", ukm, UKM_BYTES)?;
    require_len("importer key identifier", ski, SKI_BYTES)?;
    require_len("encrypted key part", encrypted_key_part, WRAPPED_KEY_PART_BYTES)?;
    if public_key[0] != EC_POINT_UNCOMPRESSED {
        return Err(Ep11Error::InvalidInput(format!(
            "originator public key must be an uncompressed point, found prefix 0x{:02x}",
            public_key[0]
        )));
    }

    let version = asn1::encode_small_integer(RECIPIENT_INFO_VERSION);

    // originator [0] { originatorKey [1] { algorithm, publicKey } }
    let algorithm = asn1::encode_sequence(&[
        &asn1::encode_oid(EC_PUBLIC_KEY_OID),
        &asn1::encode_oid(SECP521R1_OID),
    ]);
    let originator_key = asn1::encode_tagged(
        ASN1_CONTEXT_1_TAG,
        &[algorithm, asn1::encode_bit_string(public_key)].concat(),
    );
    let originator = asn1::encode_tagged(ASN1_CONTEXT_0_TAG, &originator_key);

    let ukm = asn1::encode_tagged(ASN1_CONTEXT_1_TAG, &asn1::encode_octet_string(ukm));

    let key_encryption_algorithm = asn1::encode_sequence(&[
        &asn1::encode_oid(STD_DH_SHA256_KDF_OID),
        &asn1::encode_sequence(&[&asn1::encode_oid(AES256_WRAP_OID)]),
    ]);

    // recipientEncryptedKeys: one entry keyed by the importer SKI
    let rid = asn1::encode_tagged(ASN1_CONTEXT_0_TAG, &asn1::encode_octet_string(ski));
    let encrypted_key = asn1::encode_sequence(&[&rid, &asn1::encode_octet_string(encrypted_key_part)]);
    let recipient_encrypted_keys = asn1::encode_sequence(&[&encrypted_key]);

    let info = asn1::encode_sequence(&[
        &version,
        &originator,
        &ukm,
        &key_encryption_algorithm,
        &recipient_encrypted_keys,
    ]);
    log::debug!("Built P-521 RecipientInfo ({} bytes)", info.len());
    Ok(info)
}
