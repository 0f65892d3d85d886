//! Centralized constants for DER tags, OIDs, EP11 wire sizes and HSM codes.
//! Keep this intentionally small; only broadly reused literals should live here.

// === ASN.1 DER Constants ===

/// ASN.1 SEQUENCE tag
pub const ASN1_SEQUENCE_TAG: u8 = 0x30;

/// ASN.1 INTEGER tag
pub const ASN1_INTEGER_TAG: u8 = 0x02;

/// ASN.1 BIT STRING tag
pub const ASN1_BIT_STRING_TAG: u8 = 0x03;

/// ASN.1 OCTET STRING tag
pub const ASN1_OCTET_STRING_TAG: u8 = 0x04;

/// ASN.1 OBJECT IDENTIFIER tag
pub const ASN1_OID_TAG: u8 = 0x06;

/// ASN.1 context-specific constructed tag [0]
pub const ASN1_CONTEXT_0_TAG: u8 = 0xa0;

/// ASN.1 context-specific constructed tag [1]
pub const ASN1_CONTEXT_1_TAG: u8 = 0xa1;

/// Context-specific primitive tag [0]; replaces the OCTET STRING tag of the SignerInfo SKI.
pub const ASN1_CONTEXT_0_PRIMITIVE_TAG: u8 = 0x80;

/// DER long form length encoding: 1-byte length follows
pub const DER_LONG_FORM_1_BYTE: u8 = 0x81;

/// DER long form length encoding: 2-byte length follows
pub const DER_LONG_FORM_2_BYTE: u8 = 0x82;

/// Largest number of length octets accepted when decoding
pub const DER_MAX_LENGTH_OCTETS: usize = 4;

// === Algorithm OIDs (DER body, without tag/length) ===

/// SHA-256 (2.16.840.1.101.3.4.2.1)
pub const SHA256_ALGORITHM_OID: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];

/// SHA-512 (2.16.840.1.101.3.4.2.3)
pub const SHA512_ALGORITHM_OID: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03];

/// ecdsa-with-SHA512 (1.2.840.10045.4.3.4)
pub const ECDSA_WITH_SHA512_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x04];

/// sha256WithRSAEncryption (1.2.840.113549.1.1.11)
pub const SHA256_WITH_RSA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b];

/// IBM Dilithium round 2 (6,5) signature (1.3.6.1.4.1.2.267.1.6.5)
pub const DILITHIUM_R2_65_OID: &[u8] = &[
    0x2b, 0x06, 0x01, 0x04, 0x01, 0x02, 0x82, 0x0b, 0x01, 0x06, 0x05,
];

/// id-ecPublicKey (1.2.840.10045.2.1)
pub const EC_PUBLIC_KEY_OID: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];

/// secp521r1 (1.3.132.0.35)
pub const SECP521R1_OID: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x23];

/// dhSinglePass-stdDH-sha256kdf-scheme (1.3.132.1.11.1)
pub const STD_DH_SHA256_KDF_OID: &[u8] = &[0x2b, 0x81, 0x04, 0x01, 0x0b, 0x01];

/// id-aes256-wrap (2.16.840.1.101.3.4.1.45)
pub const AES256_WRAP_OID: &[u8] = &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x01, 0x2d];

// === EP11 wire sizes ===

/// SignerInfo version written and accepted
pub const SIGNER_INFO_VERSION: u32 = 3;

/// RecipientInfo (KeyAgreeRecipientInfo) version
pub const RECIPIENT_INFO_VERSION: u32 = 3;

/// Subject key identifier length (SHA-256 of the public key)
pub const SKI_BYTES: usize = 32;

/// Master key verification pattern length
pub const MKVP_BYTES: usize = 32;

/// Size of one P-521 coordinate or signature half
pub const P521_COORDINATE_BYTES: usize = 66;

/// Uncompressed P-521 point: 0x04 || X || Y
pub const P521_PUBLIC_KEY_BYTES: usize = 1 + 2 * P521_COORDINATE_BYTES;

/// Uncompressed point marker
pub const EC_POINT_UNCOMPRESSED: u8 = 0x04;

/// User keying material carried in the RecipientInfo
pub const UKM_BYTES: usize = 40;

/// AES key-wrapped 256-bit key part
pub const WRAPPED_KEY_PART_BYTES: usize = 40;

/// Module identifier carried in every admin block
pub const MODULE_ID_BYTES: usize = 16;

/// Admin transaction counter width
pub const TRANSACTION_COUNTER_BYTES: usize = 16;

/// Encoded domain identifier width
pub const DOMAIN_ID_BYTES: usize = 4;

/// Return code + reason code field of an admin response block
pub const RETURN_CODE_BYTES: usize = 8;

// === HSM return codes ===

/// Return code reported when a queried object does not exist
pub const HSM_RC_NOT_FOUND: u32 = 96;

/// Reason code accompanying [`HSM_RC_NOT_FOUND`]
pub const HSM_RSN_NOT_FOUND: u32 = 60;

// === Domain info response layout ===

/// Offset of the current MKVP in a domain info payload
pub const DOMAIN_INFO_CURRENT_MKVP_OFFSET: usize = 4;

/// Offset of the new (pending) MKVP
pub const DOMAIN_INFO_NEW_MKVP_OFFSET: usize = 36;

/// Offset of the 4-byte flags word; the status byte is its last byte (71)
pub const DOMAIN_INFO_FLAGS_OFFSET: usize = 68;

/// Minimum accepted domain info payload
pub const DOMAIN_INFO_MIN_BYTES: usize = 72;

/// Current wrapping key register holds a valid key
pub const DOMAIN_FLAG_CURRENT_WK_VALID: u8 = 0x02;

/// New wrapping key register is loaded
pub const DOMAIN_FLAG_NEW_WK_PRESENT: u8 = 0x04;

/// New wrapping key register is committed
pub const DOMAIN_FLAG_NEW_WK_COMMITTED: u8 = 0x08;

// === OA certificate signature algorithms ===

/// Signature algorithm id of an ECDSA P-521 / SHA-512 signer info section
pub const OA_SIG_ALG_ECDSA_P521_SHA512: u32 = 0x0000_0001;

/// Signature algorithm id of a Dilithium signer info section
pub const OA_SIG_ALG_DILITHIUM: u32 = 0x0000_0002;
