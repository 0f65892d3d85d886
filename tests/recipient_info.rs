//! KeyAgree RecipientInfo assembly for P-521.

mod common;

use common::{p521_key, public_point};
use ep11_tke::domain::asn1;
use ep11_tke::domain::constants::{AES256_WRAP_OID, SECP521R1_OID, STD_DH_SHA256_KDF_OID};
use ep11_tke::{create_recipient_info_p521_ec, Ep11Error};

struct Inputs {
    public_key: Vec<u8>,
    ukm: Vec<u8>,
    ski: Vec<u8>,
    encrypted: Vec<u8>,
}

fn inputs() -> Inputs {
    Inputs {
        public_key: public_point(&p521_key()),
        ukm: vec![0x75; 40],
        ski: vec![0x5c; 32],
        encrypted: vec![0xe7; 40],
    }
}

fn build(i: &Inputs) -> Result<Vec<u8>, Ep11Error> {
    create_recipient_info_p521_ec(&i.public_key, &i.ukm, &i.ski, &i.encrypted)
}

#[test]
fn recipient_info_has_expected_structure() {
    let i = inputs();
    let der = build(&i).unwrap();

    let (body, end) = asn1::decode_sequence(&der, 0).unwrap();
    assert_eq!(end, der.len());
    let (version, pos) = asn1::decode_small_integer(body, 0).unwrap();
    assert_eq!(version, 3);

    // originator [0] { [1] { algorithm, BIT STRING } }
    let (originator, pos) = asn1::decode_tlv(body, pos, 0xa0).unwrap();
    let (originator_key, _) = asn1::decode_tlv(originator, 0, 0xa1).unwrap();
    let (algorithm, key_pos) = asn1::decode_sequence(originator_key, 0).unwrap();
    let (_, curve_pos) = asn1::decode_oid(algorithm, 0).unwrap();
    assert_eq!(asn1::decode_oid(algorithm, curve_pos).unwrap().0, SECP521R1_OID);
    let (point, _) = asn1::decode_bit_string(originator_key, key_pos).unwrap();
    assert_eq!(point, &i.public_key[..]);

    // ukm [1] { OCTET STRING }
    let (ukm, pos) = asn1::decode_tlv(body, pos, 0xa1).unwrap();
    assert_eq!(asn1::decode_octet_string(ukm, 0).unwrap().0, &i.ukm[..]);

    // key encryption algorithm
    let (kea, pos) = asn1::decode_sequence(body, pos).unwrap();
    let (scheme, wrap_pos) = asn1::decode_oid(kea, 0).unwrap();
    assert_eq!(scheme, STD_DH_SHA256_KDF_OID);
    let (wrap, _) = asn1::decode_sequence(kea, wrap_pos).unwrap();
    assert_eq!(asn1::decode_oid(wrap, 0).unwrap().0, AES256_WRAP_OID);

    // recipientEncryptedKeys
    let (keys, pos) = asn1::decode_sequence(body, pos).unwrap();
    assert_eq!(pos, body.len());
    let (key, _) = asn1::decode_sequence(keys, 0).unwrap();
    let (rid, enc_pos) = asn1::decode_tlv(key, 0, 0xa0).unwrap();
    assert_eq!(asn1::decode_octet_string(rid, 0).unwrap().0, &i.ski[..]);
    assert_eq!(
        asn1::decode_octet_string(key, enc_pos).unwrap().0,
        &i.encrypted[..]
    );
}

#[test]
fn each_input_length_is_checked() {
    let cases: [(&str, fn(&mut Inputs)); 4] = [
        ("originator public key", |i| {
            i.public_key.pop();
        }),
        ("user keying material", |i| {
            i.ukm.pop();
        }),
        ("importer key identifier", |i| {
            i.ski.pop();
        }),
        ("encrypted key part", |i| {
            i.encrypted.pop();
        }),
    ];
    for (name, shorten) in cases {
        let mut i = inputs();
        shorten(&mut i);
        match build(&i).unwrap_err() {
            Ep11Error::LengthMismatch {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, name);
                assert_eq!(actual + 1, expected);
            }
            other => panic!("{name}: unexpected error {other:?}"),
        }
    }
}

#[test]
fn compressed_point_is_rejected() {
    let mut i = inputs();
    i.public_key[0] = 0x02;
    assert!(matches!(build(&i), Err(Ep11Error::InvalidInput(_))));
}
