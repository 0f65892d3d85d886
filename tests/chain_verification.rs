//! OA certificate chain walking against a trust anchor.

mod common;

use common::{anchor_for, build_oa2, build_oa3, p521_key, ski, FailingSource, Link, MapSource};
use ep11_tke::domain::oa::Oa3Certificate;
use ep11_tke::services::{verify_oa2_certificate, verify_oa3_certificate, MAX_CHAIN_DEPTH};
use ep11_tke::{Ep11Error, Oa2Certificate};
use openssl::ec::EcKey;
use openssl::pkey::Private;

const ROOT: u8 = 0xa0;

/// Keys for a chain of `len` certificates, index 0 first; the last one is signed by the root.
fn chain_keys(len: usize) -> Vec<EcKey<Private>> {
    (0..len).map(|_| p521_key()).collect()
}

fn oa3_chain(root: &EcKey<Private>, keys: &[EcKey<Private>]) -> Vec<Vec<u8>> {
    (0..keys.len())
        .map(|i| {
            let (signer, signer_key) = if i + 1 < keys.len() {
                (ski(0xc1 + i as u8), &keys[i + 1])
            } else {
                (ski(ROOT), root)
            };
            build_oa3(
                &Link {
                    index: i as u32,
                    subject: ski(0xc0 + i as u8),
                    subject_key: &keys[i],
                    signer,
                    signer_key,
                },
                i % 2 == 1,
            )
        })
        .collect()
}

fn source_above(chain: &[Vec<u8>]) -> MapSource {
    MapSource::with(
        chain
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, cert)| (i as u32, cert.clone())),
    )
}

#[test]
fn three_certificate_chain_verifies() {
    let root = p521_key();
    let keys = chain_keys(3);
    let chain = oa3_chain(&root, &keys);
    let source = source_above(&chain);

    let leaf = Oa3Certificate::init(&chain[0]).unwrap();
    verify_oa3_certificate(&source, &anchor_for(ROOT, &root), 0, &leaf).unwrap();
    assert_eq!(*source.fetched.borrow(), vec![1, 2, 3]);
}

#[test]
fn certificate_signed_by_root_verifies_directly() {
    let root = p521_key();
    let keys = chain_keys(1);
    let chain = oa3_chain(&root, &keys);
    let source = MapSource::default();

    let cert = Oa3Certificate::init(&chain[0]).unwrap();
    verify_oa3_certificate(&source, &anchor_for(ROOT, &root), 0, &cert).unwrap();
}

#[test]
fn self_signed_certificate_is_rejected_without_fetching() {
    let key = p521_key();
    let data = build_oa3(
        &Link {
            index: 0,
            subject: ski(0x55),
            subject_key: &key,
            signer: ski(0x55),
            signer_key: &key,
        },
        false,
    );
    let source = MapSource::default();
    let cert = Oa3Certificate::init(&data).unwrap();

    let err = verify_oa3_certificate(&source, &anchor_for(ROOT, &key), 0, &cert).unwrap_err();
    assert!(matches!(err, Ep11Error::SelfSignedCertificate { index: 0 }));
    assert!(source.fetched.borrow().is_empty());
}

#[test]
fn tampered_body_fails_at_that_link() {
    let root = p521_key();
    let keys = chain_keys(3);
    let mut chain = oa3_chain(&root, &keys);
    // metadata byte of the certificate at index 1
    chain[1][100] ^= 0x01;
    let source = source_above(&chain);

    let leaf = Oa3Certificate::init(&chain[0]).unwrap();
    let err = verify_oa3_certificate(&source, &anchor_for(ROOT, &root), 0, &leaf).unwrap_err();
    assert!(matches!(err, Ep11Error::SignatureVerification { index: 1 }), "{err:?}");
}

#[test]
fn tampered_signature_fails() {
    let root = p521_key();
    let keys = chain_keys(2);
    let mut chain = oa3_chain(&root, &keys);
    // last byte of R in the leaf
    let r_end = 16 + 238 + 32 + 133 + 2592 + 32 + 32 + 4 + 66;
    chain[0][r_end - 1] ^= 0x01;
    let source = source_above(&chain);

    let leaf = Oa3Certificate::init(&chain[0]).unwrap();
    let err = verify_oa3_certificate(&source, &anchor_for(ROOT, &root), 0, &leaf).unwrap_err();
    assert!(matches!(err, Ep11Error::SignatureVerification { index: 0 }), "{err:?}");
}

#[test]
fn wrong_parent_is_reported() {
    let root = p521_key();
    let keys = chain_keys(2);
    let chain = oa3_chain(&root, &keys);
    let stranger = p521_key();
    let impostor = build_oa3(
        &Link {
            index: 1,
            subject: ski(0x99),
            subject_key: &stranger,
            signer: ski(ROOT),
            signer_key: &root,
        },
        false,
    );
    let source = MapSource::with([(1, impostor)]);

    let leaf = Oa3Certificate::init(&chain[0]).unwrap();
    let err = verify_oa3_certificate(&source, &anchor_for(ROOT, &root), 0, &leaf).unwrap_err();
    match err {
        Ep11Error::WrongParentCertificate {
            index,
            expected,
            found,
        } => {
            assert_eq!(index, 1);
            assert_eq!(expected, ski(0xc1).to_hex());
            assert_eq!(found, ski(0x99).to_hex());
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unknown_root_is_rejected() {
    let root = p521_key();
    let keys = chain_keys(1);
    let chain = oa3_chain(&root, &keys);
    let source = MapSource::default();

    let cert = Oa3Certificate::init(&chain[0]).unwrap();
    let other_anchor = anchor_for(0xbb, &root);
    let err = verify_oa3_certificate(&source, &other_anchor, 0, &cert).unwrap_err();
    assert!(matches!(err, Ep11Error::UnrecognizedRootKey(ref s) if *s == ski(ROOT).to_hex()));
}

#[test]
fn root_identifier_with_wrong_key_fails_signature() {
    let root = p521_key();
    let keys = chain_keys(1);
    let chain = oa3_chain(&root, &keys);
    let source = MapSource::default();

    let cert = Oa3Certificate::init(&chain[0]).unwrap();
    let forged_anchor = anchor_for(ROOT, &p521_key());
    let err = verify_oa3_certificate(&source, &forged_anchor, 0, &cert).unwrap_err();
    assert!(matches!(err, Ep11Error::SignatureVerification { index: 0 }));
}

#[test]
fn source_errors_other_than_not_found_propagate() {
    let root = p521_key();
    let keys = chain_keys(1);
    let chain = oa3_chain(&root, &keys);

    let cert = Oa3Certificate::init(&chain[0]).unwrap();
    let err = verify_oa3_certificate(&FailingSource, &anchor_for(ROOT, &root), 0, &cert).unwrap_err();
    assert!(matches!(err, Ep11Error::Transport(_)));
}

#[test]
fn overlong_chain_is_rejected() {
    let root = p521_key();
    let keys = chain_keys(MAX_CHAIN_DEPTH as usize + 1);
    let chain = oa3_chain(&root, &keys);
    let source = source_above(&chain);

    let leaf = Oa3Certificate::init(&chain[0]).unwrap();
    let err = verify_oa3_certificate(&source, &anchor_for(ROOT, &root), 0, &leaf).unwrap_err();
    assert!(matches!(err, Ep11Error::InvalidInput(_)), "{err:?}");
}

#[test]
fn oa2_chain_verifies() {
    let root = p521_key();
    let leaf_key = p521_key();
    let mid_key = p521_key();
    let leaf = build_oa2(&Link {
        index: 5,
        subject: ski(0x50),
        subject_key: &leaf_key,
        signer: ski(0x60),
        signer_key: &mid_key,
    });
    let mid = build_oa2(&Link {
        index: 6,
        subject: ski(0x60),
        subject_key: &mid_key,
        signer: ski(ROOT),
        signer_key: &root,
    });
    let source = MapSource::with([(6, mid)]);

    let cert = Oa2Certificate::init(&leaf).unwrap();
    verify_oa2_certificate(&source, &anchor_for(ROOT, &root), 5, &cert).unwrap();
    assert_eq!(*source.fetched.borrow(), vec![6, 7]);
}
