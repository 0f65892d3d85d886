//! OpenSSL-backed administrator signature keys stored in PEM files.
//!
//! Provides key-type inspection used when configuration is resolved, and a
//! [`SignatureProvider`] that signs with the key file named by a
//! [`KeyRef`]. The key's token, when present, is the PEM passphrase.

use std::fs;

use openssl::ecdsa::EcdsaSig;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Private};
use openssl::sign::Signer;
use sha2::{Digest, Sha512};

use crate::domain::signer_info::{KeyRef, SignatureKey};
use crate::infra::error::{Ep11Error, Ep11Result};
use crate::services::request_builder::SignatureProvider;

/// Key algorithm found in a key file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa2048,
    P521Ec,
}

/// Read a PEM private key, decrypting it with `password` when given.
pub fn load_private_key(path: &str, password: Option<&str>) -> Ep11Result<PKey<Private>> {
    let pem = fs::read(path)
        .map_err(|e| Ep11Error::IoError(format!("Failed to read key file {path}: {e}")))?;
    let key = match password {
        Some(password) => PKey::private_key_from_pem_passphrase(&pem, password.as_bytes()),
        None => PKey::private_key_from_pem(&pem),
    };
    key.map_err(|e| Ep11Error::Signing(format!("Failed to load private key {path}: {e}")))
}

/// Classify a loaded key; anything but RSA-2048 or P-521 is rejected.
pub fn key_kind(key: &PKey<Private>) -> Ep11Result<KeyKind> {
    match key.id() {
        Id::RSA if key.bits() == 2048 => Ok(KeyKind::Rsa2048),
        Id::RSA => Err(Ep11Error::Signing(format!(
            "RSA key of {} bits is not supported, expected 2048",
            key.bits()
        ))),
        Id::EC => {
            let curve = key.ec_key()?.group().curve_name();
            if curve == Some(Nid::SECP521R1) {
                Ok(KeyKind::P521Ec)
            } else {
                Err(Ep11Error::Signing(format!(
                    "EC key on curve {curve:?} is not supported, expected P-521"
                )))
            }
        }
        other => Err(Ep11Error::Signing(format!(
            "unsupported key type {other:?}"
        ))),
    }
}

/// Resolve a configured key into its signing variant.
///
/// With a remote signing service every key is a P-521 EC key and the key
/// file is not read.
pub fn resolve_signature_key(key_ref: KeyRef, signing_service: bool) -> Ep11Result<SignatureKey> {
    if signing_service {
        return Ok(SignatureKey::P521Ec(key_ref));
    }
    let key = load_private_key(&key_ref.location, key_ref.token.as_deref())?;
    let kind = key_kind(&key)?;
    log::debug!("Key {} resolved as {kind:?}", key_ref.location);
    Ok(match kind {
        KeyKind::Rsa2048 => SignatureKey::Rsa2048(key_ref),
        KeyKind::P521Ec => SignatureKey::P521Ec(key_ref),
    })
}

/// Signs with PEM key files on the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyFileSigner;

impl SignatureProvider for KeyFileSigner {
    fn sign(&self, key: &SignatureKey, data: &[u8]) -> Ep11Result<Vec<u8>> {
        let key_ref = key.key_ref();
        let pkey = load_private_key(&key_ref.location, key_ref.token.as_deref())?;
        let kind = key_kind(&pkey)?;

        match (key, kind) {
            (SignatureKey::P521Ec(_), KeyKind::P521Ec) => {
                let digest = Sha512::digest(data);
                let signature = EcdsaSig::sign(&digest, &*pkey.ec_key()?)?;
                Ok(signature.to_der()?)
            }
            (SignatureKey::Rsa2048(_), KeyKind::Rsa2048) => {
                let mut signer = Signer::new(MessageDigest::sha256(), &pkey)?;
                signer.update(data)?;
                Ok(signer.sign_to_vec()?)
            }
            (_, found) => Err(Ep11Error::Signing(format!(
                "key file {} holds a {found:?} key, configuration expects {}",
                key_ref.location,
                match key {
                    SignatureKey::Rsa2048(_) => "RSA-2048",
                    SignatureKey::P521Ec(_) => "P-521",
                }
            ))),
        }
    }
}
