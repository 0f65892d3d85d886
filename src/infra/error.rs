//! Error handling types and result definitions for the codec, verifier and
//! command layers.

use thiserror::Error;

use crate::domain::constants::{HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND};

/// Result type for EP11 operations
pub type Ep11Result<T> = Result<T, Ep11Error>;

/// Comprehensive error types for EP11 operations
#[derive(Error, Debug, miette::Diagnostic)]
pub enum Ep11Error {
    #[error("ASN.1 encoding/decoding error: {0}")]
    Asn1Error(String),

    #[error("Certificate format error in {section}: {detail}")]
    CertificateFormat {
        section: &'static str,
        detail: String,
    },

    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Self-signed certificate not allowed at index {index}")]
    SelfSignedCertificate { index: u32 },

    #[error("Wrong parent certificate at index {index}: subject key identifier {found} does not match signer {expected}")]
    WrongParentCertificate {
        index: u32,
        expected: String,
        found: String,
    },

    #[error("Unrecognized root key: signer key identifier {0}")]
    UnrecognizedRootKey(String),

    #[error("Signature verification failed for certificate at index {index}")]
    SignatureVerification { index: u32 },

    #[error("HSM error: {message}")]
    #[diagnostic(code(ep11::hsm))]
    Hsm { rc: u32, rsn: u32, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Cryptographic error: {0}")]
    CryptographicError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Ep11Error {
    /// Build an HSM error with the looked-up text for `rc`/`rsn`.
    #[must_use]
    pub fn hsm(rc: u32, rsn: u32) -> Self {
        Ep11Error::Hsm {
            rc,
            rsn,
            message: crate::services::error_messages::hsm_error_message(rc, rsn),
        }
    }

    pub(crate) fn format(section: &'static str, detail: impl Into<String>) -> Self {
        Ep11Error::CertificateFormat {
            section,
            detail: detail.into(),
        }
    }

    /// True when the HSM reported "not found" (return code 96, reason code 60).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Ep11Error::Hsm { rc, rsn, .. } if *rc == HSM_RC_NOT_FOUND && *rsn == HSM_RSN_NOT_FOUND
        )
    }
}

impl From<openssl::error::ErrorStack> for Ep11Error {
    fn from(error: openssl::error::ErrorStack) -> Self {
        Ep11Error::CryptographicError(error.to_string())
    }
}

impl From<hex::FromHexError> for Ep11Error {
    fn from(error: hex::FromHexError) -> Self {
        Ep11Error::InvalidInput(format!("invalid hex: {error}"))
    }
}

impl From<std::io::Error> for Ep11Error {
    fn from(error: std::io::Error) -> Self {
        Ep11Error::IoError(error.to_string())
    }
}
