//! Boundary to the HSM transport protocol (HTP) service.
//!
//! The crate never talks to the network itself. Callers supply an
//! [`HsmTransport`] that posts the request to the HSM service and returns the
//! response blob, hex encoded, exactly as the service delivered it.

use serde::{Deserialize, Serialize};

use crate::domain::types::DomainEntry;
use crate::infra::error::Ep11Result;

/// What the request body contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Signed `SEQUENCE { AdminBlk, SignerInfo... }`
    AdminCommand,
    /// Unsigned `SEQUENCE { AdminBlk }`
    AdminQuery,
    /// Domain info query; the body is empty
    DomainInfo,
}

/// One request for the HSM service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtpRequest {
    pub kind: RequestKind,
    /// Request body, hex encoded on the wire
    #[serde(with = "hex::serde")]
    pub body: Vec<u8>,
    pub target: DomainEntry,
}

impl HtpRequest {
    #[must_use]
    pub fn new(kind: RequestKind, target: DomainEntry, body: Vec<u8>) -> Self {
        Self { kind, target, body }
    }
}

/// Synchronous request/response round trip to the HSM service.
pub trait HsmTransport {
    /// Submit the request; the returned string is the hex encoded response.
    fn submit(&self, request: &HtpRequest) -> Ep11Result<String>;
}

impl<T: HsmTransport + ?Sized> HsmTransport for &T {
    fn submit(&self, request: &HtpRequest) -> Ep11Result<String> {
        (**self).submit(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HtpRequest {
        HtpRequest::new(
            RequestKind::AdminQuery,
            DomainEntry::new(2, 9, [0x5a; 16]),
            vec![0x30, 0x03, 0x04, 0x01, 0xff],
        )
    }

    #[test]
    fn test_request_wire_shape() {
        let text = toml::to_string(&request()).unwrap();
        assert!(text.contains("kind = \"admin_query\""), "{text}");
        assert!(text.contains("body = \"30030401ff\""), "{text}");
        assert!(text.contains("domain_index = 9"), "{text}");

        let parsed: HtpRequest = toml::from_str(&text).unwrap();
        assert_eq!(parsed, request());
    }

    #[test]
    fn test_request_body_must_be_hex() {
        let text = toml::to_string(&request())
            .unwrap()
            .replace("30030401ff", "not hex");
        assert!(toml::from_str::<HtpRequest>(&text).is_err());
    }
}
