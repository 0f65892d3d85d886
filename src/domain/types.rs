//! Type-safe wrappers using new-type pattern
//!
//! Fixed-size identifiers that travel through every EP11 structure. Each
//! constructor validates the length so downstream code can index freely.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::constants::{MKVP_BYTES, MODULE_ID_BYTES, SKI_BYTES};
use crate::infra::error::{Ep11Error, Ep11Result};

/// Subject key identifier: 32 bytes identifying a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ski([u8; SKI_BYTES]);

impl Ski {
    #[must_use]
    pub fn new(bytes: [u8; SKI_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Ep11Result<Self> {
        let raw: [u8; SKI_BYTES] = bytes.try_into().map_err(|_| Ep11Error::LengthMismatch {
            field: "subject key identifier",
            expected: SKI_BYTES,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    pub fn from_hex(value: &str) -> Ep11Result<Self> {
        Self::from_slice(&hex::decode(value.trim())?)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SKI_BYTES] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Ski {
    type Err = Ep11Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Ski {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ski({})", self.to_hex())
    }
}

/// Master key verification pattern.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Mkvp([u8; MKVP_BYTES]);

impl Mkvp {
    pub fn from_slice(bytes: &[u8]) -> Ep11Result<Self> {
        let raw: [u8; MKVP_BYTES] = bytes.try_into().map_err(|_| Ep11Error::LengthMismatch {
            field: "master key verification pattern",
            expected: MKVP_BYTES,
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; MKVP_BYTES] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Debug for Mkvp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mkvp({})", hex::encode(self.0))
    }
}

/// Identifies one domain of one crypto module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Index of the crypto module (adapter) hosting the domain
    pub crypto_module_index: u32,
    /// Domain index within the module
    pub domain_index: u16,
    /// Module serial identifier, hex encoded, 16 bytes
    pub module_id: String,
}

impl DomainEntry {
    pub fn new(crypto_module_index: u32, domain_index: u16, module_id: [u8; MODULE_ID_BYTES]) -> Self {
        Self {
            crypto_module_index,
            domain_index,
            module_id: hex::encode(module_id),
        }
    }

    pub fn module_id_bytes(&self) -> Ep11Result<[u8; MODULE_ID_BYTES]> {
        let raw = hex::decode(&self.module_id)?;
        raw.as_slice().try_into().map_err(|_| Ep11Error::LengthMismatch {
            field: "module id",
            expected: MODULE_ID_BYTES,
            actual: raw.len(),
        })
    }
}

impl fmt::Display for DomainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "module {} domain {}",
            self.crypto_module_index, self.domain_index
        )
    }
}
