//! Master-key register state of one domain.
//!
//! Domain info payload, big-endian:
//!
//! ```text
//!  0..4    domain index
//!  4..36   current wrapping key verification pattern
//! 36..68   new (pending) wrapping key verification pattern
//! 68..72   flags; status bits live in byte 71
//! 72..     mode and reserved bytes (ignored)
//! ```
//!
//! The status byte is a bitmask, not an enumerated value: 0x02 current key
//! valid, 0x04 new key present, 0x08 new key committed.

use std::fmt;

use crate::domain::constants::{
    DOMAIN_FLAG_CURRENT_WK_VALID, DOMAIN_FLAG_NEW_WK_COMMITTED, DOMAIN_FLAG_NEW_WK_PRESENT,
    DOMAIN_INFO_CURRENT_MKVP_OFFSET, DOMAIN_INFO_FLAGS_OFFSET, DOMAIN_INFO_MIN_BYTES,
    DOMAIN_INFO_NEW_MKVP_OFFSET, MKVP_BYTES,
};
use crate::domain::types::Mkvp;
use crate::infra::error::{Ep11Error, Ep11Result};

/// State of a wrapping key register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MkStatus {
    /// `MK_STATUS_EMPTY`
    Empty,
    /// `CMK_STATUS_VALID`: current register holds a usable key
    Valid,
    /// `NMK_STATUS_FULL_UNCOMMITTED`: pending key loaded, not yet committed
    FullUncommitted,
    /// `NMK_STATUS_FULL_COMMITTED`: pending key committed, awaiting finalize
    FullCommitted,
}

impl fmt::Display for MkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MkStatus::Empty => "empty",
            MkStatus::Valid => "valid",
            MkStatus::FullUncommitted => "full, uncommitted",
            MkStatus::FullCommitted => "full, committed",
        };
        f.write_str(text)
    }
}

/// Decoded domain info response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfoRspInfo {
    pub domain: u32,
    pub current_mkvp: Mkvp,
    pub new_mkvp: Mkvp,
    pub current_status: MkStatus,
    pub new_status: MkStatus,
    pub flags: u32,
}

/// Decode a domain info payload into register states.
pub fn parse_domain_info_rsp(payload: &[u8]) -> Ep11Result<DomainInfoRspInfo> {
    if payload.len() < DOMAIN_INFO_MIN_BYTES {
        return Err(Ep11Error::LengthMismatch {
            field: "domain info response",
            expected: DOMAIN_INFO_MIN_BYTES,
            actual: payload.len(),
        });
    }

    let domain = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let current_mkvp = Mkvp::from_slice(
        &payload[DOMAIN_INFO_CURRENT_MKVP_OFFSET..DOMAIN_INFO_CURRENT_MKVP_OFFSET + MKVP_BYTES],
    )?;
    let new_mkvp = Mkvp::from_slice(
        &payload[DOMAIN_INFO_NEW_MKVP_OFFSET..DOMAIN_INFO_NEW_MKVP_OFFSET + MKVP_BYTES],
    )?;
    let flag_bytes = &payload[DOMAIN_INFO_FLAGS_OFFSET..DOMAIN_INFO_FLAGS_OFFSET + 4];
    let flags = u32::from_be_bytes([flag_bytes[0], flag_bytes[1], flag_bytes[2], flag_bytes[3]]);
    let status = flag_bytes[3];

    let current_status = if status & DOMAIN_FLAG_CURRENT_WK_VALID != 0 {
        MkStatus::Valid
    } else {
        MkStatus::Empty
    };
    let new_status = if status & DOMAIN_FLAG_NEW_WK_PRESENT == 0 {
        MkStatus::Empty
    } else if status & DOMAIN_FLAG_NEW_WK_COMMITTED != 0 {
        MkStatus::FullCommitted
    } else {
        MkStatus::FullUncommitted
    };

    log::debug!(
        "Domain {domain}: current wrapping key {current_status}, new wrapping key {new_status}"
    );
    Ok(DomainInfoRspInfo {
        domain,
        current_mkvp,
        new_mkvp,
        current_status,
        new_status,
        flags,
    })
}
