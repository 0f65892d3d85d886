//! Administrative command block (AdminBlk) and its response counterpart.
//!
//! An admin block is the unit every EP11 administrative command is signed
//! over: command id, target domain, module id, transaction counter and a
//! command specific payload, each carried as an OCTET STRING inside one
//! SEQUENCE. Building is pure data assembly; signing and transport happen
//! downstream.

use std::fmt;

use crate::domain::asn1;
use crate::domain::constants::{
    DOMAIN_ID_BYTES, MODULE_ID_BYTES, RETURN_CODE_BYTES, TRANSACTION_COUNTER_BYTES,
};
use crate::infra::error::{Ep11Error, Ep11Result};

/// EP11 administrative command and query identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CmdId {
    AdminLogin = 0x0001_0001,
    /// Installs an administrator certificate in a domain.
    DomainAdminLogin = 0x0001_0002,
    AdminLogout = 0x0001_0003,
    DomainAdminLogout = 0x0001_0004,
    AdminReplace = 0x0001_0005,
    DomainAdminReplace = 0x0001_0006,
    SetAttributes = 0x0001_0007,
    DomainSetAttributes = 0x0001_0008,
    GenerateDomainImporter = 0x0001_0009,
    /// Generates a random wrapping key into the pending register.
    GenerateWk = 0x0001_000a,
    ExportWk = 0x0001_000b,
    ImportWk = 0x0001_000c,
    CommitWk = 0x0001_000d,
    FinalizeWk = 0x0001_000e,
    Zeroize = 0x0001_000f,
    DomainZeroize = 0x0001_0010,
    DomainControlPointSet = 0x0001_0011,
    DomainControlPointAdd = 0x0001_0012,
    DomainControlPointDelete = 0x0001_0013,
    QueryAdmins = 0x0002_0001,
    QueryDomainAdmins = 0x0002_0002,
    QueryDeviceCertificate = 0x0002_0003,
    QueryDomains = 0x0002_0005,
    QueryAttributes = 0x0002_0006,
    QueryDomainAttributes = 0x0002_0007,
    QueryWk = 0x0002_0008,
    QueryNextWk = 0x0002_0009,
    QueryControlPoints = 0x0002_000b,
    QueryDomainControlPoints = 0x0002_000c,
    QueryImporterCertificate = 0x0002_000d,
}

const ALL_CMD_IDS: &[CmdId] = &[
    CmdId::AdminLogin,
    CmdId::DomainAdminLogin,
    CmdId::AdminLogout,
    CmdId::DomainAdminLogout,
    CmdId::AdminReplace,
    CmdId::DomainAdminReplace,
    CmdId::SetAttributes,
    CmdId::DomainSetAttributes,
    CmdId::GenerateDomainImporter,
    CmdId::GenerateWk,
    CmdId::ExportWk,
    CmdId::ImportWk,
    CmdId::CommitWk,
    CmdId::FinalizeWk,
    CmdId::Zeroize,
    CmdId::DomainZeroize,
    CmdId::DomainControlPointSet,
    CmdId::DomainControlPointAdd,
    CmdId::DomainControlPointDelete,
    CmdId::QueryAdmins,
    CmdId::QueryDomainAdmins,
    CmdId::QueryDeviceCertificate,
    CmdId::QueryDomains,
    CmdId::QueryAttributes,
    CmdId::QueryDomainAttributes,
    CmdId::QueryWk,
    CmdId::QueryNextWk,
    CmdId::QueryControlPoints,
    CmdId::QueryDomainControlPoints,
    CmdId::QueryImporterCertificate,
];

impl CmdId {
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(value: u32) -> Ep11Result<Self> {
        ALL_CMD_IDS
            .iter()
            .copied()
            .find(|id| id.as_u32() == value)
            .ok_or_else(|| Ep11Error::InvalidInput(format!("unknown command id 0x{value:08x}")))
    }

    /// Queries are sent unsigned.
    #[must_use]
    pub fn is_query(self) -> bool {
        self.as_u32() & 0xffff_0000 == 0x0002_0000
    }
}

impl fmt::Display for CmdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:08x})", self, self.as_u32())
    }
}

/// Four byte domain identifier carried in admin blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainId([u8; DOMAIN_ID_BYTES]);

impl DomainId {
    /// Big-endian encoding of the domain index.
    #[must_use]
    pub fn from_index(index: u16) -> Self {
        Self(u32::from(index).to_be_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Ep11Result<Self> {
        let raw: [u8; DOMAIN_ID_BYTES] =
            bytes.try_into().map_err(|_| Ep11Error::LengthMismatch {
                field: "domain id",
                expected: DOMAIN_ID_BYTES,
                actual: bytes.len(),
            })?;
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DOMAIN_ID_BYTES] {
        &self.0
    }

    #[must_use]
    pub fn index(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

fn fixed<const N: usize>(field: &'static str, bytes: &[u8]) -> Ep11Result<[u8; N]> {
    bytes.try_into().map_err(|_| Ep11Error::LengthMismatch {
        field,
        expected: N,
        actual: bytes.len(),
    })
}

/// One administrative command, ready to be signed.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBlk {
    pub cmd_id: CmdId,
    pub domain_id: DomainId,
    pub module_id: [u8; MODULE_ID_BYTES],
    pub transaction_counter: [u8; TRANSACTION_COUNTER_BYTES],
    pub cmd_input: Vec<u8>,
}

impl AdminBlk {
    #[must_use]
    pub fn new(
        cmd_id: CmdId,
        domain_id: DomainId,
        module_id: [u8; MODULE_ID_BYTES],
        transaction_counter: u128,
        cmd_input: Vec<u8>,
    ) -> Self {
        Self {
            cmd_id,
            domain_id,
            module_id,
            transaction_counter: transaction_counter.to_be_bytes(),
            cmd_input,
        }
    }

    #[must_use]
    pub fn counter(&self) -> u128 {
        u128::from_be_bytes(self.transaction_counter)
    }

    /// SEQUENCE of five OCTET STRINGs; this is the byte string administrators sign.
    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        asn1::encode_sequence(&[
            &asn1::encode_octet_string(&self.cmd_id.as_u32().to_be_bytes()),
            &asn1::encode_octet_string(self.domain_id.as_bytes()),
            &asn1::encode_octet_string(&self.module_id),
            &asn1::encode_octet_string(&self.transaction_counter),
            &asn1::encode_octet_string(&self.cmd_input),
        ])
    }

    pub fn from_der(der: &[u8]) -> Ep11Result<Self> {
        let fields = asn1::decode_sequence_of_octet_strings(der)?;
        let [cmd, domain, module, counter, input] = fields.as_slice() else {
            return Err(Ep11Error::Asn1Error(format!(
                "admin block holds {} fields, expected 5",
                fields.len()
            )));
        };
        Ok(Self {
            cmd_id: CmdId::from_u32(u32::from_be_bytes(fixed("command id", cmd)?))?,
            domain_id: DomainId::from_bytes(domain)?,
            module_id: fixed("module id", module)?,
            transaction_counter: fixed("transaction counter", counter)?,
            cmd_input: input.to_vec(),
        })
    }
}

impl fmt::Debug for AdminBlk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AdminBlk(cmd={}, domain={}, counter={}, input_len={})",
            self.cmd_id,
            self.domain_id.index(),
            self.counter(),
            self.cmd_input.len()
        )
    }
}

/// Response block returned by the HSM for an admin command or query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRspBlk {
    pub cmd_id: CmdId,
    pub domain_id: DomainId,
    pub module_id: [u8; MODULE_ID_BYTES],
    pub transaction_counter: [u8; TRANSACTION_COUNTER_BYTES],
    pub return_code: u32,
    pub reason_code: u32,
    pub response_payload: Vec<u8>,
}

impl AdminRspBlk {
    /// Parse the response SEQUENCE at `offset`, returning the block and the next offset.
    pub fn parse(buf: &[u8], offset: usize) -> Ep11Result<(Self, usize)> {
        let (_, _, next) = asn1::decode_any(buf, offset)?;
        let fields = asn1::decode_sequence_of_octet_strings(&buf[offset..next])?;
        let [cmd, domain, module, counter, codes, payload] = fields.as_slice() else {
            return Err(Ep11Error::Asn1Error(format!(
                "admin response block holds {} fields, expected 6",
                fields.len()
            )));
        };
        let codes: [u8; RETURN_CODE_BYTES] = fixed("return code", codes)?;
        let rsp = Self {
            cmd_id: CmdId::from_u32(u32::from_be_bytes(fixed("command id", cmd)?))?,
            domain_id: DomainId::from_bytes(domain)?,
            module_id: fixed("module id", module)?,
            transaction_counter: fixed("transaction counter", counter)?,
            return_code: u32::from_be_bytes([codes[0], codes[1], codes[2], codes[3]]),
            reason_code: u32::from_be_bytes([codes[4], codes[5], codes[6], codes[7]]),
            response_payload: payload.to_vec(),
        };
        Ok((rsp, next))
    }

    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        let mut codes = Vec::with_capacity(RETURN_CODE_BYTES);
        codes.extend_from_slice(&self.return_code.to_be_bytes());
        codes.extend_from_slice(&self.reason_code.to_be_bytes());
        asn1::encode_sequence(&[
            &asn1::encode_octet_string(&self.cmd_id.as_u32().to_be_bytes()),
            &asn1::encode_octet_string(self.domain_id.as_bytes()),
            &asn1::encode_octet_string(&self.module_id),
            &asn1::encode_octet_string(&self.transaction_counter),
            &asn1::encode_octet_string(&codes),
            &asn1::encode_octet_string(&self.response_payload),
        ])
    }

    /// Turn a non-zero return code into an [`Ep11Error::Hsm`].
    pub fn check(self) -> Ep11Result<Self> {
        if self.return_code != 0 {
            return Err(Ep11Error::hsm(self.return_code, self.reason_code));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_id_encoding() {
        assert_eq!(DomainId::from_index(0).as_bytes(), &[0, 0, 0, 0]);
        assert_eq!(DomainId::from_index(0x0102).as_bytes(), &[0, 0, 1, 2]);
        assert_eq!(DomainId::from_index(84).index(), 84);
    }

    #[test]
    fn test_cmd_id_lookup() {
        assert_eq!(CmdId::from_u32(0x0001_000a).unwrap(), CmdId::GenerateWk);
        assert!(CmdId::from_u32(0x0003_0000).is_err());
        assert!(CmdId::QueryDeviceCertificate.is_query());
        assert!(!CmdId::CommitWk.is_query());
    }

    #[test]
    fn test_generate_wk_block_round_trip() {
        let blk = AdminBlk::new(
            CmdId::GenerateWk,
            DomainId::from_index(7),
            [0x11; MODULE_ID_BYTES],
            42,
            Vec::new(),
        );
        let der = blk.to_der();
        assert_eq!(der[0], 0x30);
        let parsed = AdminBlk::from_der(&der).unwrap();
        assert_eq!(parsed, blk);
        assert_eq!(parsed.counter(), 42);
        assert!(parsed.cmd_input.is_empty());
    }

    #[test]
    fn test_admin_blk_rejects_short_module_id() {
        let der = asn1::encode_sequence(&[
            &asn1::encode_octet_string(&CmdId::CommitWk.as_u32().to_be_bytes()),
            &asn1::encode_octet_string(&[0, 0, 0, 1]),
            &asn1::encode_octet_string(&[0u8; 15]),
            &asn1::encode_octet_string(&[0u8; 16]),
            &asn1::encode_octet_string(&[]),
        ]);
        let err = AdminBlk::from_der(&der).unwrap_err();
        assert!(matches!(err, Ep11Error::LengthMismatch { field: "module id", .. }));
    }

    #[test]
    fn test_response_check_maps_return_code() {
        let rsp = AdminRspBlk {
            cmd_id: CmdId::QueryDeviceCertificate,
            domain_id: DomainId::from_index(1),
            module_id: [0; MODULE_ID_BYTES],
            transaction_counter: [0; TRANSACTION_COUNTER_BYTES],
            return_code: 96,
            reason_code: 60,
            response_payload: Vec::new(),
        };
        let der = rsp.to_der();
        let (parsed, next) = AdminRspBlk::parse(&der, 0).unwrap();
        assert_eq!(next, der.len());
        assert!(parsed.check().unwrap_err().is_not_found());
    }
}
