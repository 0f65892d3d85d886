//! Administrative operations on an HSM domain.
//!
//! Every operation builds an [`AdminBlk`], signs it with the configured
//! administrator keys (queries stay unsigned), submits it through the
//! caller's [`HsmTransport`] and parses the response block. Wrapping key
//! changes follow the register state machine:
//!
//! ```text
//! create_random_wk   new register: empty -> full, uncommitted
//! commit_pending_wk  new register: full, uncommitted -> full, committed
//! finalize_wk        committed new key becomes the current key
//! ```

use std::cell::Cell;

use crate::adapters::transport::{HsmTransport, HtpRequest, RequestKind};
use crate::domain::admin_blk::{AdminBlk, AdminRspBlk, CmdId, DomainId};
use crate::domain::asn1;
use crate::domain::domain_info::{parse_domain_info_rsp, DomainInfoRspInfo, MkStatus};
use crate::domain::oa::AnyOaCertificate;
use crate::domain::signer_info::{get_ecc_signer_info, SignatureKey, SignerInfo};
use crate::domain::types::DomainEntry;
use crate::infra::error::{Ep11Error, Ep11Result};
use crate::services::chain_verifier::{
    verify_oa2_certificate, verify_oa3_certificate, CertificateSource, TrustAnchor,
};
use crate::services::request_builder::{
    build_query_request, build_signed_admin_request, SignatureProvider,
};

/// Parsed admin response plus the HSM's ECC signature over it, when present.
#[derive(Debug, Clone)]
pub struct AdminResponse {
    pub block: AdminRspBlk,
    pub signer_info: Option<SignerInfo>,
}

/// Decode a hex `SEQUENCE { AdminRspBlk, SignerInfo... }` response.
///
/// A non-zero return code becomes [`Ep11Error::Hsm`] before any SignerInfo
/// is looked at, so error responses signed only with Dilithium still report
/// their return and reason codes.
pub fn parse_admin_response(response: &str) -> Ep11Result<AdminResponse> {
    let raw = hex::decode(response.trim())
        .map_err(|e| Ep11Error::Transport(format!("response is not valid hex: {e}")))?;
    let (content, end) = asn1::decode_sequence(&raw, 0)?;
    if end != raw.len() {
        return Err(Ep11Error::Asn1Error(format!(
            "{} trailing bytes after admin response",
            raw.len() - end
        )));
    }
    let (block, next) = AdminRspBlk::parse(content, 0)?;
    // rc/rsn win over whatever signatures follow
    let block = block.check()?;
    let signer_info = if next < content.len() {
        Some(get_ecc_signer_info(&content[next..])?)
    } else {
        None
    };
    Ok(AdminResponse { block, signer_info })
}

pub struct AdminService<T: HsmTransport, P: SignatureProvider> {
    transport: T,
    provider: P,
    keys: Vec<SignatureKey>,
    counter: Cell<u128>,
}

impl<T: HsmTransport, P: SignatureProvider> AdminService<T, P> {
    /// `initial_counter` seeds the admin transaction counter; it must exceed
    /// the last counter the domain accepted.
    pub fn new(transport: T, provider: P, keys: Vec<SignatureKey>, initial_counter: u128) -> Self {
        Self {
            transport,
            provider,
            keys,
            counter: Cell::new(initial_counter),
        }
    }

    #[must_use]
    pub fn transaction_counter(&self) -> u128 {
        self.counter.get()
    }

    fn next_block(&self, domain: &DomainEntry, cmd_id: CmdId, input: Vec<u8>) -> Ep11Result<AdminBlk> {
        let counter = self.counter.get();
        self.counter.set(counter.wrapping_add(1));
        Ok(AdminBlk::new(
            cmd_id,
            DomainId::from_index(domain.domain_index),
            domain.module_id_bytes()?,
            counter,
            input,
        ))
    }

    fn exchange(&self, request: HtpRequest, cmd_id: CmdId) -> Ep11Result<AdminResponse> {
        log::info!("Submitting {cmd_id} to {}", request.target);
        let response = self.transport.submit(&request)?;
        let parsed = parse_admin_response(&response)?;
        if parsed.block.cmd_id != cmd_id {
            return Err(Ep11Error::Transport(format!(
                "response is for {}, expected {cmd_id}",
                parsed.block.cmd_id
            )));
        }
        Ok(parsed)
    }

    /// Sign and submit an administrative command.
    pub fn submit_command(
        &self,
        domain: &DomainEntry,
        cmd_id: CmdId,
        input: Vec<u8>,
    ) -> Ep11Result<AdminResponse> {
        let blk = self.next_block(domain, cmd_id, input)?;
        let body = build_signed_admin_request(&blk, &self.keys, &self.provider)?;
        self.exchange(
            HtpRequest::new(RequestKind::AdminCommand, domain.clone(), body),
            cmd_id,
        )
    }

    /// Submit an unsigned admin query and return its response payload.
    pub fn submit_query(
        &self,
        domain: &DomainEntry,
        cmd_id: CmdId,
        input: Vec<u8>,
    ) -> Ep11Result<Vec<u8>> {
        let blk = self.next_block(domain, cmd_id, input)?;
        let body = build_query_request(&blk);
        let response = self.exchange(
            HtpRequest::new(RequestKind::AdminQuery, domain.clone(), body),
            cmd_id,
        )?;
        Ok(response.block.response_payload)
    }

    /// Install an administrator certificate in the domain.
    pub fn add_admin(&self, domain: &DomainEntry, admin_certificate: &[u8]) -> Ep11Result<()> {
        if admin_certificate.is_empty() {
            return Err(Ep11Error::InvalidInput(
                "administrator certificate is empty".to_string(),
            ));
        }
        self.submit_command(domain, CmdId::DomainAdminLogin, admin_certificate.to_vec())?;
        log::info!("Administrator added to {domain}");
        Ok(())
    }

    pub fn zeroize_domain(&self, domain: &DomainEntry) -> Ep11Result<()> {
        self.submit_command(domain, CmdId::DomainZeroize, Vec::new())?;
        log::info!("Zeroized {domain}");
        Ok(())
    }

    /// Generate a random wrapping key into the pending register.
    pub fn create_random_wk(&self, domain: &DomainEntry) -> Ep11Result<()> {
        self.submit_command(domain, CmdId::GenerateWk, Vec::new())?;
        log::info!("Generated a random pending wrapping key in {domain}");
        Ok(())
    }

    /// Commit the pending wrapping key by re-submitting its verification pattern.
    pub fn commit_pending_wk(&self, domain: &DomainEntry) -> Ep11Result<()> {
        let info = self.query_domain_info(domain)?;
        if info.new_status != MkStatus::FullUncommitted {
            return Err(Ep11Error::InvalidInput(format!(
                "cannot commit: new wrapping key register of {domain} is {}",
                info.new_status
            )));
        }
        self.submit_command(domain, CmdId::CommitWk, info.new_mkvp.as_bytes().to_vec())?;
        log::info!("Committed pending wrapping key in {domain}");
        Ok(())
    }

    /// Move a committed pending wrapping key into the current register.
    pub fn finalize_wk(&self, domain: &DomainEntry) -> Ep11Result<()> {
        let info = self.query_domain_info(domain)?;
        if info.new_status != MkStatus::FullCommitted {
            return Err(Ep11Error::InvalidInput(format!(
                "cannot finalize: new wrapping key register of {domain} is {}",
                info.new_status
            )));
        }
        self.submit_command(domain, CmdId::FinalizeWk, info.new_mkvp.as_bytes().to_vec())?;
        log::info!("Finalized wrapping key in {domain}");
        Ok(())
    }

    /// Query the master-key register state of the domain.
    pub fn query_domain_info(&self, domain: &DomainEntry) -> Ep11Result<DomainInfoRspInfo> {
        let request = HtpRequest::new(RequestKind::DomainInfo, domain.clone(), Vec::new());
        log::info!("Querying domain info of {domain}");
        let response = self.transport.submit(&request)?;
        let payload = hex::decode(response.trim())
            .map_err(|e| Ep11Error::Transport(format!("response is not valid hex: {e}")))?;
        parse_domain_info_rsp(&payload)
    }

    /// Fetch the raw OA certificate at `index`.
    pub fn query_device_certificate(&self, domain: &DomainEntry, index: u32) -> Ep11Result<Vec<u8>> {
        self.submit_query(domain, CmdId::QueryDeviceCertificate, index.to_be_bytes().to_vec())
    }

    /// Domain control point bitmask.
    pub fn query_control_points(&self, domain: &DomainEntry) -> Ep11Result<Vec<u8>> {
        self.submit_query(domain, CmdId::QueryDomainControlPoints, Vec::new())
    }

    /// Verify the device certificate at `index` and its chain up to `anchor`.
    pub fn verify_device_certificates(
        &self,
        domain: &DomainEntry,
        anchor: &TrustAnchor,
        index: u32,
    ) -> Ep11Result<()> {
        let source = DomainCertificates {
            service: self,
            domain,
        };
        let raw = source.query_device_certificate(index)?;
        match AnyOaCertificate::parse(&raw)? {
            AnyOaCertificate::Oa3(cert) => verify_oa3_certificate(&source, anchor, index, &cert),
            AnyOaCertificate::Oa2(cert) => verify_oa2_certificate(&source, anchor, index, &cert),
        }
    }
}

/// Certificate source bound to one domain of an [`AdminService`].
struct DomainCertificates<'s, T: HsmTransport, P: SignatureProvider> {
    service: &'s AdminService<T, P>,
    domain: &'s DomainEntry,
}

impl<T: HsmTransport, P: SignatureProvider> CertificateSource for DomainCertificates<'_, T, P> {
    fn query_device_certificate(&self, index: u32) -> Ep11Result<Vec<u8>> {
        self.service.query_device_certificate(self.domain, index)
    }
}
