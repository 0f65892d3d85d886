//! EP11 administration library
//!
//! Builds and signs administrative commands for IBM EP11 crypto module
//! domains, parses their responses, and verifies the outbound
//! authentication (OA) certificate chains the modules present.
//!
//! Layout:
//! - [`domain`]: ASN.1 codec, admin blocks, SignerInfo / RecipientInfo,
//!   OA2 and OA3 certificate parsing, domain info decoding
//! - [`services`]: request signing, chain verification, [`AdminService`]
//! - [`adapters`]: transport seam and key-file signing
//! - [`infra`]: configuration and errors

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

pub use adapters::key_file::{resolve_signature_key, KeyFileSigner};
pub use adapters::transport::{HsmTransport, HtpRequest, RequestKind};
pub use domain::admin_blk::{AdminBlk, AdminRspBlk, CmdId, DomainId};
pub use domain::domain_info::{parse_domain_info_rsp, DomainInfoRspInfo, MkStatus};
pub use domain::oa::{AnyOaCertificate, Oa2Certificate, Oa3Certificate, OaCertificate};
pub use domain::recipient_info::create_recipient_info_p521_ec;
pub use domain::signer_info::{get_ecc_signer_info, KeyRef, SignatureKey, SignerInfo};
pub use domain::types::{DomainEntry, Mkvp, Ski};
pub use infra::config::{ConfigManager, Ep11Configuration};
pub use infra::error::{Ep11Error, Ep11Result};
pub use services::admin::AdminService;
pub use services::chain_verifier::{CertificateSource, TrustAnchor};
pub use services::request_builder::SignatureProvider;
