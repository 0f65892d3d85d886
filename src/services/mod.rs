//! Service layer module root.
//! Request signing, chain verification and domain administration.

pub mod admin;
pub mod chain_verifier;
pub mod error_messages;
pub mod request_builder;

pub use admin::{parse_admin_response, AdminResponse, AdminService};
pub use chain_verifier::{
    verify_ecdsa_p521, verify_oa2_certificate, verify_oa3_certificate, verify_oa_certificate_chain,
    CertificateSource, TrustAnchor, MAX_CHAIN_DEPTH,
};
pub use error_messages::hsm_error_message;
pub use request_builder::{
    build_query_request, build_signed_admin_request, create_signer_info, parse_admin_request,
    SignatureProvider,
};
