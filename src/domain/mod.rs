//! Domain layer: EP11 wire structures and OA certificate layouts.
//!
//! Pure codecs over byte slices with no I/O.

pub mod admin_blk;
pub mod asn1;
pub mod constants;
pub mod domain_info;
pub mod oa;
pub mod recipient_info;
pub mod signer_info;
pub mod types;
