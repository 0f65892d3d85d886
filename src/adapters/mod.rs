//! Adapter layer modules for external system integration.
//!
//! Provides adapters for:
//! - HSM request transport (`HsmTransport`)
//! - OpenSSL-backed administrator key files

pub mod key_file;
pub mod transport;
