//! EP11 administration CLI
//!
//! Offline tooling around the library: inspect OA certificates, verify a
//! certificate chain saved to disk, decode domain info payloads, and manage
//! the configuration file.

use clap::{Parser, Subcommand};
use ep11_tke::{
    domain::constants::{HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND},
    domain::oa::OaCertificate,
    parse_domain_info_rsp, AnyOaCertificate, CertificateSource, ConfigManager, Ep11Error,
    Ep11Result,
};
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ep11-tke")]
#[command(about = "EP11 domain administration and OA certificate tooling")]
#[command(long_about = "
EP11 TKE - administration helpers for EP11 crypto module domains

EXAMPLES:
    # Show the sections of a device certificate
    ep11-tke inspect-cert cert-0.bin

    # Verify a chain saved as cert-0.bin, cert-1.bin, ... in ./chain
    ep11-tke verify-chain ./chain --start 0

    # Decode a domain info payload
    ep11-tke domain-info 00000005...

    # Create the configuration file
    ep11-tke config init

ENVIRONMENT VARIABLES:
    TKE_SIGNSERV_URL  Remote signing service; all keys are treated as P-521 EC keys
    RUST_LOG          Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an OA2 or OA3 certificate and print its sections
    InspectCert {
        /// Raw certificate file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Verify a certificate chain stored as cert-<index>.bin files
    VerifyChain {
        /// Directory holding the certificates
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Index of the first certificate
        #[arg(long, default_value_t = 0)]
        start: u32,
    },

    /// Decode a hex domain info response payload
    DomainInfo {
        /// Payload as hex
        #[arg(value_name = "HEX")]
        payload: String,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,
}

/// Certificates saved as `cert-<index>.bin`; a missing file reads as "not found".
struct DirectorySource {
    dir: PathBuf,
}

impl CertificateSource for DirectorySource {
    fn query_device_certificate(&self, index: u32) -> Ep11Result<Vec<u8>> {
        let path = certificate_path(&self.dir, index);
        if !path.exists() {
            log::debug!("{} does not exist", path.display());
            return Err(Ep11Error::hsm(HSM_RC_NOT_FOUND, HSM_RSN_NOT_FOUND));
        }
        Ok(std::fs::read(&path)?)
    }
}

fn certificate_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("cert-{index}.bin"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new().into_diagnostic()?,
    };

    match cli.command {
        Commands::InspectCert { file } => inspect_certificate(&file),
        Commands::VerifyChain { dir, start } => verify_chain(&config_manager, dir, start),
        Commands::DomainInfo { payload } => decode_domain_info(&payload),
        Commands::Config(cmd) => handle_config_command(&config_manager, cmd),
    }
}

fn inspect_certificate(file: &Path) -> Result<()> {
    let data = std::fs::read(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", file.display()))?;
    let any = AnyOaCertificate::parse(&data)?;
    let cert = any.as_certificate();

    println!("{} certificate, {} bytes", any.format_name(), data.len());
    println!("  Subject SKI: {}", cert.subject_ski());
    println!("  Signer SKI:  {}", cert.signer_ski());
    println!("  Self-signed: {}", cert.subject_ski() == cert.signer_ski());
    println!("  Signed body: {} bytes", cert.ecc_body().len());
    println!("  Sections:");
    for section in cert.sections() {
        println!(
            "    {:<28} {:>5}..{:<5} ({} bytes)",
            section.name,
            section.range.start,
            section.range.end,
            section.range.len()
        );
    }
    Ok(())
}

fn verify_chain(config_manager: &ConfigManager, dir: PathBuf, start: u32) -> Result<()> {
    let config = config_manager.load()?;
    let anchor = config.trust_anchor()?;
    let source = DirectorySource { dir };

    let data = source
        .query_device_certificate(start)
        .wrap_err_with(|| format!("No certificate at index {start}"))?;
    match AnyOaCertificate::parse(&data)? {
        AnyOaCertificate::Oa3(cert) => {
            ep11_tke::services::verify_oa3_certificate(&source, &anchor, start, &cert)?;
        }
        AnyOaCertificate::Oa2(cert) => {
            ep11_tke::services::verify_oa2_certificate(&source, &anchor, start, &cert)?;
        }
    }

    println!("Certificate chain from index {start} verified against the trust anchor");
    Ok(())
}

fn decode_domain_info(payload: &str) -> Result<()> {
    let bytes = hex::decode(payload.trim())
        .into_diagnostic()
        .wrap_err("Domain info payload is not valid hex")?;
    let info = parse_domain_info_rsp(&bytes)?;

    println!("Domain {}", info.domain);
    println!(
        "  Current wrapping key: {} (MKVP {})",
        info.current_status,
        hex::encode(info.current_mkvp.as_bytes())
    );
    println!(
        "  New wrapping key:     {} (MKVP {})",
        info.new_status,
        hex::encode(info.new_mkvp.as_bytes())
    );
    println!("  Flags: 0x{:08x}", info.flags);
    Ok(())
}

fn handle_config_command(config_manager: &ConfigManager, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let config = config_manager.load()?;
            println!("Configuration: {}", config_manager.path().display());
            println!("  Signature keys: {}", config.signature_keys.len());
            for key in &config.signature_keys {
                println!("    {} (SKI {})", key.path, key.ski);
            }
            match config.effective_signing_service() {
                Some(url) => println!("  Signing service: {url}"),
                None => println!("  Signing service: none (local key files)"),
            }
            match &config.trust_anchor {
                Some(anchor) => println!("  Trust anchor SKI: {}", anchor.ski),
                None => println!("  Trust anchor: not configured"),
            }
        }
        ConfigCommands::Init => {
            config_manager.load_or_create_default()?;
            println!("Configuration ready at {}", config_manager.path().display());
        }
    }
    Ok(())
}
