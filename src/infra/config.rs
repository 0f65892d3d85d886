//! Configuration management infrastructure.
//!
//! Stores the administrator signature keys, the optional remote signing
//! service and the OA trust anchor in a TOML file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::adapters::key_file::resolve_signature_key;
use crate::domain::signer_info::{KeyRef, SignatureKey};
use crate::domain::types::Ski;
use crate::infra::error::{Ep11Error, Ep11Result};
use crate::services::chain_verifier::TrustAnchor;

/// Environment variable naming a remote signing service.
pub const SIGNING_SERVICE_ENV: &str = "TKE_SIGNSERV_URL";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ep11Configuration {
    /// Administrator signature keys, in signing order
    #[serde(default)]
    pub signature_keys: Vec<SignatureKeyConfig>,

    /// Remote signing service; when set, keys are P-521 EC keys held remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_service_url: Option<String>,

    /// Root key terminating OA certificate chains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_anchor: Option<TrustAnchorConfig>,
}

/// One administrator signature key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureKeyConfig {
    /// PEM key file, or key name at the signing service
    pub path: String,

    /// Subject key identifier, 64 hex characters
    pub ski: String,

    /// Key file passphrase or signing service token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Trust anchor as hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAnchorConfig {
    pub ski: String,
    /// Uncompressed P-521 point (133 bytes)
    pub public_key: String,
}

impl Ep11Configuration {
    /// Signing service URL, with the environment taking precedence.
    #[must_use]
    pub fn effective_signing_service(&self) -> Option<String> {
        env::var(SIGNING_SERVICE_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.signing_service_url.clone())
    }

    /// Resolve every configured key into its [`SignatureKey`] variant.
    pub fn resolve_signature_keys(&self) -> Ep11Result<Vec<SignatureKey>> {
        let service = self.effective_signing_service();
        if let Some(url) = &service {
            log::info!("Using signing service at {url}");
        }
        self.resolve_signature_keys_with(service.is_some())
    }

    /// Resolve keys with an explicit signing-service decision.
    pub fn resolve_signature_keys_with(&self, signing_service: bool) -> Ep11Result<Vec<SignatureKey>> {
        self.signature_keys
            .iter()
            .map(|key| resolve_signature_key(key.key_ref()?, signing_service))
            .collect()
    }

    pub fn trust_anchor(&self) -> Ep11Result<TrustAnchor> {
        let anchor = self.trust_anchor.as_ref().ok_or_else(|| {
            Ep11Error::ConfigurationError("No trust anchor configured".to_string())
        })?;
        TrustAnchor::from_hex(&anchor.ski, &anchor.public_key)
    }
}

impl SignatureKeyConfig {
    pub fn key_ref(&self) -> Ep11Result<KeyRef> {
        Ok(KeyRef {
            location: self.path.clone(),
            ski: Ski::from_hex(&self.ski)?,
            token: self.token.clone(),
        })
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> Ep11Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Ep11Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("ep11-tke").join("config.toml"))
        } else {
            Ok(PathBuf::from("ep11-tke-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> Ep11Result<Ep11Configuration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = Ep11Configuration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> Ep11Result<Ep11Configuration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            Ep11Error::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: Ep11Configuration = toml::from_str(&content).map_err(|e| {
            Ep11Error::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &Ep11Configuration) -> Ep11Result<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());
        validate_config(config)?;

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Ep11Error::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            Ep11Error::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            Ep11Error::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }
}

/// Validate configuration values
fn validate_config(config: &Ep11Configuration) -> Ep11Result<()> {
    for key in &config.signature_keys {
        if key.path.trim().is_empty() {
            return Err(Ep11Error::ConfigurationError(
                "Signature key path must not be empty".to_string(),
            ));
        }
        Ski::from_hex(&key.ski).map_err(|e| {
            Ep11Error::ConfigurationError(format!("Invalid SKI for key {}: {e}", key.path))
        })?;
    }

    if let Some(url) = &config.signing_service_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Ep11Error::ConfigurationError(format!(
                "Signing service URL must use http or https: {url}"
            )));
        }
    }

    if config.trust_anchor.is_some() {
        config
            .trust_anchor()
            .map_err(|e| Ep11Error::ConfigurationError(format!("Invalid trust anchor: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Ep11Configuration {
        let mut public_key = vec![0x04];
        public_key.extend_from_slice(&[0x21; 132]);
        Ep11Configuration {
            signature_keys: vec![SignatureKeyConfig {
                path: "/keys/admin1.pem".to_string(),
                ski: "ab".repeat(32),
                token: None,
            }],
            signing_service_url: None,
            trust_anchor: Some(TrustAnchorConfig {
                ski: "cd".repeat(32),
                public_key: hex::encode(public_key),
            }),
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("nested").join("config.toml"));

        let config = sample();
        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.trust_anchor().unwrap().ski().to_hex(), "cd".repeat(32));
    }

    #[test]
    fn test_load_or_create_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(&path);

        let config = manager.load_or_create_default().unwrap();
        assert!(path.exists());
        assert!(config.signature_keys.is_empty());
        assert!(config.trust_anchor().is_err());
    }

    #[test]
    fn test_invalid_ski_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[[signature_keys]]\npath = \"/keys/a.pem\"\nski = \"abcd\"\n",
        )
        .unwrap();

        let err = ConfigManager::with_path(&path).load().unwrap_err();
        assert!(matches!(err, Ep11Error::ConfigurationError(_)));
    }

    #[test]
    fn test_invalid_signing_service_url_rejected() {
        let mut config = sample();
        config.signing_service_url = Some("ftp://signer".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_signing_service_forces_ec_keys() {
        let keys = sample().resolve_signature_keys_with(true).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(matches!(keys[0], SignatureKey::P521Ec(_)));
        assert_eq!(keys[0].key_ref().location, "/keys/admin1.pem");
    }

    #[test]
    fn test_missing_key_file_without_signing_service() {
        assert!(sample().resolve_signature_keys_with(false).is_err());
    }
}
