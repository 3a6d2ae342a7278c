//! Authentication configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "https://sso.example.com"
//!
//! [auth.signing]
//! algorithm = "HS256"
//! secret = "a-secret-of-at-least-thirty-two-bytes"
//!
//! [auth.primary_token]
//! single_use = true
//! leeway = "30s"
//! cleanup_interval = "5m"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::token::jwt::{SigningAlgorithm, SigningKey};

/// Minimum length of an HMAC signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Root authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer expected in the `iss` claim of every accepted token.
    pub issuer: String,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Primary auth token handling.
    pub primary_token: PrimaryTokenConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            signing: SigningConfig::default(),
            primary_token: PrimaryTokenConfig::default(),
        }
    }
}

/// Token signing configuration.
///
/// `HS256` verifies with a shared secret. `RS256` reads PEM key files; when
/// none are configured an ephemeral key pair is generated at startup, which
/// is only useful for local development.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Shared secret for `HS256`.
    pub secret: Option<String>,

    /// PEM-encoded private key for `RS256`.
    pub private_key_path: Option<PathBuf>,

    /// PEM-encoded public key for `RS256`.
    pub public_key_path: Option<PathBuf>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: SigningAlgorithm::RS256,
            secret: None,
            private_key_path: None,
            public_key_path: None,
        }
    }
}

/// Primary auth token handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrimaryTokenConfig {
    /// Reject a primary auth token presented a second time.
    pub single_use: bool,

    /// Clock skew tolerated when checking `exp`.
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,

    /// How often consumed token ids past their expiry are pruned.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for PrimaryTokenConfig {
    fn default() -> Self {
        Self {
            single_use: true,
            leeway: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the issuer is empty, an `HS256` secret is
    /// missing or shorter than [`MIN_SECRET_LEN`], or only one of the two
    /// `RS256` key paths is set, or the cleanup interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.primary_token.cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "auth.primary_token.cleanup_interval must be > 0".to_string(),
            ));
        }

        match self.signing.algorithm {
            SigningAlgorithm::HS256 => {
                let secret = self
                    .signing
                    .secret
                    .as_deref()
                    .ok_or_else(|| ConfigError::Missing("auth.signing.secret".to_string()))?;
                if secret.len() < MIN_SECRET_LEN {
                    return Err(ConfigError::InvalidValue(format!(
                        "auth.signing.secret must be at least {MIN_SECRET_LEN} bytes"
                    )));
                }
            }
            SigningAlgorithm::RS256 => {
                if self.signing.private_key_path.is_some() != self.signing.public_key_path.is_some()
                {
                    return Err(ConfigError::InvalidValue(
                        "auth.signing.private_key_path and public_key_path must be set together"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Builds the signing key described by [`SigningConfig`].
    ///
    /// `RS256` without key paths generates an ephemeral key pair; tokens
    /// signed by it do not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing or a PEM file cannot
    /// be read or parsed.
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        match self.signing.algorithm {
            SigningAlgorithm::HS256 => {
                let secret = self
                    .signing
                    .secret
                    .as_deref()
                    .ok_or_else(|| ConfigError::Missing("auth.signing.secret".to_string()))?;
                Ok(SigningKey::hmac(secret.as_bytes()))
            }
            SigningAlgorithm::RS256 => match (
                &self.signing.private_key_path,
                &self.signing.public_key_path,
            ) {
                (Some(private_path), Some(public_path)) => {
                    let private_pem = read_pem(private_path)?;
                    let public_pem = read_pem(public_path)?;
                    SigningKey::rsa_from_pem(&private_pem, &public_pem)
                        .map_err(|e| ConfigError::InvalidValue(e.to_string()))
                }
                _ => {
                    tracing::warn!(
                        "No RS256 key configured, generating an ephemeral key pair (development only)"
                    );
                    SigningKey::generate_rsa().map_err(|e| ConfigError::InvalidValue(e.to_string()))
                }
            },
        }
    }
}

fn read_pem(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|e| ConfigError::InvalidValue(format!("{}: {e}", path.display())))
}
