//! JWT signing and verification.
//!
//! Two kinds of tokens pass through this service:
//!
//! - **Access tokens** (`tokenType = "accessToken"`) identify the requester
//!   via `sub`.
//! - **Primary auth tokens** (`tokenType = "primaryAuthToken"`) assert that an
//!   external authentication step succeeded and carry the authenticator to
//!   attach plus the issuing strategy.
//!
//! Both are issued elsewhere with the same trust key; [`JwtService::encode`]
//! exists for that issuer and for tests.

use std::fmt;
use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::identity::UserId;
use crate::types::Authenticator;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256 over a shared secret.
    HS256,
    /// RSA with SHA-256.
    RS256,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::RS256 => Algorithm::RS256,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Discriminator carried in the `tokenType` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    /// Single-use token produced by an external authentication step.
    PrimaryAuthToken,
    /// Bearer token identifying a requester.
    AccessToken,
    /// Any other or missing value.
    #[default]
    #[serde(other)]
    Unknown,
}

impl TokenType {
    /// Returns the claim value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryAuthToken => "primaryAuthToken",
            Self::AccessToken => "accessToken",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded token claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject user (access tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<UserId>,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp). Optional; `0` when absent.
    #[serde(default)]
    pub iat: i64,

    /// JWT ID, used to enforce single use of primary auth tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Token kind.
    #[serde(default)]
    pub token_type: TokenType,

    /// Authenticator to attach (primary auth tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_authenticator: Option<Authenticator>,

    /// Strategy (identity provider) that issued the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl TokenClaims {
    /// Claims for an access token identifying `subject`.
    #[must_use]
    pub fn access(issuer: impl Into<String>, subject: UserId, ttl: Duration) -> Self {
        let mut claims = Self::base(issuer, TokenType::AccessToken, ttl);
        claims.sub = Some(subject);
        claims
    }

    /// Claims for a primary auth token carrying `authenticator`.
    #[must_use]
    pub fn primary_auth(
        issuer: impl Into<String>,
        authenticator: Authenticator,
        strategy: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let mut claims = Self::base(issuer, TokenType::PrimaryAuthToken, ttl);
        claims.primary_authenticator = Some(authenticator);
        claims.strategy = Some(strategy.into());
        claims
    }

    fn base(issuer: impl Into<String>, token_type: TokenType, ttl: Duration) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: None,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            iat: now,
            jti: Some(uuid::Uuid::new_v4().to_string()),
            token_type,
            primary_authenticator: None,
            strategy: None,
        }
    }

    /// Moves the expiration by `seconds` (negative values move it into the past).
    #[must_use]
    pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
        self.exp = OffsetDateTime::now_utc().unix_timestamp() + seconds;
        self
    }

    /// Replaces the token type.
    #[must_use]
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }
}

// ============================================================================
// Signing Key
// ============================================================================

/// Key material for signing and verification.
pub struct SigningKey {
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Creates an `HS256` key from a shared secret.
    #[must_use]
    pub fn hmac(secret: &[u8]) -> Self {
        Self {
            algorithm: SigningAlgorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Loads an `RS256` key pair from PEM strings.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn rsa_from_pem(private_pem: &str, public_pem: &str) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            algorithm: SigningAlgorithm::RS256,
            encoding_key,
            decoding_key,
        })
    }

    /// Generates an ephemeral `RS256` key pair.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa() -> Result<Self, JwtError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Self::rsa_from_pem(&private_pem, &public_pem)
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Service for encoding and decoding JWT tokens.
///
/// This service is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
#[derive(Debug)]
pub struct JwtService {
    signing_key: SigningKey,
    issuer: String,
    leeway: Duration,
}

impl JwtService {
    /// Creates a new JWT service.
    #[must_use]
    pub fn new(signing_key: SigningKey, issuer: impl Into<String>) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
            leeway: Duration::ZERO,
        }
    }

    /// Sets the clock skew tolerated for `exp`.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());
        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes a JWT, checking signature, issuer and expiration.
    ///
    /// # Errors
    /// Returns an error if decoding or validation fails.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = self.leeway.as_secs();

        decode(token, &self.signing_key.decoding_key, &validation).map_err(JwtError::from)
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.signing_key.algorithm
    }
}

// ============================================================================
// Tests
// ============================================================================
