//! Token handling.
//!
//! - [`jwt`]: JWT encoding/decoding and signing keys
//! - [`verifier`]: the validate/parse contract used by routes and the provisioning flow

pub mod jwt;
pub mod verifier;

pub use jwt::{JwtError, JwtService, SigningAlgorithm, SigningKey, TokenClaims, TokenType};
pub use verifier::TokenVerifier;
