//! Compact token signing and verification

use std::time::Duration;

use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header, encode};
use tracing::{debug, error, warn};

use super::keys::{KeySet, SigningKey};
use crate::claims::Claims;
use crate::error::TokenError;

/// Asymmetric algorithms accepted on verification.
pub const ASYMMETRIC_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// Default clock skew tolerance for `exp`.
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

/// Signs claim sets and verifies compact tokens against a [`KeySet`].
///
/// Verification checks the signature, and `exp` when present; what the claims mean is up
/// to the caller.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    allowed_algorithms: Vec<Algorithm>,
    leeway: Duration,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self {
            allowed_algorithms: ASYMMETRIC_ALGORITHMS.to_vec(),
            leeway: DEFAULT_LEEWAY,
        }
    }
}

impl TokenCodec {
    /// Codec with the default allowlist and leeway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set clock skew tolerance.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Restrict accepted algorithms. Symmetric algorithms are ignored.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms
            .into_iter()
            .filter(|alg| ASYMMETRIC_ALGORITHMS.contains(alg))
            .collect();
        self
    }

    /// Sign `claims` with `key`; the header carries the key id.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Signing`] if the key cannot produce a signature.
    pub fn issue(&self, claims: &Claims, key: &SigningKey) -> Result<String, TokenError> {
        let mut header = Header::new(key.algorithm());
        header.kid = Some(key.key_id().to_string());

        encode(&header, claims, key.encoding_key()).map_err(|e| {
            error!(key_id = %key.key_id(), error = %e, "Failed to sign token");
            TokenError::Signing(e)
        })
    }

    /// Verify `token` against `keys` and return its claims.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Malformed`] if the header cannot be decoded
    /// - [`TokenError::AlgorithmNotAllowed`] for symmetric or unlisted algorithms, or an
    ///   algorithm other than the key's declared one
    /// - [`TokenError::MissingKeyId`] / [`TokenError::UnknownKeyId`] for key lookup
    /// - [`TokenError::Verification`] for bad signatures and expired tokens
    pub fn verify(&self, token: &str, keys: &KeySet) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode token header");
            TokenError::Malformed(e.to_string())
        })?;

        if !self.allowed_algorithms.contains(&header.alg) {
            warn!(algorithm = ?header.alg, "Token algorithm not allowed");
            return Err(TokenError::AlgorithmNotAllowed(format!("{:?}", header.alg)));
        }

        let key_id = header.kid.as_deref().ok_or_else(|| {
            warn!("Token header has no kid");
            TokenError::MissingKeyId
        })?;

        let jwk = keys.find(key_id).ok_or_else(|| {
            warn!(key_id = %key_id, "Key id not found in key set");
            TokenError::UnknownKeyId(key_id.to_string())
        })?;

        if let Some(declared) = jwk.common.key_algorithm
            && signing_algorithm(declared) != Some(header.alg)
        {
            warn!(
                key_id = %key_id,
                declared = ?declared,
                algorithm = ?header.alg,
                "Token algorithm does not match key"
            );
            return Err(TokenError::AlgorithmNotAllowed(format!("{:?}", header.alg)));
        }

        let decoding_key = DecodingKey::from_jwk(jwk).map_err(|e| {
            error!(key_id = %key_id, error = %e, "Failed to create decoding key from JWK");
            TokenError::InvalidKey(e.to_string())
        })?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway.as_secs();
        validation.validate_aud = false;
        // exp is checked when present but not required
        validation.set_required_spec_claims::<&str>(&[]);

        let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(key_id = %key_id, error = %e, "Token verification failed");
            TokenError::Verification(e)
        })?;

        debug!(key_id = %key_id, algorithm = ?header.alg, "Token verified");
        Ok(data.claims)
    }
}

fn signing_algorithm(key: KeyAlgorithm) -> Option<Algorithm> {
    match key {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}
