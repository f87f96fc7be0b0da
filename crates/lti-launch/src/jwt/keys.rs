//! Platform signing keys and published key sets
//!
//! A [`SigningKey`] pairs the private material used to sign with the public JWK the
//! platform publishes. [`KeySet`] is the JWKS document tokens are verified against.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, EllipticCurve, EllipticCurveKeyParameters,
    EllipticCurveKeyType, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse, RSAKeyParameters, RSAKeyType,
};
use jsonwebtoken::{Algorithm, EncodingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey as _, EncodePrivateKey as _};
use rsa::pkcs1::DecodeRsaPrivateKey as _;
use rsa::pkcs8::DecodePrivateKey as _;
use rsa::traits::PublicKeyParts as _;

use crate::error::TokenError;

/// Private signing material with its key id and public JWK.
#[derive(Clone)]
pub struct SigningKey {
    key_id: String,
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    public_jwk: Jwk,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Load an RSA private key (PKCS#8 or PKCS#1 PEM); tokens are signed with RS256.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if the PEM does not hold an RSA private key.
    pub fn from_rsa_pem(key_id: impl Into<String>, pem: &str) -> Result<Self, TokenError> {
        let private = rsa::RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| rsa::RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| TokenError::InvalidKey(format!("RSA private key: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("RSA private key: {e}")))?;

        let key_id = key_id.into();
        let public_jwk = Jwk {
            common: common_parameters(&key_id, KeyAlgorithm::RS256),
            algorithm: AlgorithmParameters::RSA(RSAKeyParameters {
                key_type: RSAKeyType::RSA,
                n: URL_SAFE_NO_PAD.encode(private.n().to_bytes_be()),
                e: URL_SAFE_NO_PAD.encode(private.e().to_bytes_be()),
            }),
        };

        Ok(Self {
            key_id,
            algorithm: Algorithm::RS256,
            encoding_key,
            public_jwk,
        })
    }

    /// Load a P-256 private key (PKCS#8 or SEC1 PEM); tokens are signed with ES256.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if the PEM does not hold a P-256 private key.
    pub fn from_ec_pem(key_id: impl Into<String>, pem: &str) -> Result<Self, TokenError> {
        let secret = p256::SecretKey::from_pkcs8_pem(pem)
            .or_else(|_| p256::SecretKey::from_sec1_pem(pem))
            .map_err(|e| TokenError::InvalidKey(format!("P-256 private key: {e}")))?;
        Self::from_p256(key_id.into(), &secret)
    }

    /// Generate a fresh ES256 key. Intended for development and tests.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKey`] if the generated key cannot be encoded.
    pub fn generate_es256(key_id: impl Into<String>) -> Result<Self, TokenError> {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        Self::from_p256(key_id.into(), &secret)
    }

    fn from_p256(key_id: String, secret: &p256::SecretKey) -> Result<Self, TokenError> {
        let der = secret
            .to_pkcs8_der()
            .map_err(|e| TokenError::InvalidKey(format!("P-256 private key: {e}")))?;
        let encoding_key = EncodingKey::from_ec_der(der.as_bytes());

        let point = secret.public_key().to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(TokenError::InvalidKey(
                "P-256 public key has no affine coordinates".into(),
            ));
        };

        let public_jwk = Jwk {
            common: common_parameters(&key_id, KeyAlgorithm::ES256),
            algorithm: AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters {
                key_type: EllipticCurveKeyType::EC,
                curve: EllipticCurve::P256,
                x: URL_SAFE_NO_PAD.encode(x),
                y: URL_SAFE_NO_PAD.encode(y),
            }),
        };

        Ok(Self {
            key_id,
            algorithm: Algorithm::ES256,
            encoding_key,
            public_jwk,
        })
    }

    /// Key id placed in token headers.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Signing algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public half of the key, as published.
    pub fn public_jwk(&self) -> &Jwk {
        &self.public_jwk
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

fn common_parameters(key_id: &str, algorithm: KeyAlgorithm) -> CommonParameters {
    CommonParameters {
        public_key_use: Some(PublicKeyUse::Signature),
        key_algorithm: Some(algorithm),
        key_id: Some(key_id.to_string()),
        ..Default::default()
    }
}

/// Public keys tokens are verified against.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySet {
    jwks: JwkSet,
}

impl Default for KeySet {
    fn default() -> Self {
        Self::from_keys([])
    }
}

impl KeySet {
    /// Build a set from individual keys.
    pub fn from_keys(keys: impl IntoIterator<Item = Jwk>) -> Self {
        Self {
            jwks: JwkSet {
                keys: keys.into_iter().collect(),
            },
        }
    }

    /// Publishable set for the given signing keys.
    pub fn from_signing_keys<'a>(keys: impl IntoIterator<Item = &'a SigningKey>) -> Self {
        Self::from_keys(keys.into_iter().map(|key| key.public_jwk().clone()))
    }

    /// Parse a JWKS document.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKeySet`] if the document is not a valid JWKS.
    pub fn from_json(json: &str) -> Result<Self, TokenError> {
        Ok(Self {
            jwks: serde_json::from_str(json)?,
        })
    }

    /// Serialize as a JWKS document.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidKeySet`] if serialization fails.
    pub fn to_json(&self) -> Result<String, TokenError> {
        Ok(serde_json::to_string_pretty(&self.jwks)?)
    }

    /// Key with the given id.
    pub fn find(&self, key_id: &str) -> Option<&Jwk> {
        self.jwks.find(key_id)
    }

    /// All keys.
    pub fn keys(&self) -> &[Jwk] {
        &self.jwks.keys
    }
}
