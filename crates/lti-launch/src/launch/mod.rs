//! LTI launch flows
//!
//! ```text
//!  platform                                        tool
//!  ────────                                        ────
//!  LaunchRequestBuilder ── LoginInitiation ──────▶ initiate_login_url
//!                                                      │
//!  LaunchAuthenticator ◀── AuthenticationRequest ──────┘
//!        │
//!        └── AuthenticationResponse (id_token) ──▶ redirect_uri
//! ```
//!
//! LTI 1.0/1.1 tools skip the round trip; the builder hands back the flat payload.

pub mod authenticator;
pub mod builder;
pub mod request;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::claims::{ClaimConverter, FlatParams};
use crate::config::{ConfigError, InstanceConfig, PlatformConfig, SigningAlgorithm};
use crate::jwt::{KeySet, SigningKey, TokenCodec};
use crate::vocabulary::Vocabulary;

pub use authenticator::LaunchAuthenticator;
pub use builder::{
    DeepLinkingSettings, LaunchMessageType, LaunchPresentation, LaunchRequest,
    LaunchRequestBuilder,
};
pub use request::{AuthenticationRequest, AuthenticationResponse, LoginInitiation};

/// Progress of one authentication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// Request received, nothing checked
    ReceivedRequest,
    /// Literal protocol fields accepted
    StaticallyValidated,
    /// Message hint verified
    HintDecoded,
    /// Tool registration resolved and matched
    RegistrationLoaded,
    /// User authenticated
    UserAuthenticated,
    /// Claims substituted and merged
    ClaimsAssembled,
    /// id_token signed
    TokenIssued,
    /// Terminal failure
    Rejected,
}

impl LaunchState {
    /// Stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReceivedRequest => "received_request",
            Self::StaticallyValidated => "statically_validated",
            Self::HintDecoded => "hint_decoded",
            Self::RegistrationLoaded => "registration_loaded",
            Self::UserAuthenticated => "user_authenticated",
            Self::ClaimsAssembled => "claims_assembled",
            Self::TokenIssued => "token_issued",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, read-only platform state: issuer, keys, codec and converter.
#[derive(Debug, Clone)]
pub struct Platform {
    issuer: String,
    signing_key: Arc<SigningKey>,
    key_set: Arc<KeySet>,
    codec: TokenCodec,
    converter: Arc<ClaimConverter>,
    instance: InstanceConfig,
    hint_lifetime: Duration,
    id_token_lifetime: Duration,
}

impl Platform {
    /// Platform signing with `signing_key` and verifying against its public half.
    pub fn new(issuer: impl Into<String>, signing_key: SigningKey) -> Self {
        let key_set = KeySet::from_signing_keys([&signing_key]);
        Self {
            issuer: issuer.into(),
            signing_key: Arc::new(signing_key),
            key_set: Arc::new(key_set),
            codec: TokenCodec::new(),
            converter: Arc::new(ClaimConverter::new(Arc::new(Vocabulary::standard()))),
            instance: InstanceConfig::default(),
            hint_lifetime: Duration::from_secs(600),
            id_token_lifetime: Duration::from_secs(60),
        }
    }

    /// Build a platform from configuration, loading the private key from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the key file cannot be read or parsed.
    pub fn from_config(config: &PlatformConfig) -> Result<Self, ConfigError> {
        let pem = config.read_private_key()?;
        let signing_key = match config.key_algorithm {
            SigningAlgorithm::RS256 => SigningKey::from_rsa_pem(&config.key_id, &pem)?,
            SigningAlgorithm::ES256 => SigningKey::from_ec_pem(&config.key_id, &pem)?,
        };

        Ok(Self::new(&config.issuer, signing_key)
            .with_instance(config.instance.clone())
            .with_lifetimes(
                Duration::from_secs(config.hint_lifetime_secs),
                Duration::from_secs(config.id_token_lifetime_secs),
            )
            .with_codec(TokenCodec::new().with_leeway(Duration::from_secs(config.leeway_secs))))
    }

    /// Replace the key set hints are verified against (e.g. during key rotation).
    pub fn with_key_set(mut self, key_set: KeySet) -> Self {
        self.key_set = Arc::new(key_set);
        self
    }

    /// Set platform instance details.
    pub fn with_instance(mut self, instance: InstanceConfig) -> Self {
        self.instance = instance;
        self
    }

    /// Set hint and id_token lifetimes.
    pub fn with_lifetimes(mut self, hint: Duration, id_token: Duration) -> Self {
        self.hint_lifetime = hint;
        self.id_token_lifetime = id_token;
        self
    }

    /// Replace the token codec.
    pub fn with_codec(mut self, codec: TokenCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Issuer.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Key set hints are verified against.
    pub fn key_set(&self) -> &KeySet {
        &self.key_set
    }

    /// Token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Claim converter.
    pub fn converter(&self) -> &ClaimConverter {
        &self.converter
    }

    /// Instance details.
    pub fn instance(&self) -> &InstanceConfig {
        &self.instance
    }

    /// Hint lifetime.
    pub fn hint_lifetime(&self) -> Duration {
        self.hint_lifetime
    }

    /// id_token lifetime.
    pub fn id_token_lifetime(&self) -> Duration {
        self.id_token_lifetime
    }

    /// `tool_consumer_*` parameters describing this instance.
    pub(crate) fn instance_params(&self) -> FlatParams {
        let instance = &self.instance;
        [
            ("tool_consumer_instance_name", &instance.name),
            ("tool_consumer_instance_guid", &instance.guid),
            (
                "tool_consumer_info_product_family_code",
                &instance.product_family_code,
            ),
            ("tool_consumer_info_version", &instance.version),
            ("tool_consumer_instance_contact_email", &instance.contact_email),
            ("tool_consumer_instance_url", &instance.url),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect()
    }
}

/// Seconds since the epoch.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// `exp` for a token issued at `issued_at`; saturates instead of overflowing.
pub(crate) fn expires_at(issued_at: i64, lifetime: Duration) -> i64 {
    i64::try_from(lifetime.as_secs()).map_or(i64::MAX, |secs| issued_at.saturating_add(secs))
}
