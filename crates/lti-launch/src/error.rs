//! Error types for launch authentication and payload conversion.
//!
//! Lower layers have their own error enums ([`TokenError`], [`ContentItemError`]).
//! Everything the authenticator surfaces to a caller is an [`AuthenticationError`],
//! whose [`ErrorKind`] is the discriminator callers match on.

use std::fmt;

use thiserror::Error;

/// Result type for launch operations.
pub type Result<T> = std::result::Result<T, AuthenticationError>;

/// Boxed error returned by external collaborators (repositories, user authenticators).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while signing or verifying compact tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token header could not be decoded.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Header did not carry a key id.
    #[error("token header has no kid")]
    MissingKeyId,

    /// The key id is not present in the key set.
    #[error("unknown key id '{0}'")]
    UnknownKeyId(String),

    /// The header algorithm is not allowed or does not match the key.
    #[error("algorithm {0} not allowed")]
    AlgorithmNotAllowed(String),

    /// Signature or standard claim (exp) validation failed.
    #[error("verification failed: {0}")]
    Verification(#[source] jsonwebtoken::errors::Error),

    /// Token could not be produced.
    #[error("signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Key material could not be loaded or converted.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Key set document could not be parsed or serialized.
    #[error("invalid key set: {0}")]
    InvalidKeySet(#[from] serde_json::Error),
}

/// Errors raised by the content-item transform.
#[derive(Debug, Error)]
pub enum ContentItemError {
    /// Input was not valid JSON.
    #[error("malformed content items JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Fields of an inbound authentication request that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestField {
    /// `scope`
    Scope,
    /// `response_type`
    ResponseType,
    /// `response_mode`
    ResponseMode,
    /// `prompt`
    Prompt,
    /// `nonce`
    Nonce,
    /// `lti_message_hint`
    LtiMessageHint,
    /// `client_id`
    ClientId,
    /// `redirect_uri`
    RedirectUri,
}

impl RequestField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scope => "scope",
            Self::ResponseType => "response_type",
            Self::ResponseMode => "response_mode",
            Self::Prompt => "prompt",
            Self::Nonce => "nonce",
            Self::LtiMessageHint => "lti_message_hint",
            Self::ClientId => "client_id",
            Self::RedirectUri => "redirect_uri",
        }
    }
}

impl fmt::Display for RequestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminator for [`AuthenticationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A request field was malformed or out of policy.
    Validation(RequestField),
    /// The hint token failed cryptographic verification.
    Signature,
    /// The user authenticator reported failure.
    AuthenticationFailure,
    /// Content-item JSON was malformed.
    Parse,
    /// The tool registration could not be resolved.
    Registration,
    /// The outbound token could not be signed.
    Signing,
}

/// The single externally visible launch error.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// A request field violated the protocol.
    #[error("Invalid {field}: {detail}")]
    Validation {
        /// Offending field
        field: RequestField,
        /// Human-readable detail
        detail: String,
    },

    /// The `lti_message_hint` signature did not verify.
    #[error("Invalid lti_message_hint: {0}")]
    Signature(#[source] TokenError),

    /// The user could not be authenticated.
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// Malformed content items.
    #[error("Invalid content items: {0}")]
    Parse(#[from] ContentItemError),

    /// Registration lookup failed or found nothing.
    #[error("Tool registration unavailable: {0}")]
    Registration(String),

    /// The id_token could not be issued.
    #[error("Failed to issue id_token: {0}")]
    Signing(#[source] TokenError),
}

impl AuthenticationError {
    /// Build a validation error for `field`.
    pub fn invalid(field: RequestField, detail: impl Into<String>) -> Self {
        Self::Validation {
            field,
            detail: detail.into(),
        }
    }

    /// Discriminator for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { field, .. } => ErrorKind::Validation(*field),
            Self::Signature(_) => ErrorKind::Signature,
            Self::AuthenticationFailure(_) => ErrorKind::AuthenticationFailure,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Registration(_) => ErrorKind::Registration,
            Self::Signing(_) => ErrorKind::Signing,
        }
    }
}
