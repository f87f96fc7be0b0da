//! Core Launch Types
//!
//! Tool registrations, user identities and the collaborator traits the authenticator
//! depends on.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// LTI version a tool is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LtiVersion {
    /// LTI 1.0 (flat parameters)
    #[serde(rename = "1.0")]
    V1_0,
    /// LTI 1.1 (flat parameters)
    #[serde(rename = "1.1")]
    V1_1,
    /// LTI 1.3 (signed claims)
    #[serde(rename = "1.3.0")]
    V1_3,
}

impl LtiVersion {
    /// Wire value of the version.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_1 => "1.1",
            Self::V1_3 => "1.3.0",
        }
    }

    /// Wire value of the legacy `lti_version` parameter.
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Self::V1_0 => "LTI-1p0",
            Self::V1_1 => "LTI-1p1",
            Self::V1_3 => "1.3.0",
        }
    }

    /// Whether launches for this version go through the token-based login flow.
    pub fn uses_claims(&self) -> bool {
        matches!(self, Self::V1_3)
    }
}

impl fmt::Display for LtiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tool policy for disclosing a piece of personal data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisclosurePolicy {
    /// Never sent
    #[default]
    Never,
    /// Always sent
    Always,
    /// Left to the instructor placing the tool
    Delegate,
}

/// A tool as registered with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRegistration {
    /// Registration id, carried in the message hint
    pub id: String,
    /// Display name
    pub name: String,
    /// OAuth client id issued to the tool
    pub client_id: String,
    /// Newline-delimited list of allowed redirect URIs
    pub redirect_uris: String,
    /// Deployment id sent with every launch
    pub deployment_id: String,
    /// LTI version
    pub version: LtiVersion,
    /// Whether to disclose names
    #[serde(default)]
    pub send_name: DisclosurePolicy,
    /// Whether to disclose the email address
    #[serde(default)]
    pub send_email: DisclosurePolicy,
    /// Third-party login initiation endpoint
    #[serde(default)]
    pub initiate_login_url: Option<String>,
    /// Default launch target
    pub target_link_uri: String,
}

impl ToolRegistration {
    /// Registered redirect URIs, trimmed, blank lines skipped.
    pub fn redirect_uris(&self) -> impl Iterator<Item = &str> {
        self.redirect_uris
            .lines()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    /// Whether `uri` exactly equals one of the registered redirect URIs.
    pub fn allows_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris().any(|registered| registered == uri)
    }
}

/// The launching user as known to the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user id, sent as `sub`
    pub id: String,
    /// Login name
    pub username: Option<String>,
    /// Given name
    pub given_name: Option<String>,
    /// Family name
    pub family_name: Option<String>,
    /// Full display name
    pub full_name: Option<String>,
    /// Primary email
    pub email: Option<String>,
    /// Profile image URL
    pub picture: Option<String>,
    /// Institution-assigned identifier
    pub sourced_id: Option<String>,
}

impl UserIdentity {
    /// Create an identity with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Full name, or given and family name joined when both are present.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = &self.full_name {
            return Some(full.clone());
        }
        match (&self.given_name, &self.family_name) {
            (Some(given), Some(family)) => Some(format!("{given} {family}")),
            _ => None,
        }
    }
}

/// Outcome of authenticating the launching user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthResult {
    /// Whether authentication succeeded
    pub successful: bool,
    /// The authenticated user
    pub user: Option<UserIdentity>,
}

impl AuthResult {
    /// Successful authentication of `user`.
    pub fn success(user: UserIdentity) -> Self {
        Self {
            successful: true,
            user: Some(user),
        }
    }

    /// Failed authentication.
    pub fn failure() -> Self {
        Self::default()
    }
}

/// Authenticates the user named by a login hint.
#[async_trait]
pub trait UserAuthenticator: Send + Sync {
    /// Authenticate the user behind `login_hint`.
    async fn authenticate(&self, login_hint: &str) -> Result<AuthResult, CollaboratorError>;
}

/// Looks up tool registrations.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Fetch a registration by id.
    async fn get_by_id(&self, id: &str) -> Result<Option<ToolRegistration>, CollaboratorError>;
}
