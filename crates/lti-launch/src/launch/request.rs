//! Wire messages of the third-party login flow

use serde::{Deserialize, Serialize};

/// Required `scope`.
pub const SCOPE_OPENID: &str = "openid";
/// Required `response_type`.
pub const RESPONSE_TYPE_ID_TOKEN: &str = "id_token";
/// Required `response_mode`.
pub const RESPONSE_MODE_FORM_POST: &str = "form_post";
/// Required `prompt`.
pub const PROMPT_NONE: &str = "none";

/// OIDC authentication request sent by the tool after login initiation.
///
/// Deserializes from the form body or query string; absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationRequest {
    /// Must be `openid`
    pub scope: Option<String>,
    /// Must be `id_token`
    pub response_type: Option<String>,
    /// Must be `form_post`
    pub response_mode: Option<String>,
    /// Tool's client id
    pub client_id: Option<String>,
    /// Where the id_token is posted
    pub redirect_uri: Option<String>,
    /// Opaque user reference from login initiation
    pub login_hint: Option<String>,
    /// Replay protection, echoed in the id_token
    pub nonce: Option<String>,
    /// Opaque tool state, echoed verbatim
    pub state: Option<String>,
    /// Must be `none`
    pub prompt: Option<String>,
    /// Signed launch context from login initiation
    pub lti_message_hint: Option<String>,
    /// Deployment id from login initiation
    pub lti_deployment_id: Option<String>,
}

/// Successful authentication: the form the user agent posts to `redirect_uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    /// Target of the form post
    pub redirect_uri: String,
    /// Signed launch claims
    pub id_token: String,
    /// Tool state from the request, untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Third-party login initiation sent to an LTI 1.3 tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginInitiation {
    /// Tool endpoint receiving the parameters below
    #[serde(skip)]
    pub initiate_login_url: String,
    /// Platform issuer
    pub iss: String,
    /// Opaque user reference
    pub login_hint: String,
    /// Launch target
    pub target_link_uri: String,
    /// Signed launch context
    pub lti_message_hint: String,
    /// Deployment id
    pub lti_deployment_id: String,
    /// Tool's client id
    pub client_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_partial_json_body() {
        let request: AuthenticationRequest = serde_json::from_str(
            r#"{"scope":"openid","nonce":"n-1","state":"s"}"#,
        )
        .unwrap();
        assert_eq!(request.scope.as_deref(), Some(SCOPE_OPENID));
        assert_eq!(request.nonce.as_deref(), Some("n-1"));
        assert!(request.prompt.is_none());
    }

    #[test]
    fn test_response_omits_absent_state() {
        let response = AuthenticationResponse {
            redirect_uri: "https://tool.example/launch".into(),
            id_token: "t".into(),
            state: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("state").is_none());
    }
}
