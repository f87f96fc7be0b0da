//! Common test utilities for integration tests
//!
//! In-memory collaborators and fixtures for driving full launches: a platform with a
//! fresh ES256 key, tool registrations, and helpers that turn a login initiation into
//! the authentication request a tool would send back.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use lti_launch::error::CollaboratorError;
use lti_launch::launch::LaunchRequest;
use lti_launch::{
    AuthResult, AuthenticationRequest, DisclosurePolicy, LaunchAuthenticator,
    LaunchRequestBuilder, LoginInitiation, LtiVersion, Platform, RegistrationRepository,
    SigningKey, StandardSubstitutorFactory, ToolRegistration, UserAuthenticator, UserIdentity,
};

pub const ISSUER: &str = "https://lms.example.edu";
pub const CLIENT_ID: &str = "quiz-client";
pub const REDIRECT_URI: &str = "https://quiz.example.com/lti/launch";

/// Path of a PEM file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Platform with a freshly generated key.
pub fn platform() -> Arc<Platform> {
    let key = SigningKey::generate_es256("platform-key-1").expect("key generation");
    Arc::new(Platform::new(ISSUER, key))
}

/// LTI 1.3 registration that may receive names but not email.
pub fn registration() -> ToolRegistration {
    ToolRegistration {
        id: "42".to_string(),
        name: "Quiz Tool".to_string(),
        client_id: CLIENT_ID.to_string(),
        redirect_uris: format!("https://quiz.example.com/other\n{REDIRECT_URI}\n"),
        deployment_id: "deployment-1".to_string(),
        version: LtiVersion::V1_3,
        send_name: DisclosurePolicy::Always,
        send_email: DisclosurePolicy::Never,
        initiate_login_url: Some("https://quiz.example.com/lti/login".to_string()),
        target_link_uri: REDIRECT_URI.to_string(),
    }
}

pub fn ada() -> UserIdentity {
    UserIdentity {
        id: "user-7".to_string(),
        username: Some("ada".to_string()),
        given_name: Some("Ada".to_string()),
        family_name: Some("Lovelace".to_string()),
        email: Some("ada@example.edu".to_string()),
        ..Default::default()
    }
}

/// Registrations keyed by id.
#[derive(Default)]
pub struct InMemoryRegistrations {
    registrations: HashMap<String, ToolRegistration>,
    fail: bool,
}

impl InMemoryRegistrations {
    pub fn with(registration: ToolRegistration) -> Self {
        let mut registrations = HashMap::new();
        registrations.insert(registration.id.clone(), registration);
        Self {
            registrations,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            registrations: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryRegistrations {
    async fn get_by_id(&self, id: &str) -> Result<Option<ToolRegistration>, CollaboratorError> {
        if self.fail {
            return Err("database unavailable".into());
        }
        Ok(self.registrations.get(id).cloned())
    }
}

/// Authenticates exactly one login hint.
pub struct StaticUsers {
    login_hint: String,
    user: UserIdentity,
}

impl StaticUsers {
    pub fn new(user: UserIdentity) -> Self {
        Self {
            login_hint: user.id.clone(),
            user,
        }
    }
}

#[async_trait]
impl UserAuthenticator for StaticUsers {
    async fn authenticate(&self, login_hint: &str) -> Result<AuthResult, CollaboratorError> {
        if login_hint == self.login_hint {
            Ok(AuthResult::success(self.user.clone()))
        } else {
            Ok(AuthResult::failure())
        }
    }
}

/// Authenticator over one registration and one user.
pub fn authenticator(
    platform: Arc<Platform>,
    registration: ToolRegistration,
    user: UserIdentity,
) -> LaunchAuthenticator {
    LaunchAuthenticator::new(
        platform,
        Arc::new(InMemoryRegistrations::with(registration)),
        Arc::new(StaticUsers::new(user)),
        Arc::new(StandardSubstitutorFactory),
    )
}

/// Run the builder and unwrap the login initiation.
pub fn login_initiation(
    builder: LaunchRequestBuilder<'_>,
    user: &UserIdentity,
) -> LoginInitiation {
    match builder.build(user).expect("launch builds") {
        LaunchRequest::LoginInitiation(login) => login,
        LaunchRequest::Legacy { .. } => panic!("expected a login initiation"),
    }
}

/// The well-formed authentication request a tool sends after login initiation.
pub fn auth_request(login: &LoginInitiation) -> AuthenticationRequest {
    AuthenticationRequest {
        scope: Some("openid".to_string()),
        response_type: Some("id_token".to_string()),
        response_mode: Some("form_post".to_string()),
        client_id: Some(login.client_id.clone()),
        redirect_uri: Some(REDIRECT_URI.to_string()),
        login_hint: Some(login.login_hint.clone()),
        nonce: Some("nonce-123".to_string()),
        state: Some("opaque-state-Ω".to_string()),
        prompt: Some("none".to_string()),
        lti_message_hint: Some(login.lti_message_hint.clone()),
        lti_deployment_id: Some(login.lti_deployment_id.clone()),
    }
}

/// Current UNIX timestamp
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
