//! OIDC launch authentication
//!
//! Validates an [`AuthenticationRequest`] against the message hint the platform issued at
//! login initiation, authenticates the user and issues the `id_token`. Checks run in a
//! fixed order and the first violation is returned.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::request::{
    AuthenticationRequest, AuthenticationResponse, PROMPT_NONE, RESPONSE_MODE_FORM_POST,
    RESPONSE_TYPE_ID_TOKEN, SCOPE_OPENID,
};
use super::{LaunchState, Platform, expires_at, unix_now};
use crate::claims::mapping::CUSTOM_CLAIM;
use crate::claims::{Claims, FlatParams};
use crate::error::{AuthenticationError, RequestField, Result};
use crate::substitution::{ResolutionContext, VariableSubstitutorFactory, is_placeholder};
use crate::types::{
    DisclosurePolicy, RegistrationRepository, ToolRegistration, UserAuthenticator, UserIdentity,
};

/// Hint claim naming the tool registration.
pub const TOOL_REGISTRATION_ID_CLAIM: &str = "tool_registration_id";

/// Orchestrates the authentication step of an LTI 1.3 launch.
#[derive(Clone)]
pub struct LaunchAuthenticator {
    platform: Arc<Platform>,
    registrations: Arc<dyn RegistrationRepository>,
    users: Arc<dyn UserAuthenticator>,
    substitutors: Arc<dyn VariableSubstitutorFactory>,
}

impl std::fmt::Debug for LaunchAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchAuthenticator")
            .field("issuer", &self.platform.issuer())
            .finish_non_exhaustive()
    }
}

impl LaunchAuthenticator {
    /// Create an authenticator over the given collaborators.
    pub fn new(
        platform: Arc<Platform>,
        registrations: Arc<dyn RegistrationRepository>,
        users: Arc<dyn UserAuthenticator>,
        substitutors: Arc<dyn VariableSubstitutorFactory>,
    ) -> Self {
        Self {
            platform,
            registrations,
            users,
            substitutors,
        }
    }

    /// Authenticate a launch and issue its `id_token`.
    ///
    /// # Errors
    ///
    /// Returns the first failed check, in order: protocol literals and nonce, hint
    /// signature, registration lookup, `client_id`, `redirect_uri`, user authentication,
    /// token signing.
    pub async fn authenticate(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<AuthenticationResponse> {
        let mut state = LaunchState::ReceivedRequest;
        let result = self.run(request, &mut state).await;
        match &result {
            Ok(_) => info!(
                client_id = field(&request.client_id),
                "Launch authenticated"
            ),
            Err(error) => warn!(
                last_state = %state,
                next_state = %LaunchState::Rejected,
                kind = ?error.kind(),
                error = %error,
                "Launch rejected"
            ),
        }
        result
    }

    async fn run(
        &self,
        request: &AuthenticationRequest,
        state: &mut LaunchState,
    ) -> Result<AuthenticationResponse> {
        validate_protocol_fields(request)?;
        advance(state, LaunchState::StaticallyValidated);

        let mut claims = self.decode_hint(request)?;
        advance(state, LaunchState::HintDecoded);

        let registration = self.load_registration(&claims).await?;
        if field(&request.client_id) != registration.client_id {
            return Err(AuthenticationError::invalid(
                RequestField::ClientId,
                "does not match the tool registration",
            ));
        }
        let redirect_uri = field(&request.redirect_uri);
        if !registration.allows_redirect_uri(redirect_uri) {
            return Err(AuthenticationError::invalid(
                RequestField::RedirectUri,
                format!("'{redirect_uri}' is not registered for this tool"),
            ));
        }
        advance(state, LaunchState::RegistrationLoaded);

        let user = self.authenticate_user(field(&request.login_hint)).await?;
        advance(state, LaunchState::UserAuthenticated);

        self.substitute_custom(&mut claims, &registration, &user);
        let identity = self.identity_claims(&registration, &user);
        merge_claims(&mut claims, identity);
        self.finalize(&mut claims, &registration, field(&request.nonce));
        advance(state, LaunchState::ClaimsAssembled);

        let id_token = self
            .platform
            .codec()
            .issue(&claims, self.platform.signing_key())
            .map_err(AuthenticationError::Signing)?;
        advance(state, LaunchState::TokenIssued);

        Ok(AuthenticationResponse {
            redirect_uri: redirect_uri.to_string(),
            id_token,
            state: request.state.clone(),
        })
    }

    fn decode_hint(&self, request: &AuthenticationRequest) -> Result<Claims> {
        let hint = field(&request.lti_message_hint);
        if hint.is_empty() {
            return Err(AuthenticationError::invalid(
                RequestField::LtiMessageHint,
                "missing",
            ));
        }

        let claims = self
            .platform
            .codec()
            .verify(hint, self.platform.key_set())
            .map_err(AuthenticationError::Signature)?;

        let issuer = claims.get("iss").and_then(Value::as_str);
        if issuer != Some(self.platform.issuer()) {
            return Err(AuthenticationError::invalid(
                RequestField::LtiMessageHint,
                "issued by another platform",
            ));
        }
        Ok(claims)
    }

    async fn load_registration(&self, claims: &Claims) -> Result<ToolRegistration> {
        let id = match claims.get(TOOL_REGISTRATION_ID_CLAIM) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(AuthenticationError::invalid(
                    RequestField::LtiMessageHint,
                    "no tool_registration_id",
                ));
            }
        };

        match self.registrations.get_by_id(&id).await {
            Ok(Some(registration)) => {
                debug!(
                    registration_id = %id,
                    tool = %registration.name,
                    "Tool registration loaded"
                );
                Ok(registration)
            }
            Ok(None) => Err(AuthenticationError::Registration(format!(
                "unknown tool registration '{id}'"
            ))),
            Err(e) => Err(AuthenticationError::Registration(format!(
                "lookup of '{id}' failed: {e}"
            ))),
        }
    }

    async fn authenticate_user(&self, login_hint: &str) -> Result<UserIdentity> {
        let result = self
            .users
            .authenticate(login_hint)
            .await
            .map_err(|e| AuthenticationError::AuthenticationFailure(e.to_string()))?;
        match result.user {
            Some(user) if result.successful => Ok(user),
            _ => Err(AuthenticationError::AuthenticationFailure(
                "user could not be authenticated".into(),
            )),
        }
    }

    /// Resolve custom values still holding placeholders, now that the user is known.
    fn substitute_custom(
        &self,
        claims: &mut Claims,
        registration: &ToolRegistration,
        user: &UserIdentity,
    ) {
        let ctx = ResolutionContext::from_claims(claims).with_user(user.clone());
        let Some(Value::Object(custom)) = claims.get_mut(CUSTOM_CLAIM) else {
            return;
        };

        let pending: Vec<(String, String)> = custom
            .iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) if is_placeholder(s) => Some((key.clone(), s.clone())),
                _ => None,
            })
            .collect();
        if pending.is_empty() {
            return;
        }

        let values: Vec<String> = pending.iter().map(|(_, v)| v.clone()).collect();
        let resolved = self
            .substitutors
            .for_tool(registration)
            .substitute(&values, &ctx);
        for ((key, _), value) in pending.into_iter().zip(resolved) {
            custom.insert(key, Value::String(value));
        }
    }

    /// Identity fields the tool may see, assembled flat and converted.
    fn identity_claims(&self, registration: &ToolRegistration, user: &UserIdentity) -> Claims {
        let mut identity = FlatParams::new();
        identity.insert("user_id".into(), user.id.clone());

        if registration.send_name == DisclosurePolicy::Always {
            let names = [
                ("lis_person_name_given", user.given_name.clone()),
                ("lis_person_name_family", user.family_name.clone()),
                ("lis_person_name_full", user.display_name()),
                ("ext_user_username", user.username.clone()),
            ];
            for (key, value) in names {
                if let Some(value) = value {
                    identity.insert(key.into(), value);
                }
            }
        }
        if registration.send_email == DisclosurePolicy::Always
            && let Some(email) = &user.email
        {
            identity.insert("lis_person_contact_email_primary".into(), email.clone());
        }

        self.platform.converter().params_to_claims(&identity)
    }

    fn finalize(&self, claims: &mut Claims, registration: &ToolRegistration, nonce: &str) {
        let now = unix_now();

        claims.remove(TOOL_REGISTRATION_ID_CLAIM);
        claims.insert("iss".into(), Value::from(self.platform.issuer()));
        claims.insert("aud".into(), Value::from(registration.client_id.as_str()));
        claims.insert("azp".into(), Value::from(registration.client_id.as_str()));
        claims.insert("nonce".into(), Value::from(nonce));
        claims.insert("iat".into(), Value::from(now));
        claims.insert(
            "exp".into(),
            Value::from(expires_at(now, self.platform.id_token_lifetime())),
        );
        claims.insert(
            "jti".into(),
            Value::from(uuid::Uuid::new_v4().to_string()),
        );
    }
}

fn validate_protocol_fields(request: &AuthenticationRequest) -> Result<()> {
    let literals = [
        (RequestField::Scope, &request.scope, SCOPE_OPENID),
        (
            RequestField::ResponseType,
            &request.response_type,
            RESPONSE_TYPE_ID_TOKEN,
        ),
        (
            RequestField::ResponseMode,
            &request.response_mode,
            RESPONSE_MODE_FORM_POST,
        ),
        (RequestField::Prompt, &request.prompt, PROMPT_NONE),
    ];
    for (name, value, expected) in literals {
        if field(value) != expected {
            return Err(AuthenticationError::invalid(
                name,
                format!("expected '{expected}'"),
            ));
        }
    }
    if field(&request.nonce).is_empty() {
        return Err(AuthenticationError::invalid(RequestField::Nonce, "missing"));
    }
    Ok(())
}

fn advance(state: &mut LaunchState, next: LaunchState) {
    debug!(from = %state, to = %next, "Launch state");
    *state = next;
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

/// Merge `incoming` into `claims`; objects on both sides merge key by key.
fn merge_claims(claims: &mut Claims, incoming: Claims) {
    for (name, value) in incoming {
        let value = match (value, claims.get_mut(&name)) {
            (Value::Object(fields), Some(Value::Object(existing))) => {
                existing.extend(fields);
                continue;
            }
            (value, _) => value,
        };
        claims.insert(name, value);
    }
}
