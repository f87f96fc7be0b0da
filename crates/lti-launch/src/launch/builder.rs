//! Launch request assembly
//!
//! Collects tool, context and placement data into one flat parameter set. LTI 1.0/1.1
//! tools receive that set directly. LTI 1.3 tools receive a login initiation whose
//! `lti_message_hint` carries the set converted to claims and signed by the platform.
//!
//! User placeholders are resolved here only for flat launches. For LTI 1.3 the user is
//! not part of the hint; `$User.*` and `$Person.*` values stay literal until
//! [`LaunchAuthenticator`](super::LaunchAuthenticator) resolves them.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::authenticator::TOOL_REGISTRATION_ID_CLAIM;
use super::request::LoginInitiation;
use super::{Platform, expires_at, unix_now};
use crate::claims::mapping::CUSTOM_PREFIX;
use crate::claims::{Claims, FlatParams};
use crate::error::{AuthenticationError, Result};
use crate::substitution::{
    CourseContext, ResolutionContext, ResourceLinkContext, VariableSubstitutor,
    VariableSubstitutorFactory, is_placeholder,
};
use crate::types::{DisclosurePolicy, ToolRegistration, UserIdentity};

/// Kind of launch message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMessageType {
    /// Open a resource link
    #[default]
    ResourceLink,
    /// Ask the tool to select content
    DeepLinking,
}

impl LaunchMessageType {
    /// Legacy `lti_message_type` value.
    pub fn legacy_name(&self) -> &'static str {
        match self {
            Self::ResourceLink => "basic-lti-launch-request",
            Self::DeepLinking => "ContentItemSelectionRequest",
        }
    }
}

/// How the platform will show the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchPresentation {
    /// `iframe`, `window` or `embed`
    pub document_target: Option<String>,
    /// User locale
    pub locale: Option<String>,
    /// Where to send the user when done
    pub return_url: Option<String>,
    /// Platform stylesheet
    pub css_url: Option<String>,
    /// Frame width
    pub width: Option<u32>,
    /// Frame height
    pub height: Option<u32>,
}

/// Deep-linking request settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLinkingSettings {
    /// Where the tool posts the selection
    pub return_url: String,
    /// Accepted item types (`ltiResourceLink`, `file`, ...)
    pub accept_types: Vec<String>,
    /// Accepted presentation targets
    pub accept_presentation_document_targets: Vec<String>,
    /// Accepted media types
    pub accept_media_types: Option<String>,
    /// Whether several items may be returned
    pub accept_multiple: bool,
    /// Whether returned items are created without confirmation
    pub auto_create: bool,
    /// Default title
    pub title: Option<String>,
    /// Default text
    pub text: Option<String>,
    /// Opaque data echoed by the tool
    pub data: Option<String>,
}

/// What to send the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// Flat parameters to post to `url`.
    Legacy {
        /// Launch URL
        url: String,
        /// Form parameters
        params: FlatParams,
    },
    /// Third-party login initiation.
    LoginInitiation(LoginInitiation),
}

/// Assembles a launch for one tool.
pub struct LaunchRequestBuilder<'a> {
    platform: &'a Platform,
    registration: &'a ToolRegistration,
    substitutor: Arc<dyn VariableSubstitutor>,
    message_type: LaunchMessageType,
    roles: Vec<String>,
    course: Option<CourseContext>,
    resource_link: Option<ResourceLinkContext>,
    presentation: Option<LaunchPresentation>,
    deep_linking: Option<DeepLinkingSettings>,
    custom: IndexMap<String, String>,
    extra: FlatParams,
    target_link_uri: Option<String>,
}

impl<'a> LaunchRequestBuilder<'a> {
    /// Start a launch of `registration`.
    pub fn new(
        platform: &'a Platform,
        registration: &'a ToolRegistration,
        substitutors: &dyn VariableSubstitutorFactory,
    ) -> Self {
        Self {
            platform,
            registration,
            substitutor: substitutors.for_tool(registration),
            message_type: LaunchMessageType::default(),
            roles: Vec::new(),
            course: None,
            resource_link: None,
            presentation: None,
            deep_linking: None,
            custom: IndexMap::new(),
            extra: FlatParams::new(),
            target_link_uri: None,
        }
    }

    /// Message type.
    pub fn message_type(mut self, message_type: LaunchMessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// User roles in the context, in any vocabulary form.
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Course the launch happens in.
    pub fn course(mut self, course: CourseContext) -> Self {
        self.course = Some(course);
        self
    }

    /// Placement being launched.
    pub fn resource_link(mut self, link: ResourceLinkContext) -> Self {
        self.resource_link = Some(link);
        self
    }

    /// Presentation hints.
    pub fn presentation(mut self, presentation: LaunchPresentation) -> Self {
        self.presentation = Some(presentation);
        self
    }

    /// Deep-linking settings; also switches the message type.
    pub fn deep_linking(mut self, settings: DeepLinkingSettings) -> Self {
        self.message_type = LaunchMessageType::DeepLinking;
        self.deep_linking = Some(settings);
        self
    }

    /// Custom parameter; `name` is sent as `custom_<name>`.
    pub fn custom(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(name.into(), value.into());
        self
    }

    /// Any other flat parameter, sent as is.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Override the registration's default launch target.
    pub fn target_link_uri(mut self, uri: impl Into<String>) -> Self {
        self.target_link_uri = Some(uri.into());
        self
    }

    /// Produce the request for `user`.
    ///
    /// # Errors
    ///
    /// For LTI 1.3 tools: [`AuthenticationError::Registration`] if the tool has no login
    /// initiation URL, [`AuthenticationError::Signing`] if the hint cannot be signed.
    pub fn build(self, user: &UserIdentity) -> Result<LaunchRequest> {
        if self.registration.version.uses_claims() {
            self.build_login_initiation(user)
                .map(LaunchRequest::LoginInitiation)
        } else {
            Ok(self.build_legacy(user))
        }
    }

    fn build_legacy(self, user: &UserIdentity) -> LaunchRequest {
        let mut params = self.common_params();
        params.extend(user_params(self.registration, user));

        let ctx = self.resolution_context().with_user(user.clone());
        substitute_custom_params(&mut params, self.substitutor.as_ref(), &ctx);

        debug!(
            tool = %self.registration.name,
            version = %self.registration.version,
            params = params.len(),
            "Built flat launch"
        );
        LaunchRequest::Legacy {
            url: self.launch_target(),
            params,
        }
    }

    fn build_login_initiation(self, user: &UserIdentity) -> Result<LoginInitiation> {
        let initiate_login_url = self.registration.initiate_login_url.clone().ok_or_else(|| {
            AuthenticationError::Registration(format!(
                "tool '{}' has no login initiation URL",
                self.registration.name
            ))
        })?;
        let target_link_uri = self.launch_target();

        let mut params = self.common_params();
        params.insert(
            "deployment_id".into(),
            self.registration.deployment_id.clone(),
        );
        params.insert("target_link_uri".into(), target_link_uri.clone());

        // No user yet: only context placeholders resolve.
        let ctx = self.resolution_context();
        substitute_custom_params(&mut params, self.substitutor.as_ref(), &ctx);

        let mut claims = self.platform.converter().params_to_claims(&params);
        self.add_hint_claims(&mut claims);

        let lti_message_hint = self
            .platform
            .codec()
            .issue(&claims, self.platform.signing_key())
            .map_err(AuthenticationError::Signing)?;

        debug!(
            tool = %self.registration.name,
            registration_id = %self.registration.id,
            "Built login initiation"
        );
        Ok(LoginInitiation {
            initiate_login_url,
            iss: self.platform.issuer().to_string(),
            login_hint: user.id.clone(),
            target_link_uri,
            lti_message_hint,
            lti_deployment_id: self.registration.deployment_id.clone(),
            client_id: self.registration.client_id.clone(),
        })
    }

    fn add_hint_claims(&self, claims: &mut Claims) {
        let now = unix_now();

        claims.insert(
            TOOL_REGISTRATION_ID_CLAIM.into(),
            Value::from(self.registration.id.as_str()),
        );
        claims.insert("iss".into(), Value::from(self.platform.issuer()));
        claims.insert(
            "aud".into(),
            Value::from(self.registration.client_id.as_str()),
        );
        claims.insert("iat".into(), Value::from(now));
        claims.insert("exp".into(), Value::from(expires_at(now, self.platform.hint_lifetime())));
        claims.insert("jti".into(), Value::from(uuid::Uuid::new_v4().to_string()));
    }

    fn launch_target(&self) -> String {
        self.target_link_uri
            .clone()
            .unwrap_or_else(|| self.registration.target_link_uri.clone())
    }

    fn resolution_context(&self) -> ResolutionContext {
        ResolutionContext {
            user: None,
            course: self.course.clone(),
            resource_link: self.resource_link.clone(),
            platform_name: self.platform.instance().name.clone(),
        }
    }

    fn common_params(&self) -> FlatParams {
        let mut params = FlatParams::new();
        params.insert(
            "lti_message_type".into(),
            self.message_type.legacy_name().into(),
        );
        params.insert(
            "lti_version".into(),
            self.registration.version.legacy_label().into(),
        );
        params.extend(self.platform.instance_params());

        if !self.roles.is_empty() {
            params.insert("roles".into(), self.roles.join(","));
        }
        if let Some(course) = &self.course {
            params.insert("context_id".into(), course.id.clone());
            insert_some(&mut params, "context_title", &course.title);
            insert_some(&mut params, "context_label", &course.label);
            if !course.context_types.is_empty() {
                params.insert("context_type".into(), course.context_types.join(","));
            }
        }
        if let Some(link) = &self.resource_link {
            params.insert("resource_link_id".into(), link.id.clone());
            insert_some(&mut params, "resource_link_title", &link.title);
            insert_some(&mut params, "resource_link_description", &link.description);
        }
        if let Some(presentation) = &self.presentation {
            insert_some(
                &mut params,
                "launch_presentation_document_target",
                &presentation.document_target,
            );
            insert_some(&mut params, "launch_presentation_locale", &presentation.locale);
            insert_some(
                &mut params,
                "launch_presentation_return_url",
                &presentation.return_url,
            );
            insert_some(&mut params, "launch_presentation_css_url", &presentation.css_url);
            insert_some(
                &mut params,
                "launch_presentation_width",
                &presentation.width.map(|w| w.to_string()),
            );
            insert_some(
                &mut params,
                "launch_presentation_height",
                &presentation.height.map(|h| h.to_string()),
            );
        }
        if let Some(settings) = &self.deep_linking {
            params.insert("content_item_return_url".into(), settings.return_url.clone());
            if !settings.accept_types.is_empty() {
                params.insert("accept_types".into(), settings.accept_types.join(","));
            }
            if !settings.accept_presentation_document_targets.is_empty() {
                params.insert(
                    "accept_presentation_document_targets".into(),
                    settings.accept_presentation_document_targets.join(","),
                );
            }
            insert_some(&mut params, "accept_media_types", &settings.accept_media_types);
            params.insert(
                "accept_multiple".into(),
                settings.accept_multiple.to_string(),
            );
            params.insert("auto_create".into(), settings.auto_create.to_string());
            insert_some(&mut params, "title", &settings.title);
            insert_some(&mut params, "text", &settings.text);
            insert_some(&mut params, "data", &settings.data);
        }

        params.extend(self.extra.clone());
        for (name, value) in &self.custom {
            params.insert(format!("{CUSTOM_PREFIX}{name}"), value.clone());
        }
        params
    }
}

fn insert_some(params: &mut FlatParams, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        params.insert(key.to_string(), value.clone());
    }
}

/// Identity parameters for a flat launch, honoring the tool's disclosure policy.
fn user_params(registration: &ToolRegistration, user: &UserIdentity) -> FlatParams {
    let mut params = FlatParams::new();
    params.insert("user_id".into(), user.id.clone());
    insert_some(&mut params, "user_image", &user.picture);
    insert_some(&mut params, "lis_person_sourcedid", &user.sourced_id);

    if registration.send_name == DisclosurePolicy::Always {
        insert_some(&mut params, "lis_person_name_given", &user.given_name);
        insert_some(&mut params, "lis_person_name_family", &user.family_name);
        insert_some(&mut params, "lis_person_name_full", &user.display_name());
        insert_some(&mut params, "ext_user_username", &user.username);
    }
    if registration.send_email == DisclosurePolicy::Always {
        insert_some(
            &mut params,
            "lis_person_contact_email_primary",
            &user.email,
        );
    }
    params
}

/// Resolve placeholder values of `custom_*` parameters in place.
fn substitute_custom_params(
    params: &mut FlatParams,
    substitutor: &dyn VariableSubstitutor,
    ctx: &ResolutionContext,
) {
    let keys: Vec<String> = params
        .iter()
        .filter(|(key, value)| key.starts_with(CUSTOM_PREFIX) && is_placeholder(value))
        .map(|(key, _)| key.clone())
        .collect();
    if keys.is_empty() {
        return;
    }

    let values: Vec<String> = keys.iter().map(|key| params[key].clone()).collect();
    let resolved = substitutor.substitute(&values, ctx);
    for (key, value) in keys.into_iter().zip(resolved) {
        params.insert(key, value);
    }
}
