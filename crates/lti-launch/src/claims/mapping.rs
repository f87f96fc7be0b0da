//! Declarative legacy parameter ↔ claim mapping table
//!
//! Each [`ClaimMappingRule`] ties one flat launch parameter to one place in the claims
//! payload. The claim name is derived from the rule's group:
//!
//! - `group: None` → a bare top-level claim (`sub`, `name`, ...)
//! - `group: Some("")` → `<prefix>[-<suffix>]/claim/<claim>`
//! - `group: Some(g)` → `<prefix>[-<suffix>]/claim/<g>` holding `<claim>` as a sub-key
//!
//! [`MappingTable`] indexes the rules both ways once, at construction.

use std::collections::{BTreeMap, HashMap};

/// Namespace root for LTI claims.
pub const LTI_PREFIX: &str = "https://purl.imsglobal.org/spec/lti";

/// `roles` claim.
pub const ROLES_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/roles";
/// `context` claim.
pub const CONTEXT_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/context";
/// `resource_link` claim.
pub const RESOURCE_LINK_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/resource_link";
/// `tool_platform` claim.
pub const TOOL_PLATFORM_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/tool_platform";
/// `message_type` claim.
pub const MESSAGE_TYPE_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/message_type";
/// `version` claim.
pub const VERSION_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/version";
/// `deployment_id` claim.
pub const DEPLOYMENT_ID_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/deployment_id";
/// `target_link_uri` claim.
pub const TARGET_LINK_URI_CLAIM: &str =
    "https://purl.imsglobal.org/spec/lti/claim/target_link_uri";
/// Group claim carrying `custom_*` parameters.
pub const CUSTOM_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/custom";
/// Group claim carrying `ext_*` parameters.
pub const EXT_CLAIM: &str = "https://purl.imsglobal.org/spec/lti/claim/ext";

/// Flat key of deep-linking content items.
pub const CONTENT_ITEMS_KEY: &str = "content_items";
/// Flat key prefix mapped into [`CUSTOM_CLAIM`].
pub const CUSTOM_PREFIX: &str = "custom_";
/// Flat key prefix mapped into [`EXT_CLAIM`].
pub const EXT_PREFIX: &str = "ext_";

/// Legacy message type ↔ LTI 1.3 message type.
const MESSAGE_TYPES: &[(&str, &str)] = &[
    ("basic-lti-launch-request", "LtiResourceLinkRequest"),
    ("ContentItemSelectionRequest", "LtiDeepLinkingRequest"),
    ("ContentItemSelection", "LtiDeepLinkingResponse"),
];

/// Translate a legacy message type; unknown values pass through.
pub fn message_type_to_modern(value: &str) -> &str {
    MESSAGE_TYPES
        .iter()
        .find(|(legacy, _)| *legacy == value)
        .map_or(value, |(_, modern)| modern)
}

/// Translate an LTI 1.3 message type; unknown values pass through.
pub fn message_type_to_legacy(value: &str) -> &str {
    MESSAGE_TYPES
        .iter()
        .find(|(_, modern)| *modern == value)
        .map_or(value, |(legacy, _)| legacy)
}

/// How a flat string value is typed in the claims payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Kept as a string
    String,
    /// `"true"` becomes `true`, anything else `false`
    Boolean,
}

/// One legacy key ↔ claim location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimMappingRule {
    /// Flat parameter name
    pub legacy_key: &'static str,
    /// Claim leaf (top-level claim name, or sub-key within a group)
    pub claim: &'static str,
    /// Group selector, see module docs
    pub group: Option<&'static str>,
    /// Namespace disambiguator (`dl`, `ags`, `nrps`, `bo`)
    pub suffix: &'static str,
    /// Multi-valued: comma-joined in flat form, an array in claims form
    pub is_array: bool,
    /// Scalar value type
    pub value_type: ValueType,
}

impl ClaimMappingRule {
    const fn new(
        legacy_key: &'static str,
        suffix: &'static str,
        group: Option<&'static str>,
        claim: &'static str,
    ) -> Self {
        Self {
            legacy_key,
            claim,
            group,
            suffix,
            is_array: false,
            value_type: ValueType::String,
        }
    }

    const fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    const fn boolean(mut self) -> Self {
        self.value_type = ValueType::Boolean;
        self
    }

    /// Top-level claim name this rule writes to.
    pub fn claim_name(&self) -> String {
        let namespace = if self.suffix.is_empty() {
            LTI_PREFIX.to_string()
        } else {
            format!("{LTI_PREFIX}-{}", self.suffix)
        };
        match self.group {
            None => self.claim.to_string(),
            Some("") => format!("{namespace}/claim/{}", self.claim),
            Some(group) => format!("{namespace}/claim/{group}"),
        }
    }

    /// Key inside the group claim, for grouped rules.
    pub fn sub_key(&self) -> Option<&'static str> {
        match self.group {
            Some(group) if !group.is_empty() => Some(self.claim),
            _ => None,
        }
    }
}

const fn top(legacy_key: &'static str, claim: &'static str) -> ClaimMappingRule {
    ClaimMappingRule::new(legacy_key, "", None, claim)
}

const fn lti(legacy_key: &'static str, claim: &'static str) -> ClaimMappingRule {
    ClaimMappingRule::new(legacy_key, "", Some(""), claim)
}

const fn grouped(
    legacy_key: &'static str,
    suffix: &'static str,
    group: &'static str,
    claim: &'static str,
) -> ClaimMappingRule {
    ClaimMappingRule::new(legacy_key, suffix, Some(group), claim)
}

/// The full mapping table.
pub const MAPPING_RULES: &[ClaimMappingRule] = &[
    // Deep linking
    grouped("accept_copy_advice", "dl", "deep_linking_settings", "accept_copy_advice").boolean(),
    grouped("accept_media_types", "dl", "deep_linking_settings", "accept_media_types"),
    grouped("accept_multiple", "dl", "deep_linking_settings", "accept_multiple").boolean(),
    grouped(
        "accept_presentation_document_targets",
        "dl",
        "deep_linking_settings",
        "accept_presentation_document_targets",
    )
    .array(),
    grouped("accept_types", "dl", "deep_linking_settings", "accept_types").array(),
    grouped("accept_unsigned", "dl", "deep_linking_settings", "accept_unsigned").boolean(),
    grouped("auto_create", "dl", "deep_linking_settings", "auto_create").boolean(),
    grouped("can_confirm", "dl", "deep_linking_settings", "can_confirm").boolean(),
    grouped(
        "content_item_return_url",
        "dl",
        "deep_linking_settings",
        "deep_link_return_url",
    ),
    ClaimMappingRule::new(CONTENT_ITEMS_KEY, "dl", Some(""), "content_items").array(),
    grouped("data", "dl", "deep_linking_settings", "data"),
    grouped("text", "dl", "deep_linking_settings", "text"),
    grouped("title", "dl", "deep_linking_settings", "title"),
    ClaimMappingRule::new("lti_msg", "dl", Some(""), "msg"),
    ClaimMappingRule::new("lti_log", "dl", Some(""), "log"),
    ClaimMappingRule::new("lti_errormsg", "dl", Some(""), "errormsg"),
    ClaimMappingRule::new("lti_errorlog", "dl", Some(""), "errorlog"),
    // Context
    grouped("context_id", "", "context", "id"),
    grouped("context_label", "", "context", "label"),
    grouped("context_title", "", "context", "title"),
    grouped("context_type", "", "context", "type").array(),
    grouped("lis_course_offering_sourcedid", "", "lis", "course_offering_sourcedid"),
    grouped("lis_course_section_sourcedid", "", "lis", "course_section_sourcedid"),
    // Presentation
    grouped("launch_presentation_css_url", "", "launch_presentation", "css_url"),
    grouped(
        "launch_presentation_document_target",
        "",
        "launch_presentation",
        "document_target",
    ),
    grouped("launch_presentation_height", "", "launch_presentation", "height"),
    grouped("launch_presentation_locale", "", "launch_presentation", "locale"),
    grouped("launch_presentation_return_url", "", "launch_presentation", "return_url"),
    grouped("launch_presentation_width", "", "launch_presentation", "width"),
    // Person
    top("lis_person_contact_email_primary", "email"),
    top("lis_person_name_family", "family_name"),
    top("lis_person_name_full", "name"),
    top("lis_person_name_given", "given_name"),
    grouped("lis_person_sourcedid", "", "lis", "person_sourcedid"),
    top("user_id", "sub"),
    top("user_image", "picture"),
    lti("roles", "roles").array(),
    lti("role_scope_mentor", "role_scope_mentor").array(),
    // Message
    lti("deployment_id", "deployment_id"),
    lti("lti_message_type", "message_type"),
    lti("lti_version", "version"),
    lti("target_link_uri", "target_link_uri"),
    grouped("resource_link_description", "", "resource_link", "description"),
    grouped("resource_link_id", "", "resource_link", "id"),
    grouped("resource_link_title", "", "resource_link", "title"),
    // Platform
    grouped(
        "tool_consumer_info_product_family_code",
        "",
        "tool_platform",
        "product_family_code",
    ),
    grouped("tool_consumer_info_version", "", "tool_platform", "version"),
    grouped(
        "tool_consumer_instance_contact_email",
        "",
        "tool_platform",
        "contact_email",
    ),
    grouped(
        "tool_consumer_instance_description",
        "",
        "tool_platform",
        "description",
    ),
    grouped("tool_consumer_instance_guid", "", "tool_platform", "guid"),
    grouped("tool_consumer_instance_name", "", "tool_platform", "name"),
    grouped("tool_consumer_instance_url", "", "tool_platform", "url"),
    // Names and role provisioning
    grouped(
        "custom_context_memberships_v2_url",
        "nrps",
        "namesroleservice",
        "context_memberships_url",
    ),
    grouped(
        "custom_context_memberships_versions",
        "nrps",
        "namesroleservice",
        "service_versions",
    )
    .array(),
    // Assignment and grade services
    grouped("custom_gradebookservices_scope", "ags", "endpoint", "scope").array(),
    grouped("custom_lineitems_url", "ags", "endpoint", "lineitems"),
    grouped("custom_lineitem_url", "ags", "endpoint", "lineitem"),
    grouped("custom_results_url", "ags", "endpoint", "results"),
    grouped("custom_result_url", "ags", "endpoint", "result"),
    grouped("custom_scores_url", "ags", "endpoint", "scores"),
    grouped("custom_score_url", "ags", "endpoint", "score"),
    // Basic outcomes
    grouped("lis_outcome_service_url", "bo", "basicoutcome", "lis_outcome_service_url"),
    grouped("lis_result_sourcedid", "bo", "basicoutcome", "lis_result_sourcedid"),
];

/// Reverse entry for one claim name.
#[derive(Debug, Clone)]
pub enum ClaimTarget {
    /// The whole claim value maps to one legacy key.
    Direct(&'static ClaimMappingRule),
    /// The claim is an object; each sub-key maps to a legacy key.
    Group(BTreeMap<&'static str, &'static ClaimMappingRule>),
}

/// Forward and reverse indexes over [`MAPPING_RULES`].
#[derive(Debug, Clone)]
pub struct MappingTable {
    by_legacy_key: HashMap<&'static str, (&'static ClaimMappingRule, String)>,
    by_claim: HashMap<String, ClaimTarget>,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingTable {
    /// Index the standard rule table.
    pub fn new() -> Self {
        let mut by_legacy_key = HashMap::with_capacity(MAPPING_RULES.len());
        let mut by_claim: HashMap<String, ClaimTarget> = HashMap::new();

        for rule in MAPPING_RULES {
            let claim_name = rule.claim_name();
            match rule.sub_key() {
                Some(sub_key) => {
                    let target = by_claim
                        .entry(claim_name.clone())
                        .or_insert_with(|| ClaimTarget::Group(BTreeMap::new()));
                    if let ClaimTarget::Group(members) = target {
                        members.insert(sub_key, rule);
                    }
                }
                None => {
                    by_claim.insert(claim_name.clone(), ClaimTarget::Direct(rule));
                }
            }
            by_legacy_key.insert(rule.legacy_key, (rule, claim_name));
        }

        Self {
            by_legacy_key,
            by_claim,
        }
    }

    /// Rule and claim name for a flat key.
    pub fn for_legacy_key(&self, key: &str) -> Option<(&'static ClaimMappingRule, &str)> {
        self.by_legacy_key
            .get(key)
            .map(|(rule, claim)| (*rule, claim.as_str()))
    }

    /// Reverse entry for a claim name.
    pub fn for_claim(&self, claim: &str) -> Option<&ClaimTarget> {
        self.by_claim.get(claim)
    }
}
