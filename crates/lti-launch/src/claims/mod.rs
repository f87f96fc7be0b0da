//! Flat launch parameters ↔ LTI 1.3 claims
//!
//! [`ClaimConverter`] is driven by the declarative [`mapping`] table and the shared
//! [`Vocabulary`]. Conversions never fail on unmappable data: unknown keys and claims are
//! dropped, unknown vocabulary entries are omitted.

pub mod content_items;
pub mod mapping;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::vocabulary::Vocabulary;

pub use content_items::{convert_content_items_modern_to_legacy, to_legacy_graph};
pub use mapping::{ClaimMappingRule, ClaimTarget, MappingTable, ValueType};

use mapping::{
    CONTENT_ITEMS_KEY, CONTEXT_CLAIM, CUSTOM_CLAIM, CUSTOM_PREFIX, EXT_CLAIM, EXT_PREFIX,
    MESSAGE_TYPE_CLAIM, ROLES_CLAIM,
};

/// Insertion-ordered flat launch payload.
pub type FlatParams = IndexMap<String, String>;

/// Claims payload: top-level claims with at most one level of nesting.
pub type Claims = Map<String, Value>;

/// Bidirectional flat ↔ claims converter.
#[derive(Debug, Clone)]
pub struct ClaimConverter {
    vocabulary: Arc<Vocabulary>,
    table: Arc<MappingTable>,
}

impl Default for ClaimConverter {
    fn default() -> Self {
        Self::new(Arc::new(Vocabulary::standard()))
    }
}

impl ClaimConverter {
    /// Create a converter over the standard mapping table.
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            table: Arc::new(MappingTable::new()),
        }
    }

    /// Convert a flat payload into claims.
    ///
    /// Array values are split on commas and sorted. Roles and context types are rewritten
    /// to their LIS v2 form and the message type is translated.
    pub fn params_to_claims(&self, params: &FlatParams) -> Claims {
        let mut claims = Claims::new();

        for (key, value) in params {
            if let Some((rule, claim)) = self.table.for_legacy_key(key) {
                let value = if rule.legacy_key == CONTENT_ITEMS_KEY {
                    match modern_content_items(value) {
                        Some(items) => items,
                        None => {
                            debug!(key = %key, "dropping content items not in LTI 1.3 form");
                            continue;
                        }
                    }
                } else {
                    coerce(rule, value)
                };
                insert_claim(&mut claims, claim, rule.sub_key(), value);
            } else if let Some(name) = key.strip_prefix(CUSTOM_PREFIX) {
                if !name.is_empty() {
                    insert_claim(
                        &mut claims,
                        CUSTOM_CLAIM,
                        Some(name),
                        Value::from(value.as_str()),
                    );
                }
            } else if let Some(name) = key.strip_prefix(EXT_PREFIX) {
                if !name.is_empty() {
                    insert_claim(&mut claims, EXT_CLAIM, Some(name), Value::from(value.as_str()));
                }
            } else {
                trace!(key = %key, "dropping unmapped launch parameter");
            }
        }

        self.modernize(&mut claims);
        claims
    }

    /// Convert claims into a flat payload.
    ///
    /// Vocabulary and message type are rewritten to their legacy form first. A resulting
    /// `content_items` value is re-encoded as the legacy graph.
    pub fn claims_to_params(&self, claims: &Claims) -> FlatParams {
        let mut claims = claims.clone();
        self.legacyize(&mut claims);

        let mut params = FlatParams::new();
        for (name, value) in &claims {
            match self.table.for_claim(name) {
                Some(ClaimTarget::Direct(rule)) => {
                    let flat = if rule.legacy_key == CONTENT_ITEMS_KEY {
                        to_legacy_graph(value).map(|graph| graph.to_string())
                    } else {
                        None
                    };
                    if let Some(flat) = flat.or_else(|| flatten(value)) {
                        params.insert(rule.legacy_key.to_string(), flat);
                    }
                }
                Some(ClaimTarget::Group(members)) => {
                    let Value::Object(fields) = value else {
                        trace!(claim = %name, "group claim is not an object");
                        continue;
                    };
                    for (sub_key, sub_value) in fields {
                        if let Some(rule) = members.get(sub_key.as_str())
                            && let Some(flat) = flatten(sub_value)
                        {
                            params.insert(rule.legacy_key.to_string(), flat);
                        }
                    }
                }
                None if name == CUSTOM_CLAIM || name == EXT_CLAIM => {
                    let prefix = if name == CUSTOM_CLAIM {
                        CUSTOM_PREFIX
                    } else {
                        EXT_PREFIX
                    };
                    let Value::Object(fields) = value else {
                        continue;
                    };
                    for (sub_key, sub_value) in fields {
                        let key = format!("{prefix}{sub_key}");
                        // `custom_lineitems_url` and friends belong to mapped claims
                        if self.table.for_legacy_key(&key).is_some() {
                            trace!(
                                claim = %name,
                                key = %key,
                                "dropping entry shadowing a mapped parameter"
                            );
                            continue;
                        }
                        if let Some(flat) = flatten(sub_value) {
                            params.insert(key, flat);
                        }
                    }
                }
                None => trace!(claim = %name, "dropping unmapped claim"),
            }
        }
        params
    }

    fn modernize(&self, claims: &mut Claims) {
        if let Some(roles) = claims.get_mut(ROLES_CLAIM) {
            let converted = self.vocabulary.to_modern_roles(&string_entries(roles), false);
            *roles = sorted_array(converted);
        }
        if let Some(Value::Object(context)) = claims.get_mut(CONTEXT_CLAIM)
            && let Some(types) = context.get_mut("type")
        {
            let converted = self
                .vocabulary
                .to_modern_context_types(&string_entries(types));
            *types = sorted_array(converted);
        }
        if let Some(Value::String(message_type)) = claims.get_mut(MESSAGE_TYPE_CLAIM) {
            *message_type = mapping::message_type_to_modern(message_type).to_string();
        }
    }

    fn legacyize(&self, claims: &mut Claims) {
        if let Some(roles) = claims.get_mut(ROLES_CLAIM) {
            let converted = self.vocabulary.to_legacy_roles(&string_entries(roles));
            *roles = present_array(converted);
        }
        if let Some(Value::Object(context)) = claims.get_mut(CONTEXT_CLAIM)
            && let Some(types) = context.get_mut("type")
        {
            let converted = self
                .vocabulary
                .to_legacy_context_types(&string_entries(types));
            *types = present_array(converted);
        }
        if let Some(Value::String(message_type)) = claims.get_mut(MESSAGE_TYPE_CLAIM) {
            *message_type = mapping::message_type_to_legacy(message_type).to_string();
        }
    }
}

fn coerce(rule: &ClaimMappingRule, value: &str) -> Value {
    if rule.is_array {
        let mut items: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();
        items.sort_unstable();
        return Value::Array(items.into_iter().map(Value::from).collect());
    }
    match rule.value_type {
        ValueType::Boolean => Value::Bool(value == "true"),
        ValueType::String => Value::from(value),
    }
}

/// Accept flat content items only when they already are a JSON array.
fn modern_content_items(value: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(value) {
        Ok(items @ Value::Array(_)) => Some(items),
        _ => None,
    }
}

fn insert_claim(claims: &mut Claims, claim: &str, sub_key: Option<&str>, value: Value) {
    let Some(sub_key) = sub_key else {
        claims.insert(claim.to_string(), value);
        return;
    };
    let group = claims
        .entry(claim.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !group.is_object() {
        *group = Value::Object(Map::new());
    }
    if let Value::Object(fields) = group {
        fields.insert(sub_key.to_string(), value);
    }
}

/// Render a claim value in flat form. `null` has no flat form.
fn flatten(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.iter().all(is_scalar) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
        scalar => scalar_text(scalar),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_entries(value: &Value) -> Vec<Option<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        Value::String(single) => vec![Some(single.clone())],
        _ => Vec::new(),
    }
}

fn present_array(entries: Vec<Option<String>>) -> Value {
    Value::Array(entries.into_iter().flatten().map(Value::from).collect())
}

fn sorted_array(entries: Vec<Option<String>>) -> Value {
    let mut present: Vec<String> = entries.into_iter().flatten().collect();
    present.sort_unstable();
    Value::Array(present.into_iter().map(Value::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> FlatParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn as_claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_params_to_claims_basic_launch() {
        let converter = ClaimConverter::default();
        let claims = converter.params_to_claims(&params(&[
            ("user_id", "42"),
            ("roles", "Learner, urn:lti:instrole:ims/lis/Student,,"),
            ("context_id", "c1"),
            ("context_type", "CourseSection"),
            ("lti_message_type", "basic-lti-launch-request"),
            ("accept_multiple", "true"),
            ("custom_color", "red"),
            ("ext_lms", "moodle-2"),
            ("oauth_nonce", "dropped"),
        ]));

        assert_eq!(
            Value::Object(claims),
            json!({
                "sub": "42",
                ROLES_CLAIM: [
                    "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Student",
                    "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner"
                ],
                CONTEXT_CLAIM: {
                    "id": "c1",
                    "type": ["http://purl.imsglobal.org/vocab/lis/v2/course#CourseSection"]
                },
                MESSAGE_TYPE_CLAIM: "LtiResourceLinkRequest",
                "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings": {
                    "accept_multiple": true
                },
                CUSTOM_CLAIM: { "color": "red" },
                EXT_CLAIM: { "lms": "moodle-2" }
            })
        );
    }

    #[test]
    fn test_unmappable_roles_are_omitted() {
        let converter = ClaimConverter::default();
        let claims = converter.params_to_claims(&params(&[("roles", "Bogus,Instructor")]));
        assert_eq!(
            claims[ROLES_CLAIM],
            json!(["http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor"])
        );
    }

    #[test]
    fn test_mapped_custom_keys_take_precedence_over_prefix() {
        let converter = ClaimConverter::default();
        let claims =
            converter.params_to_claims(&params(&[("custom_lineitems_url", "https://x/li")]));
        assert_eq!(
            claims["https://purl.imsglobal.org/spec/lti-ags/claim/endpoint"]["lineitems"],
            "https://x/li"
        );
        assert!(!claims.contains_key(CUSTOM_CLAIM));
    }

    #[test]
    fn test_custom_entries_shadowing_mapped_keys_stay_out_of_params() {
        let converter = ClaimConverter::default();
        let claims = as_claims(json!({
            "sub": "42",
            CUSTOM_CLAIM: { "lineitems_url": "https://x/li", "course": "algebra" },
            EXT_CLAIM: { "user_username": "kermit" }
        }));

        let out = converter.claims_to_params(&claims);
        assert_eq!(out["custom_course"], "algebra");
        assert_eq!(out["ext_user_username"], "kermit");
        assert!(!out.contains_key("custom_lineitems_url"));

        let round_tripped = converter.params_to_claims(&out);
        assert_eq!(round_tripped[CUSTOM_CLAIM], json!({ "course": "algebra" }));
        assert_eq!(round_tripped[EXT_CLAIM], json!({ "user_username": "kermit" }));
        assert!(
            !round_tripped.contains_key("https://purl.imsglobal.org/spec/lti-ags/claim/endpoint")
        );
    }

    #[test]
    fn test_legacy_content_items_are_dropped() {
        let converter = ClaimConverter::default();
        let modern = r#"[{"type":"link","url":"https://example.org"}]"#;
        let legacy = r#"{"@context":"x","@graph":[]}"#;

        let claims = converter.params_to_claims(&params(&[("content_items", modern)]));
        assert_eq!(
            claims["https://purl.imsglobal.org/spec/lti-dl/claim/content_items"],
            json!([{ "type": "link", "url": "https://example.org" }])
        );
        assert!(
            converter
                .params_to_claims(&params(&[("content_items", legacy)]))
                .is_empty()
        );
    }

    #[test]
    fn test_claims_to_params_flattening() {
        let converter = ClaimConverter::default();
        let out = converter.claims_to_params(&as_claims(json!({
            "sub": "42",
            ROLES_CLAIM: [
                "http://purl.imsglobal.org/vocab/lis/v2/membership#Manager",
                "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor"
            ],
            MESSAGE_TYPE_CLAIM: "LtiDeepLinkingRequest",
            "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings": {
                "accept_copy_advice": false,
                "accept_types": ["link", "file"]
            },
            "https://purl.imsglobal.org/spec/lti/claim/launch_presentation": {
                "width": 800
            },
            CUSTOM_CLAIM: { "nested": { "a": 1 } },
            "unmapped": "x"
        })));

        assert_eq!(out["user_id"], "42");
        assert_eq!(out["roles"], "urn:lti:role:ims/lis/Instructor");
        assert_eq!(out["lti_message_type"], "ContentItemSelectionRequest");
        assert_eq!(out["accept_copy_advice"], "false");
        assert_eq!(out["accept_types"], "link,file");
        assert_eq!(out["launch_presentation_width"], "800");
        assert_eq!(out["custom_nested"], r#"{"a":1}"#);
        assert!(!out.contains_key("unmapped"));
    }

    #[test]
    fn test_claims_to_params_encodes_legacy_content_items() {
        let converter = ClaimConverter::default();
        let out = converter.claims_to_params(&as_claims(json!({
            "https://purl.imsglobal.org/spec/lti-dl/claim/content_items": [
                { "type": "ltiResourceLink", "title": "A" }
            ]
        })));
        let graph: Value = serde_json::from_str(&out["content_items"]).unwrap();
        assert_eq!(graph["@context"], content_items::CONTENT_ITEM_CONTEXT);
        assert_eq!(graph["@graph"][0]["@type"], "LtiLinkItem");
    }

    #[test]
    fn test_round_trip_of_sorted_claims() {
        let converter = ClaimConverter::default();
        let claims = as_claims(json!({
            "sub": "u-1",
            "given_name": "Ada",
            "email": "ada@example.org",
            ROLES_CLAIM: [
                "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Faculty",
                "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor"
            ],
            CONTEXT_CLAIM: {
                "id": "c1",
                "title": "Algebra",
                "type": ["http://purl.imsglobal.org/vocab/lis/v2/course#CourseOffering"]
            },
            "https://purl.imsglobal.org/spec/lti/claim/resource_link": { "id": "r1" },
            MESSAGE_TYPE_CLAIM: "LtiResourceLinkRequest",
            "https://purl.imsglobal.org/spec/lti/claim/version": "1.3.0",
            "https://purl.imsglobal.org/spec/lti-dl/claim/deep_linking_settings": {
                "accept_unsigned": true,
                "accept_types": ["file", "link"]
            },
            CUSTOM_CLAIM: { "course": "algebra" }
        }));

        let round_tripped = converter.params_to_claims(&converter.claims_to_params(&claims));
        assert_eq!(Value::Object(round_tripped), Value::Object(claims));
    }
}
