//! Conversion between flat launch parameters and claims, seen from outside the crate.

mod common;

use common::*;
use lti_launch::claims::mapping::{
    CONTEXT_CLAIM, CUSTOM_CLAIM, EXT_CLAIM, MappingTable, ROLES_CLAIM,
};
use lti_launch::launch::LaunchRequest;
use lti_launch::substitution::CourseContext;
use lti_launch::{
    ClaimConverter, Claims, ContentItemError, FlatParams, LaunchRequestBuilder, LtiVersion,
    StandardSubstitutorFactory, Vocabulary, convert_content_items_modern_to_legacy,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value, json};

fn params(pairs: &[(&str, &str)]) -> FlatParams {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn test_legacy_launch_and_hint_describe_the_same_context() {
    let platform = platform();
    let user = ada();
    let course = CourseContext {
        id: "alg-101".to_string(),
        title: Some("Algebra".to_string()),
        label: Some("ALG".to_string()),
        context_types: vec!["CourseOffering".to_string()],
    };

    let mut legacy_registration = registration();
    legacy_registration.version = LtiVersion::V1_1;
    let legacy = LaunchRequestBuilder::new(
        &platform,
        &legacy_registration,
        &StandardSubstitutorFactory,
    )
    .roles(["Instructor", "urn:lti:instrole:ims/lis/Faculty"])
    .course(course.clone())
    .custom("where", "$Context.label")
    .build(&user)
    .unwrap();
    let LaunchRequest::Legacy { params, .. } = legacy else {
        panic!("expected a flat launch");
    };
    let from_legacy = platform.converter().params_to_claims(&params);

    let modern_registration = registration();
    let login = login_initiation(
        LaunchRequestBuilder::new(&platform, &modern_registration, &StandardSubstitutorFactory)
            .roles(["Instructor", "urn:lti:instrole:ims/lis/Faculty"])
            .course(course)
            .custom("where", "$Context.label"),
        &user,
    );
    let hint = platform
        .codec()
        .verify(&login.lti_message_hint, platform.key_set())
        .unwrap();

    for claim in [ROLES_CLAIM, CONTEXT_CLAIM, CUSTOM_CLAIM] {
        assert_eq!(from_legacy[claim], hint[claim], "{claim}");
    }
    assert_eq!(
        hint[CONTEXT_CLAIM],
        json!({
            "id": "alg-101",
            "title": "Algebra",
            "label": "ALG",
            "type": ["http://purl.imsglobal.org/vocab/lis/v2/course#CourseOffering"]
        })
    );
    assert_eq!(hint[CUSTOM_CLAIM]["where"], "ALG");

    // Only the flat launch carries the user.
    assert_eq!(from_legacy["sub"], "user-7");
    assert_eq!(from_legacy["name"], "Ada Lovelace");
    assert!(hint.get("sub").is_none());
}

#[test]
fn test_claims_to_params_legacy_vocabulary() {
    let converter = ClaimConverter::default();
    let out = converter.claims_to_params(&claims(json!({
        ROLES_CLAIM: [
            "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner",
            "http://purl.imsglobal.org/vocab/lis/v2/institution/person#Student"
        ],
        CONTEXT_CLAIM: {
            "id": "c1",
            "type": ["http://purl.imsglobal.org/vocab/lis/v2/course#CourseSection"]
        },
        EXT_CLAIM: { "lms": "campus" }
    })));

    assert_eq!(
        out["roles"],
        "urn:lti:role:ims/lis/Learner,urn:lti:instrole:ims/lis/Student"
    );
    assert_eq!(out["context_id"], "c1");
    assert_eq!(out["context_type"], "urn:lti:context-type:ims/lis/CourseSection");
    assert_eq!(out["ext_lms"], "campus");
}

#[test]
fn test_content_items_public_transform() {
    let legacy = convert_content_items_modern_to_legacy(
        r#"[{"type":"file","title":"Syllabus","url":"https://tool.example/s.pdf",
            "thumbnail":{"url":"https://tool.example/t.png","width":32}}]"#,
    )
    .unwrap();
    let legacy: Value = serde_json::from_str(&legacy).unwrap();
    assert_eq!(
        legacy["@graph"][0],
        json!({
            "@type": "FileItem",
            "title": "Syllabus",
            "url": "https://tool.example/s.pdf",
            "thumbnail": { "@id": "https://tool.example/t.png", "width": 32 }
        })
    );

    assert_eq!(
        convert_content_items_modern_to_legacy(r#"{"not":"an array"}"#).unwrap(),
        r#"{"not":"an array"}"#
    );
    assert!(matches!(
        convert_content_items_modern_to_legacy("[{"),
        Err(ContentItemError::Malformed(_))
    ));
}

#[test]
fn test_vocabulary_through_public_api() {
    let vocabulary = Vocabulary::standard();
    let modern = vocabulary.to_modern_roles(
        &[Some("Instructor"), None, Some("urn:lti:sysrole:ims/lis/SysAdmin"), Some("?")],
        false,
    );
    assert_eq!(
        modern,
        vec![
            Some("http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor".to_string()),
            None,
            Some("http://purl.imsglobal.org/vocab/lis/v2/system/person#SysAdmin".to_string()),
            None,
        ]
    );

    let legacy = vocabulary.to_legacy_context_types(&[Some("Group")]);
    assert_eq!(
        legacy,
        vec![Some("urn:lti:context-type:ims/lis/Group".to_string())]
    );
}

proptest! {
    #[test]
    fn prop_custom_params_survive_round_trip(
        name in "[a-z][a-z0-9]{0,11}",
        value in "[ -~]{0,40}",
    ) {
        let converter = ClaimConverter::default();
        let key = format!("custom_{name}");
        let flat = params(&[(key.as_str(), value.as_str())]);

        let claims = converter.params_to_claims(&flat);
        let back = converter.claims_to_params(&claims);
        prop_assert_eq!(back.get(&key).map(String::as_str), Some(value.as_str()));
    }

    #[test]
    fn prop_custom_claims_round_trip_without_leaking_into_mapped_claims(
        name in prop_oneof![
            "[a-z][a-z_]{0,15}",
            Just("lineitems_url".to_string()),
            Just("scores_url".to_string()),
        ],
        value in "[ -~]{1,40}",
    ) {
        let converter = ClaimConverter::default();
        let mut custom = serde_json::Map::new();
        custom.insert(name.clone(), Value::from(value.as_str()));
        let mut input = Claims::new();
        input.insert(CUSTOM_CLAIM.to_string(), Value::Object(custom));

        let back = converter.params_to_claims(&converter.claims_to_params(&input));
        let shadowed = MappingTable::new()
            .for_legacy_key(&format!("custom_{name}"))
            .is_some();
        if shadowed {
            prop_assert!(back.is_empty());
        } else {
            prop_assert_eq!(back, input);
        }
    }
}
