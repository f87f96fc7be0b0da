//! Placeholder resolution for custom launch values
//!
//! A value like `$Person.name.full` is replaced with the matching datum from a
//! [`ResolutionContext`]. Values that are not placeholders, or whose data is not
//! available, are returned untouched. This lets the builder resolve context data before
//! the user is known and leave `$User.*` placeholders for the authenticator.

use std::sync::Arc;

use serde_json::Value;

use crate::claims::Claims;
use crate::claims::mapping::{CONTEXT_CLAIM, RESOURCE_LINK_CLAIM, TOOL_PLATFORM_CLAIM};
use crate::types::{ToolRegistration, UserIdentity};

/// Course the launch happens in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseContext {
    /// Context id
    pub id: String,
    /// Title
    pub title: Option<String>,
    /// Short label
    pub label: Option<String>,
    /// Context types, in whatever form the caller holds them
    pub context_types: Vec<String>,
}

/// Placement being launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLinkContext {
    /// Resource link id
    pub id: String,
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
}

/// Data a placeholder may resolve against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Launching user, absent before authentication
    pub user: Option<UserIdentity>,
    /// Course context
    pub course: Option<CourseContext>,
    /// Resource link
    pub resource_link: Option<ResourceLinkContext>,
    /// Platform instance name
    pub platform_name: Option<String>,
}

impl ResolutionContext {
    /// Rebuild course, resource link and platform data from a claim set.
    pub fn from_claims(claims: &Claims) -> Self {
        let course = claims
            .get(CONTEXT_CLAIM)
            .and_then(|context| {
                Some(CourseContext {
                    id: context.get("id")?.as_str()?.to_string(),
                    title: string_field(context, "title"),
                    label: string_field(context, "label"),
                    context_types: context
                        .get("type")
                        .and_then(Value::as_array)
                        .map(|types| {
                            types
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                })
            });

        let resource_link = claims.get(RESOURCE_LINK_CLAIM).and_then(|link| {
            Some(ResourceLinkContext {
                id: link.get("id")?.as_str()?.to_string(),
                title: string_field(link, "title"),
                description: string_field(link, "description"),
            })
        });

        let platform_name = claims
            .get(TOOL_PLATFORM_CLAIM)
            .and_then(|platform| string_field(platform, "name"));

        Self {
            user: None,
            course,
            resource_link,
            platform_name,
        }
    }

    /// Attach the launching user.
    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }
}

fn string_field(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Whether `value` has placeholder syntax.
pub fn is_placeholder(value: &str) -> bool {
    value.starts_with('$')
}

/// Resolves placeholder values.
///
/// The output has the same length as `values`; an entry changes only when it is a
/// recognized placeholder whose data is present in `ctx`.
pub trait VariableSubstitutor: Send + Sync {
    /// Substitute every resolvable placeholder in `values`.
    fn substitute(&self, values: &[String], ctx: &ResolutionContext) -> Vec<String>;
}

impl<F> VariableSubstitutor for F
where
    F: Fn(&[String], &ResolutionContext) -> Vec<String> + Send + Sync,
{
    fn substitute(&self, values: &[String], ctx: &ResolutionContext) -> Vec<String> {
        self(values, ctx)
    }
}

/// Selects the substitutor used for a given tool.
pub trait VariableSubstitutorFactory: Send + Sync {
    /// Substitutor for `registration`.
    fn for_tool(&self, registration: &ToolRegistration) -> Arc<dyn VariableSubstitutor>;
}

impl<F> VariableSubstitutorFactory for F
where
    F: Fn(&ToolRegistration) -> Arc<dyn VariableSubstitutor> + Send + Sync,
{
    fn for_tool(&self, registration: &ToolRegistration) -> Arc<dyn VariableSubstitutor> {
        self(registration)
    }
}

/// Resolves the standard `$User`, `$Person`, `$Context`, `$ResourceLink` and
/// `$ToolPlatformInstance` variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSubstitutor;

impl StandardSubstitutor {
    /// Resolve one placeholder, `None` when unknown or unavailable.
    pub fn resolve(&self, variable: &str, ctx: &ResolutionContext) -> Option<String> {
        let user = ctx.user.as_ref();
        let course = ctx.course.as_ref();
        let link = ctx.resource_link.as_ref();

        match variable {
            "$User.id" => user.map(|u| u.id.clone()),
            "$User.username" => user.and_then(|u| u.username.clone()),
            "$User.image" => user.and_then(|u| u.picture.clone()),
            "$Person.sourcedId" => user.and_then(|u| u.sourced_id.clone()),
            "$Person.name.full" => user.and_then(UserIdentity::display_name),
            "$Person.name.given" => user.and_then(|u| u.given_name.clone()),
            "$Person.name.family" => user.and_then(|u| u.family_name.clone()),
            "$Person.email.primary" => user.and_then(|u| u.email.clone()),
            "$Context.id" => course.map(|c| c.id.clone()),
            "$Context.title" => course.and_then(|c| c.title.clone()),
            "$Context.label" => course.and_then(|c| c.label.clone()),
            "$Context.type" => course
                .filter(|c| !c.context_types.is_empty())
                .map(|c| c.context_types.join(",")),
            "$ResourceLink.id" => link.map(|l| l.id.clone()),
            "$ResourceLink.title" => link.and_then(|l| l.title.clone()),
            "$ResourceLink.description" => link.and_then(|l| l.description.clone()),
            "$ToolPlatformInstance.name" => ctx.platform_name.clone(),
            _ => None,
        }
    }
}

impl VariableSubstitutor for StandardSubstitutor {
    fn substitute(&self, values: &[String], ctx: &ResolutionContext) -> Vec<String> {
        values
            .iter()
            .map(|value| {
                if is_placeholder(value) {
                    self.resolve(value, ctx).unwrap_or_else(|| value.clone())
                } else {
                    value.clone()
                }
            })
            .collect()
    }
}

/// Hands every tool the [`StandardSubstitutor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSubstitutorFactory;

impl VariableSubstitutorFactory for StandardSubstitutorFactory {
    fn for_tool(&self, _registration: &ToolRegistration) -> Arc<dyn VariableSubstitutor> {
        Arc::new(StandardSubstitutor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn user() -> UserIdentity {
        UserIdentity {
            id: "u-7".into(),
            username: Some("ada".into()),
            given_name: Some("Ada".into()),
            family_name: Some("Lovelace".into()),
            email: Some("ada@example.org".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_placeholders_need_a_user() {
        let values = strings(&["$Person.name.full", "$User.id", "plain"]);

        let before = StandardSubstitutor.substitute(&values, &ResolutionContext::default());
        assert_eq!(before, values);

        let ctx = ResolutionContext::default().with_user(user());
        let after = StandardSubstitutor.substitute(&values, &ctx);
        assert_eq!(after, strings(&["Ada Lovelace", "u-7", "plain"]));
    }

    #[test]
    fn test_unknown_and_missing_data_stay_literal() {
        let ctx = ResolutionContext::default().with_user(UserIdentity::new("1"));
        let values = strings(&["$Person.email.primary", "$Unknown.thing", "$"]);
        assert_eq!(StandardSubstitutor.substitute(&values, &ctx), values);
    }

    #[test]
    fn test_context_from_claims() {
        let claims = json!({
            CONTEXT_CLAIM: {
                "id": "c1",
                "title": "Algebra",
                "type": ["http://purl.imsglobal.org/vocab/lis/v2/course#CourseOffering"]
            },
            RESOURCE_LINK_CLAIM: { "id": "r1", "title": "Week 1" },
            TOOL_PLATFORM_CLAIM: { "name": "Campus LMS" }
        });
        let Value::Object(claims) = claims else {
            unreachable!()
        };
        let ctx = ResolutionContext::from_claims(&claims);

        let values = strings(&[
            "$Context.id",
            "$Context.title",
            "$Context.label",
            "$ResourceLink.title",
            "$ToolPlatformInstance.name",
        ]);
        assert_eq!(
            StandardSubstitutor.substitute(&values, &ctx),
            strings(&["c1", "Algebra", "$Context.label", "Week 1", "Campus LMS"])
        );
    }

    #[test]
    fn test_closure_is_a_substitutor() {
        let upper = |values: &[String], _: &ResolutionContext| -> Vec<String> {
            values.iter().map(|v| v.to_uppercase()).collect()
        };
        let substitutor: Arc<dyn VariableSubstitutor> = Arc::new(upper);
        assert_eq!(
            substitutor.substitute(&strings(&["a"]), &ResolutionContext::default()),
            strings(&["A"])
        );
    }
}
