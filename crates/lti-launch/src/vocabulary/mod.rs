//! Role and context-type vocabulary conversion
//!
//! Translates between the three forms LTI uses for the same identifiers:
//!
//! - legacy URNs (`urn:lti:role:ims/lis/Learner`)
//! - LIS v2 URIs (`http://purl.imsglobal.org/vocab/lis/v2/membership#Learner`)
//! - handles (`Learner`, `Instructor/TeachingAssistant`), context roles only
//!
//! Every method preserves the input length: unknown or unmappable entries become `None`
//! in place, and duplicates are kept.
//!
//! The tables are built once by [`Vocabulary::standard`] and shared by reference; there
//! is no global registry.

mod context_types;
mod roles;

pub use context_types::ContextTypeTable;
pub use roles::{LIS_V2, RoleTable};

/// Immutable role and context-type lookup service.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    roles: RoleTable,
    context_types: ContextTypeTable,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

impl Vocabulary {
    /// Build the standard LIS vocabulary tables.
    pub fn standard() -> Self {
        Self {
            roles: RoleTable::standard(),
            context_types: ContextTypeTable::standard(),
        }
    }

    /// Convert roles to their legacy URN form.
    ///
    /// Modern roles without a legacy equivalent (`membership#Manager`, the `Officer`
    /// family) become `None`.
    pub fn to_legacy_roles<S: AsRef<str>>(&self, roles: &[Option<S>]) -> Vec<Option<String>> {
        roles
            .iter()
            .map(|role| {
                role.as_ref()
                    .and_then(|r| self.roles.to_legacy(r.as_ref()))
            })
            .collect()
    }

    /// Convert roles to their LIS v2 form.
    ///
    /// With `use_deprecated_prefixes`, system and institution person roles are written
    /// as `.../lis/v2/person#<Name>`.
    pub fn to_modern_roles<S: AsRef<str>>(
        &self,
        roles: &[Option<S>],
        use_deprecated_prefixes: bool,
    ) -> Vec<Option<String>> {
        roles
            .iter()
            .map(|role| {
                role.as_ref()
                    .and_then(|r| self.roles.to_modern(r.as_ref(), use_deprecated_prefixes))
            })
            .collect()
    }

    /// Convert context types to their legacy URN form.
    pub fn to_legacy_context_types<S: AsRef<str>>(
        &self,
        types: &[Option<S>],
    ) -> Vec<Option<String>> {
        types
            .iter()
            .map(|t| {
                t.as_ref()
                    .and_then(|t| self.context_types.to_legacy(t.as_ref()))
            })
            .collect()
    }

    /// Convert context types to their LIS v2 form.
    pub fn to_modern_context_types<S: AsRef<str>>(
        &self,
        types: &[Option<S>],
    ) -> Vec<Option<String>> {
        types
            .iter()
            .map(|t| {
                t.as_ref()
                    .and_then(|t| self.context_types.to_modern(t.as_ref()))
            })
            .collect()
    }
}
