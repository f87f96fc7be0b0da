//! Role vocabulary: legacy URNs, LIS v2 URIs and membership handles.

use std::collections::HashMap;

/// Root of the LIS v2 vocabulary.
pub const LIS_V2: &str = "http://purl.imsglobal.org/vocab/lis/v2";

const LEGACY_SYSTEM_PREFIX: &str = "urn:lti:sysrole:ims/lis/";
const LEGACY_INSTITUTION_PREFIX: &str = "urn:lti:instrole:ims/lis/";
const LEGACY_CONTEXT_PREFIX: &str = "urn:lti:role:ims/lis/";

/// System roles that exist in both eras under the same name.
const SYSTEM_ROLES: &[&str] = &[
    "AccountAdmin",
    "Administrator",
    "Creator",
    "None",
    "SysAdmin",
    "SysSupport",
    "User",
];

/// Institution roles that exist in both eras under the same name.
const INSTITUTION_ROLES: &[&str] = &[
    "Administrator",
    "Alumni",
    "Faculty",
    "Guest",
    "Instructor",
    "Learner",
    "Member",
    "Mentor",
    "None",
    "Observer",
    "Other",
    "ProspectiveStudent",
    "Staff",
    "Student",
];

/// Context roles: legacy path under `urn:lti:role:ims/lis/` and the fragment appended
/// to `<LIS_V2>/membership`. Each pair is bidirectional.
const CONTEXT_ROLES: &[(&str, &str)] = &[
    ("Administrator", "#Administrator"),
    ("Administrator/Administrator", "/Administrator#Administrator"),
    ("Administrator/Developer", "/Administrator#Developer"),
    ("Administrator/ExternalDeveloper", "/Administrator#ExternalDeveloper"),
    ("Administrator/ExternalSupport", "/Administrator#ExternalSupport"),
    (
        "Administrator/ExternalSystemAdministrator",
        "/Administrator#ExternalSystemAdministrator",
    ),
    ("Administrator/Support", "/Administrator#Support"),
    ("Administrator/SystemAdministrator", "/Administrator#SystemAdministrator"),
    ("ContentDeveloper", "#ContentDeveloper"),
    ("ContentDeveloper/ContentDeveloper", "/ContentDeveloper#ContentDeveloper"),
    ("ContentDeveloper/ContentExpert", "/ContentDeveloper#ContentExpert"),
    (
        "ContentDeveloper/ExternalContentExpert",
        "/ContentDeveloper#ExternalContentExpert",
    ),
    ("ContentDeveloper/Librarian", "/ContentDeveloper#Librarian"),
    ("Instructor", "#Instructor"),
    ("Instructor/ExternalInstructor", "/Instructor#ExternalInstructor"),
    ("Instructor/GuestInstructor", "/Instructor#GuestInstructor"),
    ("Instructor/Lecturer", "/Instructor#Lecturer"),
    ("Instructor/PrimaryInstructor", "/Instructor#PrimaryInstructor"),
    ("Learner", "#Learner"),
    ("Learner/ExternalLearner", "/Learner#ExternalLearner"),
    ("Learner/GuestLearner", "/Learner#GuestLearner"),
    ("Learner/Instructor", "/Learner#Instructor"),
    ("Learner/Learner", "/Learner#Learner"),
    ("Learner/NonCreditLearner", "/Learner#NonCreditLearner"),
    ("Manager/AreaManager", "/Manager#AreaManager"),
    ("Manager/CourseCoordinator", "/Manager#CourseCoordinator"),
    ("Manager/ExternalObserver", "/Manager#ExternalObserver"),
    ("Manager/Observer", "/Manager#Observer"),
    ("Member", "#Member"),
    ("Member/Member", "/Member#Member"),
    ("Mentor", "#Mentor"),
    ("Mentor/Advisor", "/Mentor#Advisor"),
    ("Mentor/Auditor", "/Mentor#Auditor"),
    ("Mentor/ExternalAdvisor", "/Mentor#ExternalAdvisor"),
    ("Mentor/ExternalAuditor", "/Mentor#ExternalAuditor"),
    ("Mentor/ExternalLearningFacilitator", "/Mentor#ExternalLearningFacilitator"),
    ("Mentor/ExternalMentor", "/Mentor#ExternalMentor"),
    ("Mentor/ExternalReviewer", "/Mentor#ExternalReviewer"),
    ("Mentor/ExternalTutor", "/Mentor#ExternalTutor"),
    ("Mentor/LearningFacilitator", "/Mentor#LearningFacilitator"),
    ("Mentor/Mentor", "/Mentor#Mentor"),
    ("Mentor/Reviewer", "/Mentor#Reviewer"),
    ("Mentor/Tutor", "/Mentor#Tutor"),
    // LIS v2 folds teaching assistants under Instructor.
    ("TeachingAssistant", "/Instructor#TeachingAssistant"),
    ("TeachingAssistant/Grader", "/Instructor#Grader"),
    (
        "TeachingAssistant/TeachingAssistantGroup",
        "/Instructor#TeachingAssistantGroup",
    ),
    (
        "TeachingAssistant/TeachingAssistantOffering",
        "/Instructor#TeachingAssistantOffering",
    ),
    (
        "TeachingAssistant/TeachingAssistantSection",
        "/Instructor#TeachingAssistantSection",
    ),
    (
        "TeachingAssistant/TeachingAssistantSectionAssociation",
        "/Instructor#TeachingAssistantSectionAssociation",
    ),
    (
        "TeachingAssistant/TeachingAssistantTemplate",
        "/Instructor#TeachingAssistantTemplate",
    ),
];

/// Legacy context roles that convert one way only (the reverse uses the canonical pair).
const CONTEXT_ROLE_ALIASES: &[(&str, &str)] = &[(
    "TeachingAssistant/TeachingAssistant",
    "/Instructor#TeachingAssistant",
)];

/// Legacy context roles with no LIS v2 counterpart.
const LEGACY_ONLY_CONTEXT_ROLES: &[&str] = &["Manager"];

/// Membership fragments with no legacy counterpart.
const MODERN_ONLY_CONTEXT_ROLES: &[&str] = &[
    "#Manager",
    "#Officer",
    "/Officer#Chair",
    "/Officer#Communications",
    "/Officer#Secretary",
    "/Officer#Treasurer",
    "/Officer#Vice-Chair",
];

/// System roles introduced in LIS v2.
const MODERN_ONLY_SYSTEM_ROLES: &[&str] = &["TestUser"];

/// Frozen role lookup tables.
#[derive(Debug, Clone)]
pub struct RoleTable {
    legacy_to_modern: HashMap<String, Option<String>>,
    modern_to_legacy: HashMap<String, Option<String>>,
    handle_to_modern: HashMap<String, String>,
}

impl RoleTable {
    /// Build the standard LIS role tables.
    pub fn standard() -> Self {
        let mut table = Self {
            legacy_to_modern: HashMap::new(),
            modern_to_legacy: HashMap::new(),
            handle_to_modern: HashMap::new(),
        };

        for name in SYSTEM_ROLES {
            table.insert_pair(
                format!("{LEGACY_SYSTEM_PREFIX}{name}"),
                format!("{LIS_V2}/system/person#{name}"),
            );
        }
        for name in INSTITUTION_ROLES {
            table.insert_pair(
                format!("{LEGACY_INSTITUTION_PREFIX}{name}"),
                format!("{LIS_V2}/institution/person#{name}"),
            );
        }
        for (path, fragment) in CONTEXT_ROLES {
            let modern = membership_uri(fragment);
            table.insert_handle(fragment, &modern);
            table.insert_pair(format!("{LEGACY_CONTEXT_PREFIX}{path}"), modern);
        }
        for (path, fragment) in CONTEXT_ROLE_ALIASES {
            table
                .legacy_to_modern
                .insert(format!("{LEGACY_CONTEXT_PREFIX}{path}"), Some(membership_uri(fragment)));
        }
        for path in LEGACY_ONLY_CONTEXT_ROLES {
            table
                .legacy_to_modern
                .insert(format!("{LEGACY_CONTEXT_PREFIX}{path}"), None);
        }
        for fragment in MODERN_ONLY_CONTEXT_ROLES {
            let modern = membership_uri(fragment);
            table.insert_handle(fragment, &modern);
            table.modern_to_legacy.insert(modern, None);
        }
        for name in MODERN_ONLY_SYSTEM_ROLES {
            table
                .modern_to_legacy
                .insert(format!("{LIS_V2}/system/person#{name}"), None);
        }

        table
    }

    fn insert_pair(&mut self, legacy: String, modern: String) {
        self.legacy_to_modern
            .insert(legacy.clone(), Some(modern.clone()));
        self.modern_to_legacy.insert(modern, Some(legacy));
    }

    fn insert_handle(&mut self, fragment: &str, modern: &str) {
        self.handle_to_modern
            .insert(handle_for(fragment), modern.to_string());
    }

    /// Convert one role to its legacy form.
    pub fn to_legacy(&self, role: &str) -> Option<String> {
        if let Some(legacy) = self.modern_to_legacy.get(role) {
            return legacy.clone();
        }
        if let Some(legacy) = self
            .handle_to_modern
            .get(role)
            .and_then(|modern| self.modern_to_legacy.get(modern))
            .and_then(Clone::clone)
        {
            return Some(legacy);
        }
        if self.legacy_to_modern.contains_key(role) {
            return Some(role.to_string());
        }
        None
    }

    /// Convert one role to its LIS v2 form.
    pub fn to_modern(&self, role: &str, use_deprecated_prefixes: bool) -> Option<String> {
        let modern = if let Some(modern) = self.legacy_to_modern.get(role) {
            modern.clone()
        } else if let Some(modern) = self.handle_to_modern.get(role) {
            Some(modern.clone())
        } else if self.modern_to_legacy.contains_key(role) {
            Some(role.to_string())
        } else {
            None
        };

        match modern {
            Some(uri) if use_deprecated_prefixes => Some(with_deprecated_prefix(uri)),
            other => other,
        }
    }

    /// Whether `role` is a known LIS v2 URI.
    pub fn is_modern(&self, role: &str) -> bool {
        self.modern_to_legacy.contains_key(role)
    }

    /// Whether `role` is a known legacy URN.
    pub fn is_legacy(&self, role: &str) -> bool {
        self.legacy_to_modern.contains_key(role)
    }
}

fn membership_uri(fragment: &str) -> String {
    format!("{LIS_V2}/membership{fragment}")
}

/// `#Learner` becomes `Learner`, `/Instructor#Grader` becomes `Instructor/Grader`.
fn handle_for(fragment: &str) -> String {
    match fragment.strip_prefix('#') {
        Some(name) => name.to_string(),
        None => fragment.trim_start_matches('/').replacen('#', "/", 1),
    }
}

/// Rewrite system and institution person roles to the pre-final `v2/person#` form.
fn with_deprecated_prefix(uri: String) -> String {
    let system = format!("{LIS_V2}/system/person#");
    let institution = format!("{LIS_V2}/institution/person#");
    match uri
        .strip_prefix(&system)
        .or_else(|| uri.strip_prefix(&institution))
    {
        Some(name) => format!("{LIS_V2}/person#{name}"),
        None => uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_for_principal_and_sub_role() {
        assert_eq!(handle_for("#Learner"), "Learner");
        assert_eq!(handle_for("/Instructor#Grader"), "Instructor/Grader");
        assert_eq!(handle_for("/Officer#Vice-Chair"), "Officer/Vice-Chair");
    }

    #[test]
    fn test_teaching_assistant_alias_is_one_way() {
        let table = RoleTable::standard();
        let modern = table
            .to_modern("urn:lti:role:ims/lis/TeachingAssistant/TeachingAssistant", false)
            .unwrap();
        assert_eq!(
            modern,
            "http://purl.imsglobal.org/vocab/lis/v2/membership/Instructor#TeachingAssistant"
        );
        assert_eq!(
            table.to_legacy(&modern).as_deref(),
            Some("urn:lti:role:ims/lis/TeachingAssistant")
        );
    }

    #[test]
    fn test_legacy_manager_is_unmappable() {
        let table = RoleTable::standard();
        assert!(table.is_legacy("urn:lti:role:ims/lis/Manager"));
        assert!(!table.is_modern("urn:lti:role:ims/lis/Manager"));
        assert!(table.is_modern(&format!("{LIS_V2}/membership#Manager")));
        assert!(!table.is_legacy(&format!("{LIS_V2}/membership#Manager")));
        assert_eq!(table.to_modern("urn:lti:role:ims/lis/Manager", false), None);
        // Still recognized as legacy, so it converts to itself.
        assert_eq!(
            table.to_legacy("urn:lti:role:ims/lis/Manager").as_deref(),
            Some("urn:lti:role:ims/lis/Manager")
        );
    }

    #[test]
    fn test_system_handle_does_not_resolve() {
        let table = RoleTable::standard();
        assert_eq!(table.to_modern("SysAdmin", false), None);
        assert_eq!(table.to_legacy("SysAdmin"), None);
    }
}
