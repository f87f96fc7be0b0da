//! Context-type vocabulary. The three forms are in a total 1:1 correspondence.

use std::collections::HashMap;

use super::roles::LIS_V2;

const LEGACY_PREFIX: &str = "urn:lti:context-type:ims/lis/";

const HANDLES: &[&str] = &["CourseTemplate", "CourseOffering", "CourseSection", "Group"];

/// Frozen context-type lookup tables.
#[derive(Debug, Clone)]
pub struct ContextTypeTable {
    legacy_to_modern: HashMap<String, String>,
    modern_to_legacy: HashMap<String, String>,
    handles: HashMap<String, (String, String)>,
}

impl ContextTypeTable {
    /// Build the standard course context-type tables.
    pub fn standard() -> Self {
        let mut table = Self {
            legacy_to_modern: HashMap::new(),
            modern_to_legacy: HashMap::new(),
            handles: HashMap::new(),
        };
        for handle in HANDLES {
            let legacy = format!("{LEGACY_PREFIX}{handle}");
            let modern = format!("{LIS_V2}/course#{handle}");
            table.legacy_to_modern.insert(legacy.clone(), modern.clone());
            table.modern_to_legacy.insert(modern.clone(), legacy.clone());
            table
                .handles
                .insert((*handle).to_string(), (legacy, modern));
        }
        table
    }

    /// Convert one context type to its legacy URN.
    pub fn to_legacy(&self, value: &str) -> Option<String> {
        if let Some(legacy) = self.modern_to_legacy.get(value) {
            return Some(legacy.clone());
        }
        if let Some((legacy, _)) = self.handles.get(value) {
            return Some(legacy.clone());
        }
        self.legacy_to_modern
            .contains_key(value)
            .then(|| value.to_string())
    }

    /// Convert one context type to its LIS v2 URI.
    pub fn to_modern(&self, value: &str) -> Option<String> {
        if let Some(modern) = self.legacy_to_modern.get(value) {
            return Some(modern.clone());
        }
        if let Some((_, modern)) = self.handles.get(value) {
            return Some(modern.clone());
        }
        self.modern_to_legacy
            .contains_key(value)
            .then(|| value.to_string())
    }
}
