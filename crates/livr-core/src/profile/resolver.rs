//! Supplier detection.

use tracing::{debug, info};

use crate::models::delivery::UNKNOWN_SUPPLIER;
use crate::profile::{CompiledProfile, ProfileSet};
use crate::text::normalize_light;

/// Outcome of supplier detection.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Detected supplier name, or "unknown".
    pub supplier: String,
    /// The resolved profile, if any.
    pub profile: Option<&'a CompiledProfile>,
}

impl Resolution<'_> {
    fn unknown() -> Self {
        Self {
            supplier: UNKNOWN_SUPPLIER.to_string(),
            profile: None,
        }
    }
}

/// Resolve the supplier of a document from its lines.
///
/// Profiles are tested in declaration order and the first one with a
/// detection pattern contained in the text wins. With `normalize` set, both
/// sides are compared in lowercase with accents stripped. A store holding a
/// single profile resolves to it when nothing matched.
pub fn resolve<'a>(lines: &[String], profiles: &'a ProfileSet, normalize: bool) -> Resolution<'a> {
    if profiles.is_empty() {
        debug!("Profile store is empty, supplier is unknown");
        return Resolution::unknown();
    }

    let joined = lines.join("\n");
    let text = if normalize {
        normalize_light(&joined)
    } else {
        joined
    };

    for profile in profiles.iter() {
        let patterns = if normalize {
            &profile.normalized_patterns
        } else {
            &profile.detection_patterns
        };

        if let Some(pattern) = patterns.iter().find(|p| text.contains(p.as_str())) {
            info!("Detected supplier '{}' (pattern '{}')", profile.name, pattern);
            return Resolution {
                supplier: profile.name.clone(),
                profile: Some(profile),
            };
        }
    }

    if profiles.len() == 1 {
        if let Some(profile) = profiles.iter().next() {
            info!("No detection pattern matched, falling back to sole profile '{}'", profile.name);
            return Resolution {
                supplier: profile.name.clone(),
                profile: Some(profile),
            };
        }
    }

    debug!("No supplier detected");
    Resolution::unknown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ProfileStore;

    fn profiles(json: &str) -> ProfileSet {
        let store = ProfileStore::from_json(json).unwrap();
        ProfileSet::compile(&store).unwrap()
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const TWO: &str = r#"{
        "suppliers": {
            "A": { "detection_patterns": ["Alpha GmbH"], "item_pattern": "x" },
            "B": { "detection_patterns": ["Beta Électrique"], "item_pattern": "x" }
        }
    }"#;

    #[test]
    fn test_second_profile_matches() {
        let set = profiles(TWO);
        let resolution = resolve(&lines("Delivery note\nBeta Électrique SA"), &set, true);
        assert_eq!(resolution.supplier, "B");
        assert!(resolution.profile.is_some());
    }

    #[test]
    fn test_match_ignores_case_and_accents() {
        let set = profiles(TWO);
        let resolution = resolve(&lines("BETA ELECTRIQUE SA"), &set, true);
        assert_eq!(resolution.supplier, "B");
    }

    #[test]
    fn test_exact_mode_is_case_sensitive() {
        let set = profiles(TWO);
        let resolution = resolve(&lines("BETA ELECTRIQUE SA"), &set, false);
        assert_eq!(resolution.supplier, UNKNOWN_SUPPLIER);
        assert!(resolution.profile.is_none());
    }

    #[test]
    fn test_first_declared_wins() {
        let set = profiles(TWO);
        let resolution = resolve(&lines("Alpha GmbH and Beta Électrique"), &set, true);
        assert_eq!(resolution.supplier, "A");
    }

    #[test]
    fn test_single_profile_fallback() {
        let set = profiles(
            r#"{ "suppliers": { "Only": { "detection_patterns": ["nowhere"], "item_pattern": "x" } } }"#,
        );
        let resolution = resolve(&lines("unrelated text"), &set, true);
        assert_eq!(resolution.supplier, "Only");
    }

    #[test]
    fn test_no_match_is_unknown() {
        let set = profiles(TWO);
        let resolution = resolve(&lines("Gamma Ltd"), &set, true);
        assert_eq!(resolution.supplier, UNKNOWN_SUPPLIER);
    }

    #[test]
    fn test_empty_store_is_unknown() {
        let set = ProfileSet::default();
        let resolution = resolve(&lines("Alpha GmbH"), &set, true);
        assert_eq!(resolution.supplier, UNKNOWN_SUPPLIER);
    }

    #[test]
    fn test_match_across_lines() {
        let set = profiles(
            r#"{ "suppliers": {
                "A": { "detection_patterns": ["Alpha\nGmbH"], "item_pattern": "x" },
                "B": { "detection_patterns": ["zzz"], "item_pattern": "x" }
            } }"#,
        );
        let resolution = resolve(&lines("Alpha\nGmbH"), &set, false);
        assert_eq!(resolution.supplier, "A");
    }
}
