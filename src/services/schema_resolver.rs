//! Canonical schema resolution for survey CSV headers.
//!
//! Survey exports rarely arrive with pristine column names: trailing spaces,
//! case changes, and renamed questions are all common. The resolver matches
//! the actual header row against the fixed canonical field set after
//! normalization, then falls back to persisted per-field overrides, and
//! reports exactly which canonical fields remain unresolved.
//!
//! Resolution itself is pure; persistence of new overrides is a front-end
//! concern layered on [`MappingOverrides`].

use crate::constants::headers;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// The fixed logical fields the pipeline requires, independent of the input
/// file's actual column naming
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalField {
    ObjectId,
    Name,
    Organization,
    Description,
    Feasibility,
    DifficultyScore,
    SmoothAspects,
    Challenges,
    Funders,
    Longitude,
    Latitude,
}

impl CanonicalField {
    /// All canonical fields, in manifest/report order
    pub fn all() -> &'static [CanonicalField] {
        &[
            CanonicalField::ObjectId,
            CanonicalField::Name,
            CanonicalField::Organization,
            CanonicalField::Description,
            CanonicalField::Feasibility,
            CanonicalField::DifficultyScore,
            CanonicalField::SmoothAspects,
            CanonicalField::Challenges,
            CanonicalField::Funders,
            CanonicalField::Longitude,
            CanonicalField::Latitude,
        ]
    }

    /// Stable snake_case name, used as the override-file key
    pub fn canonical_name(&self) -> &'static str {
        match self {
            CanonicalField::ObjectId => "object_id",
            CanonicalField::Name => "name",
            CanonicalField::Organization => "organization",
            CanonicalField::Description => "description",
            CanonicalField::Feasibility => "feasibility",
            CanonicalField::DifficultyScore => "difficulty_score",
            CanonicalField::SmoothAspects => "smooth_aspects",
            CanonicalField::Challenges => "challenges",
            CanonicalField::Funders => "funders",
            CanonicalField::Longitude => "longitude",
            CanonicalField::Latitude => "latitude",
        }
    }

    /// The survey column header this field matches by default
    pub fn default_header(&self) -> &'static str {
        match self {
            CanonicalField::ObjectId => headers::OBJECT_ID,
            CanonicalField::Name => headers::NAME,
            CanonicalField::Organization => headers::ORGANIZATION,
            CanonicalField::Description => headers::DESCRIPTION,
            CanonicalField::Feasibility => headers::FEASIBILITY,
            CanonicalField::DifficultyScore => headers::DIFFICULTY_SCORE,
            CanonicalField::SmoothAspects => headers::SMOOTH_ASPECTS,
            CanonicalField::Challenges => headers::CHALLENGES,
            CanonicalField::Funders => headers::FUNDERS,
            CanonicalField::Longitude => headers::LONGITUDE,
            CanonicalField::Latitude => headers::LATITUDE,
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Resolved correspondence between canonical fields and actual input columns
///
/// Two canonical fields may legitimately resolve to the same input column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping {
    columns: BTreeMap<CanonicalField, String>,
}

impl HeaderMapping {
    /// Actual input column name for a canonical field
    ///
    /// Every canonical field is guaranteed present in a successfully
    /// resolved mapping.
    pub fn column(&self, field: CanonicalField) -> &str {
        self.columns
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_header())
    }
}

/// Persisted per-field overrides: canonical field name -> actual header
///
/// Serialized as a flat JSON object so any front end (CLI prompt, web form)
/// can append entries without understanding the rest of the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingOverrides {
    entries: BTreeMap<String, String>,
}

impl MappingOverrides {
    /// Load overrides from a JSON file, returning the empty set when the
    /// file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No mapping overrides file at {}", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading mapping file {}", path.display()), e))?;
        let overrides: Self = serde_json::from_str(&raw).map_err(|e| {
            Error::data_validation(format!(
                "mapping file {} is not a valid JSON object: {e}",
                path.display()
            ))
        })?;
        info!(
            "Loaded {} mapping override(s) from {}",
            overrides.entries.len(),
            path.display()
        );
        Ok(overrides)
    }

    /// Persist overrides as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| Error::data_validation(format!("serializing mapping overrides: {e}")))?;
        fs::write(path, raw)
            .map_err(|e| Error::io(format!("writing mapping file {}", path.display()), e))?;
        Ok(())
    }

    /// Record an override for a canonical field
    pub fn insert(&mut self, field: CanonicalField, actual_header: impl Into<String>) {
        self.entries
            .insert(field.canonical_name().to_string(), actual_header.into());
    }

    fn get(&self, field: CanonicalField) -> Option<&str> {
        self.entries
            .get(field.canonical_name())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trim and case-fold a header for comparison
fn normalize(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Resolve input headers against the canonical field set
///
/// Pure function: matches each canonical field's default header against the
/// actual headers after normalization, then consults `overrides` for fields
/// still unresolved (an override only applies when its target header is
/// actually present). Returns the unresolved canonical fields on failure.
pub fn resolve(
    actual_headers: &[String],
    overrides: &MappingOverrides,
) -> std::result::Result<HeaderMapping, Vec<CanonicalField>> {
    let normalized: Vec<(String, &String)> = actual_headers
        .iter()
        .map(|h| (normalize(h), h))
        .collect();

    let find = |wanted: &str| -> Option<String> {
        let wanted = normalize(wanted);
        normalized
            .iter()
            .find(|(norm, _)| *norm == wanted)
            .map(|(_, original)| (*original).clone())
    };

    let mut columns = BTreeMap::new();
    let mut unresolved = Vec::new();

    for &field in CanonicalField::all() {
        let matched = find(field.default_header())
            .or_else(|| overrides.get(field).and_then(&find));

        match matched {
            Some(column) => {
                columns.insert(field, column);
            }
            None => unresolved.push(field),
        }
    }

    if unresolved.is_empty() {
        Ok(HeaderMapping { columns })
    } else {
        Err(unresolved)
    }
}

/// Resolve headers, converting unresolved fields into a fatal error
pub fn resolve_or_fail(
    actual_headers: &[String],
    overrides: &MappingOverrides,
) -> Result<HeaderMapping> {
    resolve(actual_headers, overrides).map_err(|unresolved| {
        Error::missing_headers(
            unresolved
                .iter()
                .map(|f| f.default_header().to_string())
                .collect(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn headers_of(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn full_header_set() -> Vec<String> {
        CanonicalField::all()
            .iter()
            .map(|f| f.default_header().to_string())
            .collect()
    }

    #[test]
    fn exact_headers_resolve() {
        let mapping = resolve(&full_header_set(), &MappingOverrides::default()).unwrap();
        assert_eq!(mapping.column(CanonicalField::ObjectId), "OBJECTID");
        assert_eq!(mapping.column(CanonicalField::Longitude), "x");
    }

    #[test]
    fn trailing_space_and_case_resolve_via_normalization() {
        // "Describe the opportunity " (trailing space) must match without
        // any manual mapping.
        let mut headers = full_header_set();
        let idx = headers
            .iter()
            .position(|h| h == "Describe the opportunity")
            .unwrap();
        headers[idx] = "Describe the opportunity ".to_string();
        headers[0] = "objectid".to_string();

        let mapping = resolve(&headers, &MappingOverrides::default()).unwrap();
        assert_eq!(
            mapping.column(CanonicalField::Description),
            "Describe the opportunity "
        );
        assert_eq!(mapping.column(CanonicalField::ObjectId), "objectid");
    }

    #[test]
    fn unresolved_fields_are_named_exactly() {
        let headers = headers_of(&["OBJECTID", "x", "y"]);
        let unresolved = resolve(&headers, &MappingOverrides::default()).unwrap_err();
        assert!(unresolved.contains(&CanonicalField::Description));
        assert!(unresolved.contains(&CanonicalField::Funders));
        assert!(!unresolved.contains(&CanonicalField::ObjectId));
        assert!(!unresolved.contains(&CanonicalField::Longitude));
    }

    #[test]
    fn empty_header_set_always_fails() {
        let unresolved = resolve(&[], &MappingOverrides::default()).unwrap_err();
        assert_eq!(unresolved.len(), CanonicalField::all().len());
    }

    #[test]
    fn override_applies_when_target_header_present() {
        let mut headers = full_header_set();
        let idx = headers
            .iter()
            .position(|h| h == "Describe the opportunity")
            .unwrap();
        headers[idx] = "Opportunity details".to_string();

        let mut overrides = MappingOverrides::default();
        overrides.insert(CanonicalField::Description, "Opportunity details");

        let mapping = resolve(&headers, &overrides).unwrap();
        assert_eq!(
            mapping.column(CanonicalField::Description),
            "Opportunity details"
        );
    }

    #[test]
    fn override_ignored_when_target_header_absent() {
        let mut headers = full_header_set();
        headers.retain(|h| h != "Describe the opportunity");

        let mut overrides = MappingOverrides::default();
        overrides.insert(CanonicalField::Description, "Not an actual column");

        let unresolved = resolve(&headers, &overrides).unwrap_err();
        assert_eq!(unresolved, vec![CanonicalField::Description]);
    }

    #[test]
    fn two_canonical_fields_may_share_one_column() {
        let mut headers = full_header_set();
        headers.retain(|h| h != "Your Organization");

        let mut overrides = MappingOverrides::default();
        overrides.insert(CanonicalField::Organization, "Your Name");

        let mapping = resolve(&headers, &overrides).unwrap();
        assert_eq!(mapping.column(CanonicalField::Name), "Your Name");
        assert_eq!(mapping.column(CanonicalField::Organization), "Your Name");
    }

    #[test]
    fn overrides_round_trip_through_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("header_mapping.json");

        let mut overrides = MappingOverrides::default();
        overrides.insert(CanonicalField::Description, "Opportunity details");
        overrides.save(&path).unwrap();

        let loaded = MappingOverrides::load(&path).unwrap();
        assert_eq!(
            loaded.get(CanonicalField::Description),
            Some("Opportunity details")
        );
    }

    #[test]
    fn missing_overrides_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let loaded = MappingOverrides::load(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_empty());
    }
}
