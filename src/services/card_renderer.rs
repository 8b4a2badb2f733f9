//! Card rendering from a placeholder template.
//!
//! Each record becomes one Markdown card: the template's `{{field}}`
//! placeholders are substituted from a tagged field map built off the record
//! and its QR asset. The field set is fixed, including the historical alias
//! pairs the survey templates grew (`contact`/`contact_person`,
//! `funders`/`potential_funders`, `feasible_3yr`/`feasibility_next_3_years`).
//! A placeholder outside that set is a template defect and fails the run
//! before any per-record work.

use crate::constants::{DEFAULT_CARD_TEMPLATE, QR_DIR_NAME, card_file_name};
use crate::error::{Error, Result};
use crate::models::{CardDocument, QrAsset, Record};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder names templates may reference
pub const FIELD_NAMES: &[&str] = &[
    "title",
    "contact",
    "contact_person",
    "organization",
    "description",
    "funders",
    "potential_funders",
    "feasible_3yr",
    "feasibility_next_3_years",
    "opportunities",
    "challenges",
    "difficulty_score",
    "qr_code",
    "qr_code_filename",
];

fn placeholder_regex() -> Regex {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex is valid")
}

/// A loaded and validated card template
#[derive(Debug, Clone)]
pub struct CardTemplate {
    text: String,
}

impl CardTemplate {
    /// The built-in front-matter Markdown template
    pub fn built_in() -> Self {
        Self {
            text: DEFAULT_CARD_TEMPLATE.to_string(),
        }
    }

    /// Load a template from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading card template {}", path.display()), e))?;
        Ok(Self { text })
    }

    /// Check every placeholder against the fixed field set
    ///
    /// Run once before any per-record work, so a template defect aborts the
    /// run instead of corrupting every card.
    pub fn validate(&self) -> Result<()> {
        let re = placeholder_regex();
        let mut unknown: Vec<String> = re
            .captures_iter(&self.text)
            .map(|c| c[1].to_string())
            .filter(|name| !FIELD_NAMES.contains(&name.as_str()))
            .collect();
        unknown.sort();
        unknown.dedup();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::template(format!(
                "card template references unknown placeholder(s): {}",
                unknown.join(", ")
            )))
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Build the tagged field map for one record and its QR asset
///
/// The `qr_code` path is relative to the output root, where the assembled
/// layout document lives.
pub fn field_map(record: &Record, asset: &QrAsset) -> BTreeMap<String, String> {
    let qr_relative = format!("{}/{}", QR_DIR_NAME, asset.file_name());
    let difficulty = record
        .difficulty_score
        .map(|s| s.to_string())
        .unwrap_or_default();

    let mut fields = BTreeMap::new();
    fields.insert("title".into(), format!("Project {}", record.object_id));
    fields.insert("contact".into(), record.name.clone());
    fields.insert("contact_person".into(), record.name.clone());
    fields.insert("organization".into(), record.organization.clone());
    fields.insert("description".into(), record.description.clone());
    fields.insert("funders".into(), record.funders.clone());
    fields.insert("potential_funders".into(), record.funders.clone());
    fields.insert("feasible_3yr".into(), record.feasibility.clone());
    fields.insert(
        "feasibility_next_3_years".into(),
        record.feasibility.clone(),
    );
    fields.insert("opportunities".into(), record.smooth_aspects.clone());
    fields.insert("challenges".into(), record.challenges.clone());
    fields.insert("difficulty_score".into(), difficulty);
    fields.insert("qr_code".into(), qr_relative);
    fields.insert("qr_code_filename".into(), asset.file_name());
    fields
}

/// Substitute `{{field}}` placeholders in a template body
pub fn substitute(template: &str, fields: &BTreeMap<String, String>) -> String {
    let mut content = template.to_string();
    for (name, value) in fields {
        content = content.replace(&format!("{{{{{name}}}}}"), value);
    }
    content
}

/// Render one card document
///
/// Fails if any placeholder survives substitution; an unresolved placeholder
/// is never silently carried into the output.
pub fn render(record: &Record, asset: &QrAsset, template: &CardTemplate) -> Result<CardDocument> {
    let fields = field_map(record, asset);
    let content = substitute(template.text(), &fields);

    if let Some(leftover) = placeholder_regex().captures(&content) {
        return Err(Error::template(format!(
            "placeholder '{{{{{}}}}}' was not resolved during rendering",
            &leftover[1]
        )));
    }

    Ok(CardDocument {
        object_id: record.object_id.clone(),
        content,
        fields,
    })
}

/// Write a rendered card into the cards directory
pub fn write_card(document: &CardDocument, cards_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(cards_dir)
        .map_err(|e| Error::io(format!("creating cards directory {}", cards_dir.display()), e))?;
    let path = cards_dir.join(card_file_name(&document.object_id));
    fs::write(&path, &document.content)
        .map_err(|e| Error::io(format!("writing card {}", path.display()), e))?;
    debug!("Card written: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_record(object_id: &str) -> Record {
        Record {
            row: 2,
            object_id: object_id.to_string(),
            name: "Ada Lovelace".to_string(),
            organization: "Analytical Society".to_string(),
            description: "Restore the mill pond".to_string(),
            feasibility: "Yes".to_string(),
            difficulty_score: Some(3),
            smooth_aspects: "Permits".to_string(),
            challenges: "Funding gaps".to_string(),
            funders: "Parks levy".to_string(),
            longitude: -93.4983819,
            latitude: 44.97368603,
        }
    }

    fn test_asset(object_id: &str) -> QrAsset {
        QrAsset {
            object_id: object_id.to_string(),
            file_path: PathBuf::from(format!("/tmp/qr_codes/qr_{object_id}.png")),
            source_url: "https://www.google.com/maps?q=44.97368603,-93.4983819&t=k&z=18"
                .to_string(),
        }
    }

    #[test]
    fn built_in_template_validates() {
        CardTemplate::built_in().validate().unwrap();
    }

    #[test]
    fn unknown_placeholder_is_a_template_error() {
        let template = CardTemplate {
            text: "# {{title}}\n\n{{surprise_field}}\n".to_string(),
        };
        let err = template.validate().unwrap_err();
        assert!(err.to_string().contains("surprise_field"));
    }

    #[test]
    fn render_substitutes_all_fields_and_aliases() {
        let record = test_record("6");
        let asset = test_asset("6");
        let document = render(&record, &asset, &CardTemplate::built_in()).unwrap();

        assert_eq!(document.object_id, "6");
        assert!(document.content.contains("Project 6"));
        assert!(document.content.contains("Ada Lovelace"));
        assert!(document.content.contains("qr_codes/qr_6.png"));
        assert!(!document.content.contains("{{"));

        // Alias pairs resolve to the same value
        assert_eq!(document.field("contact"), document.field("contact_person"));
        assert_eq!(document.field("funders"), document.field("potential_funders"));
        assert_eq!(
            document.field("feasible_3yr"),
            document.field("feasibility_next_3_years")
        );
    }

    #[test]
    fn missing_difficulty_renders_empty() {
        let mut record = test_record("6");
        record.difficulty_score = None;
        let document = render(&record, &test_asset("6"), &CardTemplate::built_in()).unwrap();
        assert_eq!(document.field("difficulty_score"), "");
    }

    #[test]
    fn render_fails_on_unresolved_placeholder() {
        let template = CardTemplate {
            text: "{{title}} and {{mystery}}".to_string(),
        };
        let err = render(&test_record("6"), &test_asset("6"), &template).unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn write_card_uses_object_id_keyed_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let document = render(
            &test_record("42"),
            &test_asset("42"),
            &CardTemplate::built_in(),
        )
        .unwrap();

        let path = write_card(&document, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "card_42.md");
        assert_eq!(std::fs::read_to_string(path).unwrap(), document.content);
    }

    proptest! {
        /// Any placeholder outside the fixed field set fails rendering;
        /// unresolved placeholders are never silently dropped.
        #[test]
        fn render_never_drops_unresolved_placeholders(
            name in "[a-z][a-z0-9_]{0,20}",
        ) {
            let template = CardTemplate {
                text: format!("# {{{{title}}}}\n\n{{{{{name}}}}}"),
            };
            let outcome = render(&test_record("1"), &test_asset("1"), &template);
            if FIELD_NAMES.contains(&name.as_str()) {
                prop_assert!(outcome.is_ok());
            } else {
                prop_assert!(
                    matches!(outcome, Err(Error::Template { .. })),
                    "expected Error::Template, got {:?}",
                    outcome
                );
            }
        }
    }
}
