//! Pipeline orchestration: CSV rows in, printable card deck out.
//!
//! Sequences schema resolution, template validation, record reading, weblink
//! and QR generation, card rendering, and page composition. Structural
//! failures (schema, templates) abort before any per-record work; individual
//! bad rows are collected per `object_id` and skipped; compilation failures
//! leave every earlier artifact on disk.

use crate::config::RunConfig;
use crate::constants::MAPPING_FILE_NAME;
use crate::error::{Error, Result};
use crate::models::{CardDocument, QrAsset, Record, RecordFailure, RunSummary};
use crate::services::card_renderer::{self, CardTemplate};
use crate::services::geolink;
use crate::services::page_compositor::{self, DocumentCompiler, LayoutTemplate};
use crate::services::qr_assets::QrAssetGenerator;
use crate::services::schema_resolver::{self, MappingOverrides};
use crate::services::survey_reader;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Orchestrates one full card generation run
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    compiler: &'a dyn DocumentCompiler,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a RunConfig, compiler: &'a dyn DocumentCompiler) -> Self {
        Self { config, compiler }
    }

    /// Run the complete pipeline against one input CSV
    ///
    /// Returns a [`RunSummary`] on full or partial success. Errors mean no
    /// deck was produced: schema/template defects, a dataset where every row
    /// failed, or a failed compilation.
    pub fn run(&self, input: &Path) -> Result<RunSummary> {
        let started = Instant::now();
        self.config.validate()?;

        // Schema resolution happens before anything is written.
        let mapping = self.resolve_schema(input)?;

        // Template defects abort before any per-record work.
        let card_template = match &self.config.card_template {
            Some(path) => CardTemplate::load(path)?,
            None => CardTemplate::built_in(),
        };
        card_template.validate()?;
        let layout_template = match &self.config.layout_template {
            Some(path) => LayoutTemplate::load(path)?,
            None => LayoutTemplate::built_in(),
        };

        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            Error::io(
                format!(
                    "creating output directory {}",
                    self.config.output_dir.display()
                ),
                e,
            )
        })?;

        let (records, mut failures) = survey_reader::read_records(input, &mapping)?;
        let rows_read = records.len() + failures.len();
        info!(
            "Read {} row(s) from {} ({} skipped during parsing)",
            rows_read,
            input.display(),
            failures.len()
        );

        // Per-record weblink + QR generation, in input order.
        let generator = QrAssetGenerator::new(self.config.qr_dir())?;
        let (produced, assets) = self.generate_assets(&generator, &records, &mut failures)?;

        // Reader-phase and generation-phase failures land in one list; order
        // it by source row so the report follows the input file.
        failures.sort_by_key(|f| f.row);

        if produced.is_empty() {
            return Err(Error::data_validation(format!(
                "no cards could be produced: all {rows_read} row(s) failed validation"
            )));
        }

        // Manifest failure is reported, never fatal: image assets and the
        // manifest are independently durable.
        let manifest_path = match generator.write_manifest(&assets) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("Manifest write failed: {e}");
                None
            }
        };

        let documents = self.render_cards(&produced, &card_template)?;

        let compiler = (!self.config.skip_compile).then_some(self.compiler);
        let (layout_path, document_path, page_pairs) = page_compositor::compose(
            &documents,
            self.config.cards_per_page,
            &self.config.page_size,
            &layout_template,
            &self.config.output_dir,
            compiler,
        )?;

        Ok(RunSummary {
            rows_read,
            qr_generated: assets.len(),
            cards_written: documents.len(),
            failures,
            manifest_path,
            layout_path: Some(layout_path),
            document_path,
            page_pairs,
            processing_time: started.elapsed(),
        })
    }

    /// Resolve the input header row against the canonical schema
    fn resolve_schema(&self, input: &Path) -> Result<schema_resolver::HeaderMapping> {
        let mapping_path = self
            .config
            .mapping_file
            .clone()
            .unwrap_or_else(|| input.with_file_name(MAPPING_FILE_NAME));
        let overrides = MappingOverrides::load(&mapping_path)?;

        let headers = survey_reader::read_headers(input)?;
        schema_resolver::resolve_or_fail(&headers, &overrides)
    }

    /// Derive weblinks and generate QR assets, collecting per-record failures
    ///
    /// Errors outside the per-record taxonomy (an unwritable output
    /// directory, say) abort the run instead of being swallowed into the
    /// failure list.
    fn generate_assets(
        &self,
        generator: &QrAssetGenerator,
        records: &[Record],
        failures: &mut Vec<RecordFailure>,
    ) -> Result<(Vec<(Record, QrAsset)>, Vec<QrAsset>)> {
        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(records.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap()
                    .progress_chars("#>-"),
            );
            bar.set_message("Generating QR assets...");
            Some(bar)
        } else {
            None
        };

        let mut produced = Vec::new();
        let mut assets = Vec::new();

        for record in records {
            if let Some(bar) = &progress {
                bar.inc(1);
            }

            let url = match geolink::link(record.longitude, record.latitude, self.config.zoom) {
                Ok(url) => url,
                Err(e) if e.is_per_record() => {
                    warn!("Skipping record '{}': {e}", record.object_id);
                    failures.push(RecordFailure::new(
                        record.row,
                        &record.object_id,
                        e.to_string(),
                    ));
                    continue;
                }
                Err(e) => return Err(e),
            };

            match generator.generate(&record.object_id, &url) {
                Ok(asset) => {
                    assets.push(asset.clone());
                    produced.push((record.clone(), asset));
                }
                Err(e) if e.is_per_record() => {
                    warn!("Skipping record '{}': {e}", record.object_id);
                    failures.push(RecordFailure::new(
                        record.row,
                        &record.object_id,
                        e.to_string(),
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }
        Ok((produced, assets))
    }

    /// Render and write one card document per surviving record
    fn render_cards(
        &self,
        produced: &[(Record, QrAsset)],
        template: &CardTemplate,
    ) -> Result<Vec<CardDocument>> {
        let cards_dir = self.config.cards_dir();
        let mut documents = Vec::with_capacity(produced.len());
        for (record, asset) in produced {
            let document = card_renderer::render(record, asset, template)?;
            card_renderer::write_card(&document, &cards_dir)?;
            documents.push(document);
        }
        info!(
            "Wrote {} card document(s) to {}",
            documents.len(),
            cards_dir.display()
        );
        Ok(documents)
    }
}
