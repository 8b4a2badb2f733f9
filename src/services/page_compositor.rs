//! Page composition and document compilation.
//!
//! Groups rendered cards into front/back page pairs for duplex printing,
//! assembles a single LaTeX source from a layout template, and hands it to
//! an external document compiler behind the [`DocumentCompiler`] trait so
//! tests can substitute a recording double.
//!
//! Slot *k* of every front page holds the same logical card as slot *k* of
//! its paired back page; a partial final page is padded with empty slots,
//! never with duplicated content.

use crate::constants::{DEFAULT_LAYOUT_TEMPLATE, DOCUMENT_STEM};
use crate::error::{Error, Result};
use crate::models::CardDocument;
use crate::services::card_renderer::{self, FIELD_NAMES};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One slot on a page face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Card at this index of the ordered card sequence
    Filled(usize),
    /// Padding on a partial final page
    Empty,
}

/// A front page and its positionally aligned back page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePair {
    pub front: Vec<Slot>,
    pub back: Vec<Slot>,
}

/// Group an ordered card sequence into page pairs
///
/// Pure function; every page face carries exactly `cards_per_page` slots,
/// with the tail of the final pair padded by [`Slot::Empty`].
pub fn paginate(card_count: usize, cards_per_page: usize) -> Result<Vec<PagePair>> {
    if cards_per_page == 0 {
        return Err(Error::data_validation(
            "cards per page must be at least 1".to_string(),
        ));
    }

    let mut pairs = Vec::new();
    let mut index = 0;
    while index < card_count {
        let slots: Vec<Slot> = (0..cards_per_page)
            .map(|offset| {
                let i = index + offset;
                if i < card_count {
                    Slot::Filled(i)
                } else {
                    Slot::Empty
                }
            })
            .collect();
        pairs.push(PagePair {
            front: slots.clone(),
            back: slots,
        });
        index += cards_per_page;
    }
    Ok(pairs)
}

/// A parsed layout template: fixed preamble/postamble around repeatable
/// per-slot blocks
#[derive(Debug, Clone)]
pub struct LayoutTemplate {
    preamble: String,
    card_block: String,
    qr_block: String,
    empty_block: String,
    postamble: String,
}

impl LayoutTemplate {
    /// The built-in LaTeX layout
    pub fn built_in() -> Self {
        Self::parse(DEFAULT_LAYOUT_TEMPLATE).expect("built-in layout template is well-formed")
    }

    /// Load and parse a layout template from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading layout template {}", path.display()), e))?;
        Self::parse(&text)
    }

    /// Parse the `{{#card}}`/`{{#qr}}`/`{{#empty}}` repetition blocks
    pub fn parse(text: &str) -> Result<Self> {
        let (card_block, card_span) = extract_block(text, "card")?
            .ok_or_else(|| Error::template("layout template is missing a {{#card}} block"))?;
        let (qr_block, qr_span) = extract_block(text, "qr")?
            .ok_or_else(|| Error::template("layout template is missing a {{#qr}} block"))?;
        let empty = extract_block(text, "empty")?;

        let mut starts = vec![card_span.0, qr_span.0];
        let mut ends = vec![card_span.1, qr_span.1];
        if let Some((_, span)) = &empty {
            starts.push(span.0);
            ends.push(span.1);
        }
        let preamble = text[..*starts.iter().min().unwrap()].to_string();
        let postamble = text[*ends.iter().max().unwrap()..].to_string();

        let template = Self {
            preamble,
            card_block,
            qr_block,
            empty_block: empty.map(|(block, _)| block).unwrap_or_default(),
            postamble,
        };
        template.validate()?;
        Ok(template)
    }

    /// Check block placeholders against the card field set
    fn validate(&self) -> Result<()> {
        let re = Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex is valid");
        let mut unknown = Vec::new();
        for block in [&self.card_block, &self.qr_block, &self.empty_block] {
            for capture in re.captures_iter(block) {
                let name = capture[1].to_string();
                if !FIELD_NAMES.contains(&name.as_str()) && !unknown.contains(&name) {
                    unknown.push(name);
                }
            }
        }
        for fixed in [&self.preamble, &self.postamble] {
            for capture in re.captures_iter(fixed) {
                let name = capture[1].to_string();
                if name != "page_size" && !unknown.contains(&name) {
                    unknown.push(name);
                }
            }
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            unknown.sort();
            Err(Error::template(format!(
                "layout template references unknown placeholder(s): {}",
                unknown.join(", ")
            )))
        }
    }
}

/// Find a named block, returning its content and full marker span
fn extract_block(text: &str, name: &str) -> Result<Option<(String, (usize, usize))>> {
    let open = format!("{{{{#{name}}}}}");
    let close = format!("{{{{/{name}}}}}");

    let Some(start) = text.find(&open) else {
        if text.contains(&close) {
            return Err(Error::template(format!(
                "layout template has {close} without {open}"
            )));
        }
        return Ok(None);
    };
    let content_start = start + open.len();
    let Some(relative_end) = text[content_start..].find(&close) else {
        return Err(Error::template(format!(
            "layout template has {open} without {close}"
        )));
    };
    let content_end = content_start + relative_end;
    Ok(Some((
        text[content_start..content_end].to_string(),
        (start, content_end + close.len()),
    )))
}

/// Escape LaTeX special characters in substituted field values
fn escape_latex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Field map with text values escaped for LaTeX; asset paths pass through
fn latex_fields(document: &CardDocument) -> BTreeMap<String, String> {
    document
        .fields
        .iter()
        .map(|(name, value)| {
            let rendered = if name == "qr_code" || name == "qr_code_filename" {
                value.clone()
            } else {
                escape_latex(value)
            };
            (name.clone(), rendered)
        })
        .collect()
}

/// Assemble the complete layout source for all cards
///
/// Returns the LaTeX text and the number of page pairs composed.
pub fn assemble(
    documents: &[CardDocument],
    cards_per_page: usize,
    page_size: &str,
    template: &LayoutTemplate,
) -> Result<(String, usize)> {
    let pairs = paginate(documents.len(), cards_per_page)?;
    let mut source = template.preamble.replace("{{page_size}}", page_size);

    let render_slot = |slot: &Slot, block: &str| -> String {
        match slot {
            Slot::Filled(index) => {
                card_renderer::substitute(block, &latex_fields(&documents[*index]))
            }
            Slot::Empty => template.empty_block.clone(),
        }
    };

    for (pair_index, pair) in pairs.iter().enumerate() {
        for slot in &pair.front {
            source.push_str(&render_slot(slot, &template.card_block));
        }
        source.push_str("\\newpage\n");
        for slot in &pair.back {
            source.push_str(&render_slot(slot, &template.qr_block));
        }
        if pair_index + 1 < pairs.len() {
            source.push_str("\\newpage\n");
        }
    }

    source.push_str(&template.postamble.replace("{{page_size}}", page_size));
    Ok((source, pairs.len()))
}

/// Capability interface for the external document compiler
pub trait DocumentCompiler {
    /// Compile `source` into `output`, which must exist on success
    fn compile(&self, source: &Path, output: &Path) -> Result<()>;
}

/// Production compiler: pandoc with the xelatex PDF engine
#[derive(Debug, Clone)]
pub struct PandocCompiler {
    timeout: Duration,
}

impl PandocCompiler {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Working directory and paths for one pandoc invocation
///
/// The assembled source references QR images by paths relative to its own
/// directory, and pandoc resolves relative resources against its working
/// directory. Running pandoc from the source's directory keeps those
/// references valid no matter where the user launched the program; the
/// output path is absolutized so the directory change cannot move it.
fn invocation_paths(source: &Path, output: &Path) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let work_dir = match source.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let source_name = source.file_name().map(PathBuf::from).ok_or_else(|| {
        Error::compilation(format!("invalid source path {}", source.display()))
    })?;
    let output = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::io("resolving current directory", e))?
            .join(output)
    };
    Ok((work_dir, source_name, output))
}

impl DocumentCompiler for PandocCompiler {
    fn compile(&self, source: &Path, output: &Path) -> Result<()> {
        info!(
            "Compiling {} -> {}",
            source.display(),
            output.display()
        );
        let (work_dir, source_name, output) = invocation_paths(source, output)?;
        let mut child = Command::new("pandoc")
            .current_dir(&work_dir)
            .arg(&source_name)
            .arg("-o")
            .arg(&output)
            .arg("--pdf-engine=xelatex")
            .stdout(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::compilation(format!("cannot launch pandoc (is it installed?): {e}"))
            })?;

        // Bounded wait: poll rather than block, so a hung compiler cannot
        // stall the run indefinitely.
        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if started.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::compilation(format!(
                            "pandoc timed out after {}s",
                            self.timeout.as_secs()
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(Error::compilation(format!(
                        "waiting for pandoc failed: {e}"
                    )));
                }
            }
        };

        if !status.success() {
            return Err(Error::compilation(format!(
                "pandoc exited with status {status}"
            )));
        }
        Ok(())
    }
}

/// Write the layout source and run the compiler exactly once
///
/// Earlier artifacts (QR assets, cards, the manifest) are never deleted on
/// compilation failure.
pub fn compose(
    documents: &[CardDocument],
    cards_per_page: usize,
    page_size: &str,
    template: &LayoutTemplate,
    output_dir: &Path,
    compiler: Option<&dyn DocumentCompiler>,
) -> Result<(PathBuf, Option<PathBuf>, usize)> {
    let (source, page_pairs) = assemble(documents, cards_per_page, page_size, template)?;

    let layout_path = output_dir.join(format!("{DOCUMENT_STEM}.tex"));
    fs::write(&layout_path, &source)
        .map_err(|e| Error::io(format!("writing layout {}", layout_path.display()), e))?;
    debug!(
        "Layout source written: {} ({} page pair(s))",
        layout_path.display(),
        page_pairs
    );

    let Some(compiler) = compiler else {
        info!(
            "Compilation skipped; layout source left at {}",
            layout_path.display()
        );
        return Ok((layout_path, None, page_pairs));
    };

    let document_path = output_dir.join(format!("{DOCUMENT_STEM}.pdf"));
    compiler.compile(&layout_path, &document_path)?;

    if !document_path.exists() {
        return Err(Error::compilation(format!(
            "compiler reported success but produced no file at {}",
            document_path.display()
        )));
    }
    info!("Compiled document: {}", document_path.display());
    Ok((layout_path, Some(document_path), page_pairs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn test_document(object_id: &str) -> CardDocument {
        let mut fields = BTreeMap::new();
        for name in FIELD_NAMES {
            fields.insert(name.to_string(), format!("{name}-{object_id}"));
        }
        fields.insert("title".to_string(), format!("Project {object_id}"));
        CardDocument {
            object_id: object_id.to_string(),
            content: String::new(),
            fields,
        }
    }

    #[test]
    fn ten_cards_four_per_page_make_three_padded_pairs() {
        let pairs = paginate(10, 4).unwrap();
        assert_eq!(pairs.len(), 3);

        for pair in &pairs {
            assert_eq!(pair.front.len(), 4);
            assert_eq!(pair.back.len(), 4);
            // Slot k of the back page holds the same logical card as slot k
            // of the front page.
            for (front, back) in pair.front.iter().zip(&pair.back) {
                assert_eq!(front, back);
            }
        }

        let last = &pairs[2];
        assert_eq!(last.front[0], Slot::Filled(8));
        assert_eq!(last.front[1], Slot::Filled(9));
        assert_eq!(last.front[2], Slot::Empty);
        assert_eq!(last.front[3], Slot::Empty);
    }

    #[test]
    fn exact_multiple_has_no_padding() {
        let pairs = paginate(8, 4).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(
            pairs
                .iter()
                .all(|p| p.front.iter().all(|s| matches!(s, Slot::Filled(_))))
        );
    }

    #[test]
    fn zero_cards_make_zero_pairs() {
        assert!(paginate(0, 4).unwrap().is_empty());
    }

    #[test]
    fn zero_cards_per_page_is_a_validation_error_not_a_panic() {
        let err = paginate(3, 0).unwrap_err();
        assert!(matches!(err, Error::DataValidation { .. }));
    }

    #[test]
    fn built_in_layout_parses() {
        let template = LayoutTemplate::built_in();
        assert!(template.preamble.contains("{{page_size}}"));
        assert!(template.card_block.contains("{{title}}"));
        assert!(template.qr_block.contains("{{qr_code}}"));
        assert!(!template.empty_block.is_empty());
    }

    #[test]
    fn missing_card_block_is_a_template_error() {
        let err = LayoutTemplate::parse("\\begin{document}\n{{#qr}}x{{/qr}}\n\\end{document}")
            .unwrap_err();
        assert!(err.to_string().contains("{{#card}}"));
    }

    #[test]
    fn unterminated_block_is_a_template_error() {
        let err =
            LayoutTemplate::parse("{{#card}}x{{/card}}\n{{#qr}}never closed").unwrap_err();
        assert!(matches!(err, Error::Template { .. }));
    }

    #[test]
    fn unknown_block_placeholder_is_a_template_error() {
        let text = "{{#card}}{{not_a_field}}{{/card}}{{#qr}}{{qr_code}}{{/qr}}";
        let err = LayoutTemplate::parse(text).unwrap_err();
        assert!(err.to_string().contains("not_a_field"));
    }

    #[test]
    fn assemble_orders_cards_and_substitutes_page_size() {
        let documents: Vec<CardDocument> =
            (1..=3).map(|i| test_document(&i.to_string())).collect();
        let (source, page_pairs) =
            assemble(&documents, 2, "letterpaper", &LayoutTemplate::built_in()).unwrap();

        assert_eq!(page_pairs, 2);
        assert!(source.contains("letterpaper"));
        assert!(!source.contains("{{page_size}}"));

        // Front slots come in input order, QR backs follow their fronts
        let p1 = source.find("Project 1").unwrap();
        let p2 = source.find("Project 2").unwrap();
        let p3 = source.find("Project 3").unwrap();
        assert!(p1 < p2 && p2 < p3);
        assert!(source.find("qr_code-1").unwrap() > p2);
    }

    #[test]
    fn latex_specials_are_escaped_in_text_fields_only() {
        let mut document = test_document("1");
        document
            .fields
            .insert("description".to_string(), "50% grant & A_B".to_string());
        document
            .fields
            .insert("qr_code".to_string(), "qr_codes/qr_1.png".to_string());

        let (source, _) =
            assemble(&[document], 1, "a4paper", &LayoutTemplate::built_in()).unwrap();
        assert!(source.contains(r"50\% grant \& A\_B"));
        assert!(source.contains("qr_codes/qr_1.png"));
    }

    #[test]
    fn compose_without_compiler_leaves_tex_only() {
        let dir = tempfile::TempDir::new().unwrap();
        let documents = vec![test_document("1")];
        let (layout_path, document_path, page_pairs) = compose(
            &documents,
            4,
            "a4paper",
            &LayoutTemplate::built_in(),
            dir.path(),
            None,
        )
        .unwrap();

        assert!(layout_path.exists());
        assert_eq!(document_path, None);
        assert_eq!(page_pairs, 1);
    }

    #[test]
    fn compiler_runs_from_the_source_directory() {
        let (work_dir, source_name, output) = invocation_paths(
            Path::new("output/printable_cards.tex"),
            Path::new("output/printable_cards.pdf"),
        )
        .unwrap();

        // Relative qr_codes/ references in the source resolve against the
        // source's own directory, not wherever the process was launched.
        assert_eq!(work_dir, Path::new("output"));
        assert_eq!(source_name, Path::new("printable_cards.tex"));
        assert!(output.is_absolute());
        assert!(output.ends_with("output/printable_cards.pdf"));
    }

    #[test]
    fn bare_source_name_compiles_from_the_current_directory() {
        let (work_dir, source_name, output) =
            invocation_paths(Path::new("cards.tex"), Path::new("/tmp/cards.pdf")).unwrap();

        assert_eq!(work_dir, Path::new("."));
        assert_eq!(source_name, Path::new("cards.tex"));
        assert_eq!(output, Path::new("/tmp/cards.pdf"));
    }

    struct FailingCompiler;
    impl DocumentCompiler for FailingCompiler {
        fn compile(&self, _source: &Path, _output: &Path) -> Result<()> {
            Err(Error::compilation("simulated failure"))
        }
    }

    #[test]
    fn compiler_failure_keeps_layout_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let documents = vec![test_document("1")];
        let err = compose(
            &documents,
            4,
            "a4paper",
            &LayoutTemplate::built_in(),
            dir.path(),
            Some(&FailingCompiler),
        )
        .unwrap_err();

        assert!(matches!(err, Error::Compilation { .. }));
        assert!(dir.path().join("printable_cards.tex").exists());
    }

    struct LyingCompiler;
    impl DocumentCompiler for LyingCompiler {
        fn compile(&self, _source: &Path, _output: &Path) -> Result<()> {
            Ok(()) // claims success without writing anything
        }
    }

    #[test]
    fn missing_output_after_success_is_a_compilation_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = compose(
            &[test_document("1")],
            4,
            "a4paper",
            &LayoutTemplate::built_in(),
            dir.path(),
            Some(&LyingCompiler),
        )
        .unwrap_err();
        assert!(err.to_string().contains("produced no file"));
    }
}
