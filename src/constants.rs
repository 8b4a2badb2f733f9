//! Application constants for the card generation pipeline.
//!
//! Canonical survey headers, output file naming, default run parameters,
//! and the built-in card and layout templates.

// =============================================================================
// Canonical Survey Headers
// =============================================================================

/// Default survey column headers, matched after trim + case-fold normalization
pub mod headers {
    pub const OBJECT_ID: &str = "OBJECTID";
    pub const NAME: &str = "Your Name";
    pub const ORGANIZATION: &str = "Your Organization";
    pub const DESCRIPTION: &str = "Describe the opportunity";
    pub const FEASIBILITY: &str = "Is the opportunity feasible in the next 3 years?";
    pub const DIFFICULTY_SCORE: &str = "How difficult would this be? (1-5)";
    pub const SMOOTH_ASPECTS: &str = "What do you expect would go smoothly?";
    pub const CHALLENGES: &str = "What would you expect to be challenging?";
    pub const FUNDERS: &str = "Who might be a potential funder of this work?";
    pub const LONGITUDE: &str = "x";
    pub const LATITUDE: &str = "y";
}

// =============================================================================
// Output Tree Naming
// =============================================================================

/// Directory for QR PNG assets, under the output root
pub const QR_DIR_NAME: &str = "qr_codes";

/// Directory for rendered card documents, under the output root
pub const CARDS_DIR_NAME: &str = "cards";

/// File name of the QR asset manifest, written into the QR directory
pub const MANIFEST_FILE_NAME: &str = "qr_metadata.csv";

/// Stem of the assembled LaTeX source and compiled PDF
pub const DOCUMENT_STEM: &str = "printable_cards";

/// File name of the persisted header mapping overrides
pub const MAPPING_FILE_NAME: &str = "header_mapping.json";

/// QR asset file name for a record identifier
pub fn qr_file_name(object_id: &str) -> String {
    format!("qr_{object_id}.png")
}

/// Card document file name for a record identifier
pub fn card_file_name(object_id: &str) -> String {
    format!("card_{object_id}.md")
}

// =============================================================================
// Default Run Parameters
// =============================================================================

/// Default Google Maps zoom level
pub const DEFAULT_ZOOM: u8 = 18;

/// Maximum Google Maps zoom level
pub const MAX_ZOOM: u8 = 21;

/// Default number of card slots per page face
pub const DEFAULT_CARDS_PER_PAGE: usize = 4;

/// Default LaTeX page size option
pub const DEFAULT_PAGE_SIZE: &str = "a4paper";

/// Default bound on the external compiler wait, in seconds
pub const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 120;

/// Pixels per QR module in generated PNGs
pub const QR_MODULE_PIXELS: u32 = 10;

// =============================================================================
// Built-in Templates
// =============================================================================

/// Default card template: front-matter block plus Markdown body
pub const DEFAULT_CARD_TEMPLATE: &str = r#"---
title: {{title}}
contact: {{contact}}
description: {{description}}
funders: {{funders}}
feasible_3yr: {{feasible_3yr}}
opportunities: {{opportunities}}
challenges: {{challenges}}
qr_code_filename: {{qr_code_filename}}
---

# {{title}}

**Contact:** {{contact_person}} ({{organization}})

**Description:** {{description}}

**Potential funders:** {{potential_funders}}

**Feasible in next 3 years?** {{feasibility_next_3_years}}

**What should go smoothly:** {{opportunities}}

**Challenges:** {{challenges}}

![Map location]({{qr_code}})
"#;

/// Default layout template: LaTeX preamble, a front card block, a back QR
/// block, an empty-slot block, and a postamble. The compositor repeats the
/// `{{#card}}` block per filled front slot, the `{{#qr}}` block per filled
/// back slot, and the `{{#empty}}` block for padded slots on either face.
pub const DEFAULT_LAYOUT_TEMPLATE: &str = r#"\documentclass[{{page_size}}]{article}
\usepackage{graphicx}
\usepackage{geometry}
\usepackage{mdframed}
\geometry{margin=1cm}
\pagestyle{empty}
\setlength{\parindent}{0pt}

\begin{document}

{{#card}}\begin{minipage}[t][0.45\textheight]{0.48\textwidth}
\begin{mdframed}
\section*{ {{title}} }
\textbf{Contact:} {{contact}}

\textbf{Description:} {{description}}

\textbf{Potential funders:} {{funders}}

\textbf{Feasible in next 3 years?} {{feasible_3yr}}

\textbf{Opportunities:} {{opportunities}}

\textbf{Challenges:} {{challenges}}
\end{mdframed}
\end{minipage}
{{/card}}
{{#qr}}\begin{minipage}[t][0.45\textheight]{0.48\textwidth}
\begin{center}
\includegraphics[width=5cm]{ {{qr_code}} }
\end{center}
\end{minipage}
{{/qr}}
{{#empty}}\begin{minipage}[t][0.45\textheight]{0.48\textwidth}
\mbox{}
\end{minipage}
{{/empty}}
\end{document}
"#;
