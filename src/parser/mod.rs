pub mod exercises;
pub mod marked;
pub mod paragraph;
pub mod styled;

use std::path::Path;

use anyhow::Result;

use crate::schema::ParsedDocument;
use paragraph::Paragraph;

/// Which extraction convention to apply. The two conventions are independent
/// strategies over the same paragraph stream and are never mixed within one
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// Sniff for marker lines, fall back to the style-driven convention
    #[default]
    Auto,
    /// Heading-style driven (Heading 1-4 plus all-caps fallback)
    Styled,
    /// Explicit markdown-like markers (`# Curso:`, `## Assunto N:`, ...)
    Marked,
}

/// Parse an already-materialized paragraph sequence. Infallible: every
/// structural anomaly is a warning inside the returned record.
pub fn parse_paragraphs(paragraphs: &[Paragraph], convention: Convention) -> ParsedDocument {
    // Blank paragraphs carry no structure in either convention
    let paragraphs: Vec<Paragraph> = paragraphs
        .iter()
        .filter(|p| !p.text.trim().is_empty())
        .cloned()
        .collect();

    let convention = match convention {
        Convention::Auto => {
            if marked::looks_marked(&paragraphs) {
                Convention::Marked
            } else {
                Convention::Styled
            }
        }
        other => other,
    };

    match convention {
        Convention::Styled | Convention::Auto => {
            let mut doc = styled::parse_styled(&paragraphs);
            if doc.sections.is_empty() {
                doc.warnings
                    .push("No sections were found in the document.".to_string());
            }
            ParsedDocument::Styled(doc)
        }
        Convention::Marked => {
            let mut doc = marked::parse_marked(&paragraphs);
            if doc.subjects.is_empty() && doc.contest_questions.is_empty() {
                doc.warnings
                    .push("No subjects or contest questions were found in the document.".to_string());
            }
            ParsedDocument::Marked(doc)
        }
    }
}

/// Parse a DOCX container from disk. The only fatal condition is an
/// unreadable container; the caller decides whether that is a hard failure
/// (`ParsedDocument::read_failure` builds the warning-only record).
pub fn parse_file(path: &Path, convention: Convention) -> Result<ParsedDocument> {
    let paragraphs = crate::docx::read_paragraphs(path)?;
    Ok(parse_paragraphs(&paragraphs, convention))
}

/// Parse a DOCX container already held in memory (the service endpoint's
/// upload path).
pub fn parse_bytes(bytes: &[u8], convention: Convention) -> Result<ParsedDocument> {
    let paragraphs = crate::docx::read_paragraphs_from_bytes(bytes)?;
    Ok(parse_paragraphs(&paragraphs, convention))
}

// ── Tests ──
