use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::parser::paragraph::{Paragraph, StyleTag};

/// Read the paragraph sequence out of a DOCX container on disk.
pub fn read_paragraphs(path: &Path) -> Result<Vec<Paragraph>> {
    let file = File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_container(file)
}

/// Read the paragraph sequence out of a DOCX container held in memory.
pub fn read_paragraphs_from_bytes(bytes: &[u8]) -> Result<Vec<Paragraph>> {
    read_container(Cursor::new(bytes))
}

fn read_container<R: Read + Seek>(reader: R) -> Result<Vec<Paragraph>> {
    let mut archive = zip::ZipArchive::new(reader).context("Not a valid DOCX container")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("Container has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("Failed to read word/document.xml")?;

    let paragraphs = parse_document_xml(&xml)?;
    debug!("Read {} paragraphs from container", paragraphs.len());
    Ok(paragraphs)
}

/// Scan the main document part for `w:p` elements, collecting each
/// paragraph's run text and paragraph style. Tabs, carriage returns and
/// text-wrapping breaks become `\t` / `\n` inside the paragraph text.
fn parse_document_xml(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut paragraphs = Vec::new();

    let mut in_paragraph = false;
    let mut in_text = false;
    let mut text = String::new();
    let mut style = StyleTag::Unstyled;

    loop {
        match reader.read_event().context("Malformed document XML")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    text.clear();
                    style = StyleTag::Unstyled;
                }
                b"w:t" if in_paragraph => in_text = true,
                name => {
                    if in_paragraph {
                        handle_inline(name, &e, &mut text, &mut style)?;
                    }
                }
            },
            Event::Empty(e) => {
                if in_paragraph {
                    handle_inline(e.name().as_ref(), &e, &mut text, &mut style)?;
                }
            }
            Event::Text(e) if in_text => {
                text.push_str(&e.unescape().context("Malformed document XML")?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    paragraphs.push(Paragraph::new(text.clone(), style));
                    in_paragraph = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn handle_inline(
    name: &[u8],
    element: &BytesStart<'_>,
    text: &mut String,
    style: &mut StyleTag,
) -> Result<()> {
    match name {
        b"w:pStyle" => {
            if let Some(attr) = element.try_get_attribute("w:val")? {
                *style = StyleTag::from_style_id(&attr.unescape_value()?);
            }
        }
        b"w:tab" | b"w:ptab" => text.push('\t'),
        b"w:cr" => text.push('\n'),
        b"w:br" => {
            // Page/column breaks carry a w:type attribute; only text-wrapping
            // breaks contribute a newline.
            let break_type = element
                .try_get_attribute("w:type")?
                .map(|a| a.unescape_value().map(|v| v.to_string()))
                .transpose()?;
            if break_type.as_deref().unwrap_or("textWrapping") == "textWrapping" {
                text.push('\n');
            }
        }
        _ => {}
    }
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with(paragraph_xml: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{paragraph_xml}</w:body>
</w:document>"#
        );
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn reads_text_and_styles() {
        let bytes = docx_with(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>RETA FINAL</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Questões de Exercícios</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:pStyle w:val="Normal"/></w:pPr><w:r><w:t>A) </w:t></w:r><w:r><w:t>Narrativo</w:t></w:r></w:p>"#,
        ));
        let paragraphs = read_paragraphs_from_bytes(&bytes).unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0], Paragraph::new("RETA FINAL", StyleTag::Heading1));
        assert_eq!(paragraphs[1], Paragraph::new("Questões de Exercícios", StyleTag::Unstyled));
        // Run text concatenates within one paragraph
        assert_eq!(paragraphs[2], Paragraph::new("A) Narrativo", StyleTag::Normal));
    }

    #[test]
    fn unknown_styles_map_to_unstyled() {
        let bytes = docx_with(
            r#"<w:p><w:pPr><w:pStyle w:val="Subtitle"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
        );
        let paragraphs = read_paragraphs_from_bytes(&bytes).unwrap();
        assert_eq!(paragraphs[0].style, StyleTag::Unstyled);
    }

    #[test]
    fn tabs_and_breaks_become_whitespace() {
        let bytes = docx_with(
            r#"<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:br w:type="page"/><w:t>d</w:t></w:r></w:p>"#,
        );
        let paragraphs = read_paragraphs_from_bytes(&bytes).unwrap();
        assert_eq!(paragraphs[0].text, "a\tb\ncd");
    }

    #[test]
    fn entities_are_unescaped() {
        let bytes = docx_with(r#"<w:p><w:r><w:t>Tom &amp; Jerry</w:t></w:r></w:p>"#);
        let paragraphs = read_paragraphs_from_bytes(&bytes).unwrap();
        assert_eq!(paragraphs[0].text, "Tom & Jerry");
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = read_paragraphs_from_bytes(b"not a zip at all").unwrap_err();
        assert!(err.to_string().contains("Not a valid DOCX container"));
    }

    #[test]
    fn zip_without_document_part_is_rejected() {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("other.txt", options).unwrap();
        writer.write_all(b"hello").unwrap();
        writer.finish().unwrap();
        let err = read_paragraphs_from_bytes(&cursor.into_inner()).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_paragraphs(Path::new("/nonexistent/sample.docx")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/sample.docx"));
    }
}
