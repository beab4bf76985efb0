//! Text extraction from uploaded documents.

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};

use crate::documents::DocumentError;

/// Input format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Pdf,
    /// Anything else is decoded as UTF-8 text.
    Text,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".docx") {
            DocumentKind::Docx
        } else if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else {
            DocumentKind::Text
        }
    }
}

/// Extracts plain text. DOCX paragraphs are joined with `\n`; invalid UTF-8 in
/// text files is replaced rather than rejected.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    match kind {
        DocumentKind::Docx => docx_text(bytes),
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Read(e.to_string()))
        }
        DocumentKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Strips an optional `file://` scheme from a client-supplied local path.
pub fn local_path(raw: &str) -> &str {
    raw.strip_prefix("file://").unwrap_or(raw)
}

fn docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| DocumentError::Read(e.to_string()))?;
    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
            _ => None,
        })
        .collect();
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for part in &run.children {
                match part {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::export::{export, ExportFormat};

    #[test]
    fn test_kind_from_name() {
        assert_eq!(DocumentKind::from_name("CV.DOCX"), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_name("resume.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_name("resume.txt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_name(""), DocumentKind::Text);
    }

    #[test]
    fn test_text_decoding_is_lossy() {
        let text = extract_text(DocumentKind::Text, b"Rust \xff engineer").unwrap();
        assert!(text.starts_with("Rust "));
        assert!(text.ends_with(" engineer"));
    }

    #[test]
    fn test_exported_docx_reads_back_paragraphs() {
        let file = export("Jane Doe\n\nRust engineer", None, ExportFormat::Docx).unwrap();
        let text = extract_text(DocumentKind::Docx, &file.bytes).unwrap();
        assert_eq!(text, "Jane Doe\n\nRust engineer");
    }

    #[test]
    fn test_garbage_docx_is_read_error() {
        let err = extract_text(DocumentKind::Docx, b"definitely not a zip").unwrap_err();
        assert!(matches!(err, DocumentError::Read(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_local_path_strips_scheme() {
        assert_eq!(local_path("file:///tmp/cv.pdf"), "/tmp/cv.pdf");
        assert_eq!(local_path("/tmp/cv.pdf"), "/tmp/cv.pdf");
    }
}
