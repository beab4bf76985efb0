//! Plain text to downloadable DOCX/PDF.

use std::io::Cursor;
use std::str::FromStr;

use docx_rs::{Docx, Paragraph, Run};
use printpdf::{BuiltinFont, Mm, PdfDocument};

use crate::documents::DocumentError;

// US Letter in points, 1" margins.
const PAGE_WIDTH_PT: f32 = 612.0;
const PAGE_HEIGHT_PT: f32 = 792.0;
const MARGIN_PT: f32 = 72.0;
const LEADING_PT: f32 = 14.0;
const FONT_SIZE_PT: f32 = 12.0;
/// Long lines are hard-wrapped at this many characters.
const PDF_CHUNK_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Docx,
    Pdf,
}

impl FromStr for ExportFormat {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docx" => Ok(ExportFormat::Docx),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(DocumentError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

#[derive(Debug)]
pub struct ExportedFile {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders `text` (one paragraph per line) as `resume_{slug}.{ext}`.
/// A missing or empty `label` becomes "draft".
pub fn export(
    text: &str,
    label: Option<&str>,
    format: ExportFormat,
) -> Result<ExportedFile, DocumentError> {
    let bytes = match format {
        ExportFormat::Docx => render_docx(text)?,
        ExportFormat::Pdf => render_pdf(text)?,
    };
    Ok(ExportedFile {
        file_name: format!(
            "resume_{}.{}",
            slugify(label.filter(|l| !l.is_empty()).unwrap_or("draft"), "resume"),
            format.extension()
        ),
        media_type: format.media_type(),
        bytes,
    })
}

/// Lowercases, collapses every run of non-`[a-z0-9]` to `_` and trims `_`.
/// Returns `default` if nothing is left.
pub fn slugify(name: &str, default: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut gap = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if gap && !slug.is_empty() {
                slug.push('_');
            }
            gap = false;
            slug.push(c);
        } else {
            gap = true;
        }
    }
    if slug.is_empty() {
        default.to_string()
    } else {
        slug
    }
}

fn render_docx(text: &str) -> Result<Vec<u8>, DocumentError> {
    let docx = text.split('\n').fold(Docx::new(), |doc, line| {
        doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
    });

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| DocumentError::Render(e.to_string()))?;
    Ok(buf.into_inner())
}

fn render_pdf(text: &str) -> Result<Vec<u8>, DocumentError> {
    let (doc, page, layer) =
        PdfDocument::new("Resume", mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DocumentError::Render(e.to_string()))?;

    let top = PAGE_HEIGHT_PT - MARGIN_PT;
    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = top;

    for line in text.split('\n') {
        for chunk in wrap_line(line, PDF_CHUNK_CHARS) {
            if y < MARGIN_PT {
                let (page, layer) = doc.add_page(mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Layer 1");
                current = doc.get_page(page).get_layer(layer);
                y = top;
            }
            if !chunk.is_empty() {
                current.use_text(chunk, FONT_SIZE_PT, mm(MARGIN_PT), mm(y), &font);
            }
            y -= LEADING_PT;
        }
    }

    drop(current);
    doc.save_to_bytes()
        .map_err(|e| DocumentError::Render(e.to_string()))
}

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Splits `line` into pieces of at most `width` characters. A blank line
/// yields one empty piece so it still advances the cursor.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.trim_end_matches('\r').chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}
