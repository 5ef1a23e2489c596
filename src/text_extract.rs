// src/text_extract.rs

use crate::error::{NoticeError, Result};
use lopdf::Document;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Below this many non-whitespace characters the notice is almost
/// certainly a scan, and the field parser will have nothing to work with.
const MIN_TEXT_CHARS: usize = 30;

/// Read a notice PDF from disk and return its text, pages joined by `\n`.
pub fn extract_text(path: &Path) -> Result<String> {
    let pdf_bytes = fs::read(path).map_err(|e| NoticeError::DocumentRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    extract_text_from_pdf(&pdf_bytes).map_err(|reason| NoticeError::DocumentRead {
        path: path.to_path_buf(),
        reason,
    })
}

/// Takes raw PDF bytes and returns the page texts in page order.
///
/// Pages without a text layer contribute an empty string. There is no OCR
/// fallback: image-only documents only produce a warning.
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> std::result::Result<String, String> {
    // --- Phase 1: structural check with lopdf ---
    let doc = Document::load_mem(pdf_bytes).map_err(|e| format!("Failed to parse PDF: {e}"))?;

    if looks_like_scanned(&doc) {
        warn!("PDF structural check: likely scanned / image-only, OCR is not supported");
    }

    // --- Phase 2: per-page text extraction ---
    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| format!("Failed to extract text: {e}"))?;
    let page_count = pages.len();
    let text = join_pages(pages);

    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        warn!(chars = meaningful, "Extracted text too short, notice may be scanned");
    } else {
        info!(pages = page_count, chars = meaningful, "Text extracted successfully");
    }

    Ok(text)
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .map(|page| page.replace("\r\n", "\n").replace('\r', "\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Heuristic: inspect the PDF object tree for signs that every page
/// is just a single image with no text operators.
///
/// A page with XObject images but **no** Font resources is almost
/// certainly a scanned page.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false;
    }

    let mut image_only_pages = 0;

    for object_id in pages.values() {
        let Ok(page_obj) = doc.get_object(*object_id) else {
            continue;
        };
        let Ok(page_dict) = page_obj.as_dict() else {
            continue;
        };

        let resources = page_dict
            .get(b"Resources")
            .ok()
            .and_then(|r| doc.dereference(r).ok())
            .and_then(|(_, resolved)| resolved.as_dict().ok());

        let has_entries = |key: &[u8]| {
            resources
                .and_then(|res| res.get(key).ok())
                .and_then(|obj| doc.dereference(obj).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok())
                .is_some_and(|dict| !dict.is_empty())
        };

        if has_entries(b"XObject") && !has_entries(b"Font") {
            image_only_pages += 1;
        }
    }

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    // ≥80% image-only pages means the whole PDF is a scan
    ratio >= 0.8
}
