//! Text extraction from uploaded files

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FileType;

/// Upper bound for pdf-extract before falling back to lopdf
const PDF_EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Replace characters PDF fonts commonly emit in place of plain text
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Converts raw upload bytes into plain text
pub struct FileParser;

impl FileParser {
    /// Extract text, branching on the filename's declared type.
    ///
    /// PDFs yield the text of every page in page order. Everything else
    /// must be valid UTF-8.
    pub fn extract(filename: &str, data: &[u8]) -> Result<String> {
        let file_type = FileType::from_filename(filename);
        tracing::debug!("Extracting {} from {} ({} bytes)", file_type.display_name(), filename, data.len());

        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Text => Self::parse_text(filename, data),
        }
    }

    /// Decode UTF-8 text
    fn parse_text(filename: &str, data: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(data).map_err(|_| Error::UndecodableText {
            filename: filename.to_string(),
        })?;

        Ok(text.strip_prefix('\u{FEFF}').unwrap_or(text).to_string())
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        // lopdf validates the structure; anything it cannot load is corrupt
        let document = lopdf::Document::load_mem(data)
            .map_err(|e| Error::corrupt_document(filename, e.to_string()))?;

        let text = match Self::extract_pdf_with_timeout(data) {
            Ok(text) => text,
            Err(reason) => {
                tracing::warn!("pdf-extract failed for '{}': {}, using lopdf", filename, reason);
                Self::extract_pages(filename, &document)?
            }
        };

        Ok(cleanup_pdf_text(&text))
    }

    /// Run pdf-extract on its own thread so a pathological font cannot hang ingestion
    fn extract_pdf_with_timeout(data: &[u8]) -> std::result::Result<String, String> {
        let data = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(pdf_extract::extract_text_from_mem(&data));
        });

        match rx.recv_timeout(PDF_EXTRACT_TIMEOUT) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(e.to_string()),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(format!("timed out after {:?}", PDF_EXTRACT_TIMEOUT))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err("extraction thread crashed".to_string()),
        }
    }

    /// Page-by-page extraction with lopdf
    fn extract_pages(filename: &str, document: &lopdf::Document) -> Result<String> {
        let mut text = String::new();

        // get_pages is keyed by page number, so iteration is in page order
        for page_number in document.get_pages().keys() {
            let page_text = document
                .extract_text(&[*page_number])
                .map_err(|e| Error::corrupt_document(filename, e.to_string()))?;
            text.push_str(&page_text);
            if !page_text.ends_with('\n') {
                text.push('\n');
            }
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one line of Helvetica text per page
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_plain_text() {
        let text = FileParser::extract("notes.txt", "Price: $50. Warranty: 1 year.".as_bytes()).unwrap();
        assert_eq!(text, "Price: $50. Warranty: 1 year.");
    }

    #[test]
    fn test_unknown_extension_is_text() {
        let text = FileParser::extract("readme", "Olá, mundo".as_bytes()).unwrap();
        assert_eq!(text, "Olá, mundo");
    }

    #[test]
    fn test_bom_is_stripped() {
        let text = FileParser::extract("bom.txt", "\u{FEFF}hello".as_bytes()).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(FileParser::extract("empty.txt", b"").unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8() {
        let result = FileParser::extract("binary.txt", &[0xff, 0xfe, 0x00, 0xc3]);
        assert!(matches!(result, Err(Error::UndecodableText { .. })));
    }

    #[test]
    fn test_corrupt_pdf() {
        let result = FileParser::extract("broken.pdf", b"definitely not a pdf");
        assert!(matches!(result, Err(Error::CorruptDocument { .. })));

        let result = FileParser::extract("EMPTY.PDF", b"");
        assert!(matches!(result, Err(Error::CorruptDocument { .. })));
    }

    #[test]
    fn test_pdf_pages_in_order() {
        let data = build_pdf(&["First page", "Second page"]);
        let text = FileParser::extract("manual.pdf", &data).unwrap();

        let first = text.find("First").expect("first page text");
        let second = text.find("Second").expect("second page text");
        assert!(first < second);
    }

    #[test]
    fn test_lopdf_fallback_extracts_every_page() {
        let data = build_pdf(&["Alpha", "Beta", "Gamma"]);
        let document = Document::load_mem(&data).unwrap();
        let text = FileParser::extract_pages("fallback.pdf", &document).unwrap();

        assert!(text.contains("Alpha"));
        assert!(text.find("Beta").unwrap() < text.find("Gamma").unwrap());
    }

    #[test]
    fn test_cleanup_pdf_text() {
        assert_eq!(cleanup_pdf_text("\u{FB01}le\u{00A0}size"), "file size");
    }
}
