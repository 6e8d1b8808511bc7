//! File export for crawl results
//!
//! Pure functions over [`CrawledPage`] values: a delimited-text report and a
//! JSON document. Neither touches the crawl engine or storage.

use crate::storage::CrawledPage;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// How many characters of extracted text the text export shows per page
const TEXT_PREVIEW_CHARS: usize = 500;

/// Writes a delimited-text export of the given pages
pub fn write_text_export(pages: &[CrawledPage], path: &Path) -> crate::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(format_text_export(pages).as_bytes())?;
    Ok(())
}

/// Formats pages as a delimited-text report
pub fn format_text_export(pages: &[CrawledPage]) -> String {
    let mut out = String::new();

    for page in pages {
        out.push_str(&format!("URL: {}\n", page.url));
        out.push_str(&format!("Title: {}\n", page.title));
        out.push_str(&format!("Description: {}\n", page.description));

        let preview: String = page.text.chars().take(TEXT_PREVIEW_CHARS).collect();
        out.push_str(&format!("Text: {}...\n", preview));

        out.push_str(&"-".repeat(80));
        out.push_str("\n\n");
    }

    out
}

/// Writes a JSON export of the given pages
pub fn write_json_export(pages: &[CrawledPage], path: &Path) -> crate::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, pages)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> CrawledPage {
        CrawledPage {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
            description: "An example page".to_string(),
            text: "body text ".repeat(100),
            html: "<html></html>".to_string(),
            status_code: 200,
            content_length: 1000,
        }
    }

    #[test]
    fn test_text_export_layout() {
        let output = format_text_export(&[sample_page()]);

        assert!(output.starts_with("URL: https://example.com/\n"));
        assert!(output.contains("Title: Example\n"));
        assert!(output.contains("Description: An example page\n"));
        assert!(output.contains(&"-".repeat(80)));
    }

    #[test]
    fn test_text_export_truncates_long_text() {
        let output = format_text_export(&[sample_page()]);

        let text_line = output
            .lines()
            .find(|line| line.starts_with("Text: "))
            .unwrap();
        // "Text: " + 500 chars + "..."
        assert_eq!(text_line.chars().count(), 6 + TEXT_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_text_export_empty_input() {
        assert_eq!(format_text_export(&[]), "");
    }

    #[test]
    fn test_json_export_round_trips() {
        let json = serde_json::to_string(&[sample_page()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["url"], "https://example.com/");
        assert_eq!(value[0]["status_code"], 200);
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let pages = vec![sample_page()];

        let text_path = dir.path().join("out.txt");
        let json_path = dir.path().join("out.json");

        write_text_export(&pages, &text_path).unwrap();
        write_json_export(&pages, &json_path).unwrap();

        assert!(std::fs::read_to_string(&text_path)
            .unwrap()
            .contains("https://example.com/"));
        assert!(std::fs::read_to_string(&json_path)
            .unwrap()
            .contains("https://example.com/"));
    }
}
