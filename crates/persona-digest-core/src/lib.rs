use thiserror::Error;

pub mod backend;
pub mod config_file;

pub use backend::{BackendError, PageExtractor};

/// A single page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number, matching the source PDF.
    pub number: u32,
    pub text: String,
}

impl Page {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Whether the page carries no extractable text at all.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A document as produced by a [`PageExtractor`]. Never mutated after extraction.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier used throughout the output, normally the PDF filename.
    pub name: String,
    pub title: Option<String>,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(name: impl Into<String>, title: Option<String>, pages: Vec<Page>) -> Self {
        Self {
            name: name.into(),
            title,
            pages,
        }
    }

    /// A zero-page document, used when extraction failed.
    pub fn empty(name: impl Into<String>, title: Option<String>) -> Self {
        Self::new(name, title, Vec::new())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A titled, page-anchored span of document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub document: String,
    pub title: String,
    /// Page on which the section's heading appears.
    pub page_number: u32,
    /// Never empty.
    pub body: String,
    /// 0-based position of the section within its document.
    pub ordinal: usize,
}

/// A section with its relevance score and dense 1-based rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSection {
    pub section: Section,
    pub score: f64,
    pub importance_rank: usize,
}

/// A short excerpt drawn from one ranked section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinedPassage {
    pub document: String,
    pub page_number: u32,
    pub text: String,
}

/// Result of one digest run.
///
/// `sections` and `passages` are parallel: `passages[i]` refines `sections[i]`.
#[derive(Debug, Clone, Default)]
pub struct Digest {
    pub sections: Vec<ScoredSection>,
    pub passages: Vec<RefinedPassage>,
    /// Total number of sections found across all documents, before ranking.
    pub total_sections: usize,
    /// Documents that could not be extracted and were skipped.
    pub failed_documents: Vec<String>,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// A per-document extraction failure. The run continues without the document.
#[derive(Error, Debug)]
#[error("failed to extract {document}: {source}")]
pub struct ExtractionFailure {
    pub document: String,
    pub source: BackendError,
}

impl ExtractionFailure {
    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_page_detection() {
        assert!(Page::new(1, "  \n\t ").is_blank());
        assert!(Page::new(1, "").is_blank());
        assert!(!Page::new(2, "text").is_blank());
    }

    #[test]
    fn empty_document_has_no_pages() {
        let doc = Document::empty("a.pdf", None);
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.name, "a.pdf");
    }

    #[test]
    fn extraction_failure_message_names_document() {
        let failure = ExtractionFailure {
            document: "broken.pdf".to_string(),
            source: BackendError::OpenError("bad header".to_string()),
        };
        let msg = failure.to_string();
        assert!(msg.contains("broken.pdf"));
        assert!(msg.contains("bad header"));
        assert_eq!(failure.kind(), "open_failed");
    }
}
