use persona_digest_core::{Document, Section};

use crate::config::AnalysisConfig;
use crate::heading::{HeadingRules, heading_title, is_heading};
use crate::text_processing::{NormalizedLine, normalize_page, truncate_on_word_boundary};

/// Title for a leading section whose first line yields no usable text.
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// Paragraph separator inside a section body.
pub(crate) const PARAGRAPH_BREAK: &str = "\n\n";

/// Splits a document's pages into titled, page-anchored sections.
///
/// Never fails: text with no detectable structure becomes a single synthetic
/// section, and a document with no text yields no sections.
#[derive(Debug, Clone)]
pub struct SectionSegmenter {
    rules: HeadingRules,
    synthetic_title_chars: usize,
}

impl Default for SectionSegmenter {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl SectionSegmenter {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            rules: HeadingRules::from_config(config),
            synthetic_title_chars: config.synthetic_title_chars,
        }
    }

    pub fn segment(&self, document: &Document) -> Vec<Section> {
        let mut builder = SectionBuilder::new(&document.name);
        let mut previous: Option<String> = None;

        for page in &document.pages {
            if page.is_blank() {
                tracing::trace!(document = %document.name, page = page.number, "skipping blank page");
                continue;
            }

            for line in normalize_page(&page.text) {
                let text = match line {
                    NormalizedLine::Break => {
                        builder.paragraph_break();
                        previous = None;
                        continue;
                    }
                    NormalizedLine::Text(text) => text,
                };

                if self.rules.is_ignored(&text) {
                    continue;
                }

                if is_heading(&text, previous.as_deref(), &self.rules) {
                    builder.open(heading_title(&text), page.number);
                } else {
                    if !builder.has_open_section() {
                        builder.open(self.synthetic_title(&text), page.number);
                    }
                    builder.push_line(&text);
                }
                previous = Some(text);
            }
        }

        let sections = builder.finish();
        tracing::debug!(
            document = %document.name,
            pages = document.page_count(),
            sections = sections.len(),
            "segmented document"
        );
        sections
    }

    fn synthetic_title(&self, first_line: &str) -> String {
        let title = truncate_on_word_boundary(first_line, self.synthetic_title_chars);
        if title.trim().is_empty() {
            UNTITLED_SECTION.to_string()
        } else {
            title
        }
    }
}

/// Segment a document with the default configuration.
pub fn segment_document(document: &Document) -> Vec<Section> {
    SectionSegmenter::default().segment(document)
}

struct OpenSection {
    title: String,
    page_number: u32,
    body: String,
}

/// Accumulates sections in appearance order, assigning dense ordinals and
/// dropping headings that never received a body.
struct SectionBuilder<'a> {
    document: &'a str,
    current: Option<OpenSection>,
    sections: Vec<Section>,
}

impl<'a> SectionBuilder<'a> {
    fn new(document: &'a str) -> Self {
        Self {
            document,
            current: None,
            sections: Vec::new(),
        }
    }

    fn has_open_section(&self) -> bool {
        self.current.is_some()
    }

    fn open(&mut self, title: String, page_number: u32) {
        self.close();
        self.current = Some(OpenSection {
            title,
            page_number,
            body: String::new(),
        });
    }

    fn push_line(&mut self, line: &str) {
        let Some(open) = self.current.as_mut() else {
            return;
        };
        if !open.body.is_empty() && !open.body.ends_with(PARAGRAPH_BREAK) {
            open.body.push('\n');
        }
        open.body.push_str(line);
    }

    fn paragraph_break(&mut self) {
        if let Some(open) = self.current.as_mut()
            && !open.body.is_empty()
            && !open.body.ends_with(PARAGRAPH_BREAK)
        {
            open.body.push_str(PARAGRAPH_BREAK);
        }
    }

    fn close(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        let body = open.body.trim_end().to_string();
        if body.is_empty() {
            tracing::trace!(document = self.document, title = %open.title, "dropping heading without body");
            return;
        }
        self.sections.push(Section {
            document: self.document.to_string(),
            title: open.title,
            page_number: open.page_number,
            body,
            ordinal: self.sections.len(),
        });
    }

    fn finish(mut self) -> Vec<Section> {
        self.close();
        self.sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfigBuilder;
    use persona_digest_core::Page;

    fn doc(pages: &[&str]) -> Document {
        Document::new(
            "guide.pdf",
            None,
            pages
                .iter()
                .enumerate()
                .map(|(i, text)| Page::new(i as u32 + 1, *text))
                .collect(),
        )
    }

    #[test]
    fn test_headings_open_sections_in_order() {
        let document = doc(&[
            "1. Introduction\nThe south of France is a classic destination.\n\n2. Itinerary\nDay one starts in Nice.",
            "3. Budget\nExpect moderate prices outside of August.",
        ]);
        let sections = segment_document(&document);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["1. Introduction", "2. Itinerary", "3. Budget"]);
        assert_eq!(sections[0].page_number, 1);
        assert_eq!(sections[1].page_number, 1);
        assert_eq!(sections[2].page_number, 2);
        let ordinals: Vec<_> = sections.iter().map(|s| s.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn test_heading_without_body_is_dropped() {
        let document = doc(&["COASTAL ADVENTURES\nBEACH HOPPING\nSpend a day moving between coves."]);
        let sections = segment_document(&document);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "BEACH HOPPING");
        assert_eq!(sections[0].ordinal, 0);
    }

    #[test]
    fn test_leading_text_opens_synthetic_section() {
        let document = doc(&["this guide covers the best coastal towns to visit\nwith practical notes on transport."]);
        let sections = segment_document(&document);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].title,
            "this guide covers the best coastal towns to visit"
        );
        assert!(sections[0].body.starts_with("this guide covers"));
    }

    #[test]
    fn test_synthetic_title_truncated_on_word_boundary() {
        let config = AnalysisConfigBuilder::new()
            .synthetic_title_chars(20)
            .build()
            .unwrap();
        let segmenter = SectionSegmenter::new(&config);
        let sections = segmenter.segment(&doc(&["a long opening sentence about the markets of Provence."]));
        assert_eq!(sections[0].title, "a long opening");
    }

    #[test]
    fn test_body_continues_across_pages_and_keeps_heading_page() {
        let document = doc(&[
            "Packing Tips\nBring light layers for warm days",
            "and a jacket for the evenings by the sea.",
        ]);
        let sections = segment_document(&document);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].page_number, 1);
        assert!(sections[0].body.contains("jacket"));
    }

    #[test]
    fn test_blank_page_does_not_break_section() {
        let document = doc(&[
            "Cuisine\nTry the bouillabaisse in Marseille",
            "   \n\t\n",
            "and socca from the market stalls in Nice.",
        ]);
        let sections = segment_document(&document);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].body,
            "Try the bouillabaisse in Marseille\nand socca from the market stalls in Nice."
        );
    }

    #[test]
    fn test_paragraph_boundaries_kept_in_body() {
        let document = doc(&["Nightlife\nFirst paragraph line.\n\nSecond paragraph line."]);
        let sections = segment_document(&document);
        assert_eq!(
            sections[0].body,
            "First paragraph line.\n\nSecond paragraph line."
        );
    }

    #[test]
    fn test_ignored_lines_are_removed() {
        let document = doc(&["Wine Regions\nBordeaux and Burgundy are famous.\n12\nPage 3 of 9"]);
        let sections = segment_document(&document);
        assert_eq!(sections[0].body, "Bordeaux and Burgundy are famous.");
    }

    #[test]
    fn test_lowercase_numbered_heading_opens_section() {
        let document = doc(&[
            "1. Introduction\nThe south of France rewards slow travel.\n2.1 overview of local transport\nTrains connect the coastal towns.",
        ]);
        let sections = segment_document(&document);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["1. Introduction", "2.1 overview of local transport"]);
        assert_eq!(sections[1].body, "Trains connect the coastal towns.");
    }

    #[test]
    fn test_wrapped_line_continues_across_page_break() {
        let document = doc(&[
            "Lavender Route\nWe drove slowly through the lavender fields of",
            "Provence\nand stopped at every village on the way.",
        ]);
        let sections = segment_document(&document);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Lavender Route");
        assert_eq!(
            sections[0].body,
            "We drove slowly through the lavender fields of\nProvence\nand stopped at every village on the way."
        );
    }

    #[test]
    fn test_paragraph_break_resets_line_context() {
        let document = doc(&[
            "Lavender Route\nWe drove slowly through the lavender fields of\n\nMarseille\nThe old port is lively in the evening.",
        ]);
        let sections = segment_document(&document);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Lavender Route", "Marseille"]);
        assert_eq!(sections[1].body, "The old port is lively in the evening.");
    }

    #[test]
    fn test_ignored_line_keeps_line_context() {
        let document = doc(&[
            "Lavender Route\nWe drove slowly through the lavender fields of\n12\nProvence\nand stopped at every village.",
        ]);
        let sections = segment_document(&document);
        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0].body,
            "We drove slowly through the lavender fields of\nProvence\nand stopped at every village."
        );
    }

    #[test]
    fn test_degenerate_input() {
        assert!(segment_document(&doc(&[])).is_empty());
        assert!(segment_document(&doc(&["", "   "])).is_empty());
        assert!(segment_document(&doc(&["ONLY A HEADING"])).is_empty());
    }

    #[test]
    fn test_bodies_never_empty() {
        let document = doc(&[
            "Introduction\n\nConclusion\nDone.\nREFERENCES\n\n",
            "Appendix\n   \n",
        ]);
        let sections = segment_document(&document);
        assert!(sections.iter().all(|s| !s.body.trim().is_empty()));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Conclusion");
    }
}
