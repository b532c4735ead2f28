use once_cell::sync::Lazy;
use regex::Regex;

use persona_digest_core::{RefinedPassage, ScoredSection};

use crate::config::{AnalysisConfig, Granularity};
use crate::segment::PARAGRAPH_BREAK;
use crate::text_processing::{collapse_whitespace, truncate_with_ellipsis};
use crate::tfidf::{SparseVector, TfIdfModel};

/// Reduces each ranked section to its most query-relevant passage(s).
#[derive(Debug, Clone)]
pub struct SubsectionRefiner {
    granularity: Granularity,
    min_passage_chars: usize,
    max_passages: usize,
    max_refined_chars: usize,
    fallback_chars: usize,
}

impl Default for SubsectionRefiner {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl SubsectionRefiner {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            granularity: config.granularity,
            min_passage_chars: config.min_passage_chars,
            max_passages: config.max_passages,
            max_refined_chars: config.max_refined_chars,
            fallback_chars: config.fallback_chars,
        }
    }

    /// One refined passage per ranked section, in rank order.
    pub fn refine_all(
        &self,
        sections: &[ScoredSection],
        query_vector: &SparseVector,
        model: &TfIdfModel,
    ) -> Vec<RefinedPassage> {
        sections
            .iter()
            .map(|scored| self.refine(scored, query_vector, model))
            .collect()
    }

    /// Refine a single section. Always yields a passage.
    pub fn refine(
        &self,
        scored: &ScoredSection,
        query_vector: &SparseVector,
        model: &TfIdfModel,
    ) -> RefinedPassage {
        let section = &scored.section;
        let candidates: Vec<String> = split_passages(&section.body, self.granularity)
            .into_iter()
            .filter(|p| p.chars().count() >= self.min_passage_chars)
            .collect();

        let text = if candidates.is_empty() {
            tracing::debug!(
                document = %section.document,
                title = %section.title,
                "no candidate passages, using body prefix"
            );
            truncate_with_ellipsis(&collapse_whitespace(&section.body), self.fallback_chars)
        } else {
            let scores: Vec<f64> = candidates
                .iter()
                .map(|p| model.vectorize_text(p).cosine(query_vector))
                .collect();
            self.select(&candidates, &scores)
        };

        RefinedPassage {
            document: section.document.clone(),
            page_number: section.page_number,
            text,
        }
    }

    /// Keep the best-scoring passages within the character budget, joined in
    /// their original order. The best passage is always kept.
    fn select(&self, candidates: &[String], scores: &[f64]) -> String {
        let mut by_score: Vec<usize> = (0..candidates.len()).collect();
        by_score.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        by_score.truncate(self.max_passages);

        let separator = match self.granularity {
            Granularity::Paragraph => PARAGRAPH_BREAK,
            Granularity::Sentence => " ",
        };

        let mut chosen: Vec<(usize, String)> = Vec::new();
        let mut used = 0;
        for index in by_score {
            let passage = &candidates[index];
            let len = passage.chars().count();
            if chosen.is_empty() {
                let best = truncate_with_ellipsis(passage, self.max_refined_chars);
                used = best.chars().count();
                chosen.push((index, best));
                continue;
            }
            let needed = separator.chars().count() + len;
            if used + needed <= self.max_refined_chars {
                used += needed;
                chosen.push((index, passage.clone()));
            }
        }

        chosen.sort_by_key(|(index, _)| *index);
        chosen
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Split a section body into whitespace-collapsed passages.
///
/// Paragraphs come from the blank-line boundaries kept by segmentation; a
/// body without them is one paragraph.
pub fn split_passages(body: &str, granularity: Granularity) -> Vec<String> {
    match granularity {
        Granularity::Paragraph => body
            .split(PARAGRAPH_BREAK)
            .map(collapse_whitespace)
            .filter(|p| !p.is_empty())
            .collect(),
        Granularity::Sentence => split_sentences(&collapse_whitespace(body)),
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    static SENTENCE_END_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).unwrap());

    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}
