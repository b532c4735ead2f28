//! Relevance ranking of sections against the run's query.
//!
//! Each section's score is the TF-IDF cosine against the query plus two
//! additive adjustments: a fixed bonus when the title contains a boost term,
//! and a small bonus that shrinks with page number. Sections with too little
//! body text are dropped before scoring.

use std::cmp::Ordering;

use persona_digest_core::{ScoredSection, Section};

use crate::config::AnalysisConfig;
use crate::query::Query;
use crate::tfidf::{SparseVector, TfIdfModel};

/// Components of one section's adjusted score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    /// Cosine similarity to the query, in `[0, 1]`.
    pub similarity: f64,
    pub title_boost: f64,
    pub position_bonus: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.similarity + self.title_boost + self.position_bonus
    }
}

/// Scores and orders sections across every document of a run.
#[derive(Debug, Clone)]
pub struct RelevanceRanker {
    top_n: usize,
    min_body_chars: usize,
    title_boost: f64,
    position_bonus: f64,
}

impl Default for RelevanceRanker {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl RelevanceRanker {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            top_n: config.top_n,
            min_body_chars: config.min_body_chars,
            title_boost: config.title_boost,
            position_bonus: config.position_bonus,
        }
    }

    /// Whether a section carries enough body text to be ranked at all.
    pub fn qualifies(&self, section: &Section) -> bool {
        section.body.chars().count() >= self.min_body_chars
    }

    /// Score one section. Sections that do not qualify score zero.
    pub fn score(
        &self,
        section: &Section,
        query: &Query,
        query_vector: &SparseVector,
        model: &TfIdfModel,
    ) -> ScoreBreakdown {
        if !self.qualifies(section) {
            return ScoreBreakdown::default();
        }

        let similarity = model.vectorize_text(&section.body).cosine(query_vector);
        let title_boost = match query.boost_match(&section.title) {
            Some(_) => self.title_boost,
            None => 0.0,
        };
        let position_bonus = self.position_bonus / f64::from(section.page_number.max(1));

        ScoreBreakdown {
            similarity,
            title_boost,
            position_bonus,
        }
    }

    /// Rank sections globally and keep the top `top_n` with dense ranks from 1.
    ///
    /// Order: higher score, lower page number, document name, then position
    /// within the document. An empty result is a normal outcome.
    pub fn rank(
        &self,
        sections: &[Section],
        query: &Query,
        model: &TfIdfModel,
    ) -> Vec<ScoredSection> {
        let query_vector = model.query_vector(query);

        let mut scored: Vec<(&Section, ScoreBreakdown)> = sections
            .iter()
            .filter(|section| {
                let keep = self.qualifies(section);
                if !keep {
                    tracing::trace!(
                        document = %section.document,
                        title = %section.title,
                        "section body below minimum length"
                    );
                }
                keep
            })
            .map(|section| (section, self.score(section, query, &query_vector, model)))
            .collect();

        scored.sort_by(|(a, sa), (b, sb)| compare_ranked(a, sa.total(), b, sb.total()));
        scored.truncate(self.top_n);

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (section, breakdown))| {
                tracing::debug!(
                    rank = i + 1,
                    document = %section.document,
                    title = %section.title,
                    page = section.page_number,
                    score = breakdown.total(),
                    similarity = breakdown.similarity,
                    title_boost = breakdown.title_boost,
                    position_bonus = breakdown.position_bonus,
                    "ranked section"
                );
                ScoredSection {
                    section: section.clone(),
                    score: breakdown.total(),
                    importance_rank: i + 1,
                }
            })
            .collect()
    }
}

fn compare_ranked(a: &Section, score_a: f64, b: &Section, score_b: f64) -> Ordering {
    score_b
        .total_cmp(&score_a)
        .then_with(|| a.page_number.cmp(&b.page_number))
        .then_with(|| a.document.cmp(&b.document))
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}
