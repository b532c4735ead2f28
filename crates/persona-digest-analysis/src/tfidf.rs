//! Run-scoped TF-IDF vector space.
//!
//! The model is fit on one run's corpus (every section body plus the query)
//! and handed explicitly to the ranker and the refiner. Nothing is cached
//! between runs.

use std::collections::{BTreeMap, HashMap};

use crate::query::Query;
use crate::text_processing::tokenize;

/// Raw (or weighted) term frequencies of one text.
pub type TermCounts = BTreeMap<String, f64>;

/// Expand a filtered token stream into terms: unigrams, then adjacent bigrams.
pub(crate) fn ngrams(tokens: &[String], bigrams: bool) -> Vec<String> {
    let mut terms = tokens.to_vec();
    if bigrams {
        terms.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    }
    terms
}

/// Count the terms of a text.
pub fn term_counts(text: &str, bigrams: bool) -> TermCounts {
    let mut counts = TermCounts::new();
    for term in ngrams(&tokenize(text), bigrams) {
        *counts.entry(term).or_insert(0.0) += 1.0;
    }
    counts
}

/// An L2-normalized sparse vector keyed by vocabulary index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<usize, f64>,
}

impl SparseVector {
    fn normalized(weights: BTreeMap<usize, f64>) -> Self {
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return Self::default();
        }
        Self {
            weights: weights.into_iter().map(|(i, w)| (i, w / norm)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Cosine similarity in `[0, 1]`; `0.0` when either vector is all-zero.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .weights
            .iter()
            .filter_map(|(i, w)| large.weights.get(i).map(|v| w * v))
            .sum();
        dot.clamp(0.0, 1.0)
    }
}

/// Vocabulary and smoothed IDF weights fit on one run's corpus.
#[derive(Debug, Clone)]
pub struct TfIdfModel {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    bigrams: bool,
}

impl TfIdfModel {
    /// Fit on a corpus of term counts.
    ///
    /// IDF is `ln((1 + n) / (1 + df)) + 1`. When the corpus has more than
    /// `max_features` distinct terms, the most frequent are kept (ties by
    /// term order).
    pub fn fit(corpus: &[TermCounts], max_features: usize, bigrams: bool) -> Self {
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        let mut total_frequency: HashMap<&str, f64> = HashMap::new();
        for counts in corpus {
            for (term, count) in counts {
                if *count <= 0.0 {
                    continue;
                }
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
                *total_frequency.entry(term.as_str()).or_insert(0.0) += count;
            }
        }

        let mut kept: Vec<&str> = total_frequency.keys().copied().collect();
        if kept.len() > max_features {
            kept.sort_by(|a, b| {
                total_frequency[b]
                    .total_cmp(&total_frequency[a])
                    .then_with(|| a.cmp(b))
            });
            kept.truncate(max_features);
        }
        kept.sort_unstable();

        let n = corpus.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (index, term) in kept.into_iter().enumerate() {
            let df = document_frequency[term] as f64;
            idf.push(((1.0 + n) / (1.0 + df)).ln() + 1.0);
            vocabulary.insert(term.to_string(), index);
        }

        tracing::debug!(
            documents = corpus.len(),
            vocabulary = vocabulary.len(),
            "fit tf-idf model"
        );

        Self {
            vocabulary,
            idf,
            bigrams,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// IDF weight of a term, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&i| self.idf[i])
    }

    pub fn vectorize(&self, counts: &TermCounts) -> SparseVector {
        let weights = counts
            .iter()
            .filter_map(|(term, count)| {
                self.vocabulary
                    .get(term)
                    .map(|&i| (i, count * self.idf[i]))
            })
            .collect();
        SparseVector::normalized(weights)
    }

    /// Tokenize and vectorize a text with the model's n-gram setting.
    pub fn vectorize_text(&self, text: &str) -> SparseVector {
        self.vectorize(&term_counts(text, self.bigrams))
    }

    pub fn query_vector(&self, query: &Query) -> SparseVector {
        self.vectorize(query.terms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(text: &str) -> TermCounts {
        term_counts(text, false)
    }

    #[test]
    fn test_ngrams_adds_adjacent_pairs() {
        let tokens: Vec<String> = ["college", "friends", "trip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(ngrams(&tokens, false).len(), 3);
        let terms = ngrams(&tokens, true);
        assert!(terms.contains(&"college friends".to_string()));
        assert!(terms.contains(&"friends trip".to_string()));
        assert_eq!(terms.len(), 5);
    }

    #[test]
    fn test_smoothed_idf() {
        let corpus = vec![counts("beach beach town"), counts("town museum")];
        let model = TfIdfModel::fit(&corpus, 100, false);
        // "town" appears in both documents: ln(3/3) + 1
        assert!((model.idf("town").unwrap() - 1.0).abs() < 1e-12);
        // "beach" appears in one: ln(3/2) + 1
        assert!((model.idf("beach").unwrap() - (1.5f64.ln() + 1.0)).abs() < 1e-12);
        assert!(model.idf("castle").is_none());
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let corpus = vec![counts("beach beach beach town town museum"), counts("zoo")];
        let model = TfIdfModel::fit(&corpus, 2, false);
        assert_eq!(model.vocabulary_len(), 2);
        assert!(model.idf("beach").is_some());
        assert!(model.idf("town").is_some());
        assert!(model.idf("museum").is_none());
    }

    #[test]
    fn test_cosine_bounds_and_identity() {
        let corpus = vec![
            counts("coastal towns and beaches"),
            counts("museums and galleries"),
        ];
        let model = TfIdfModel::fit(&corpus, 100, false);
        let a = model.vectorize_text("coastal towns and beaches");
        let b = model.vectorize_text("museums and galleries");
        assert!((a.cosine(&a) - 1.0).abs() < 1e-9);
        assert_eq!(a.cosine(&b), 0.0);
        let c = model.vectorize_text("coastal museums");
        let score = a.cosine(&c);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let corpus = vec![counts("beaches")];
        let model = TfIdfModel::fit(&corpus, 100, false);
        let unknown = model.vectorize_text("the and of");
        assert!(unknown.is_empty());
        assert_eq!(unknown.cosine(&model.vectorize_text("beaches")), 0.0);
    }

    #[test]
    fn test_empty_corpus() {
        let model = TfIdfModel::fit(&[], 10, true);
        assert_eq!(model.vocabulary_len(), 0);
        assert!(model.vectorize_text("anything at all").is_empty());
    }
}
