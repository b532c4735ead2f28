use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AnalysisConfig;
use crate::text_processing::{is_stop_word, tokenize};
use crate::tfidf::{TermCounts, ngrams};

/// Task verbs that never become boost terms.
static COMMON_VERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "plan", "create", "prepare", "find", "identify", "make", "write", "review", "analyze",
        "analyse", "summarize", "summarise", "compare", "provide", "develop", "build", "design",
        "organize", "organise", "help", "need", "want", "get", "use", "list", "select", "choose",
        "explain", "describe", "evaluate", "assess", "understand", "learn", "study", "manage",
        "improve", "ensure", "include", "give", "take", "look", "see", "know", "go", "suggest",
        "recommend", "fill", "convert", "extract", "highlight", "propose", "offer", "focus",
        "cover", "discover", "explore", "arrange", "book", "host", "serve", "keep", "set",
    ]
    .into_iter()
    .collect()
});

/// Weighted bag of terms built from a persona role and a task.
///
/// Immutable once built; shared by the ranker and the refiner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    terms: TermCounts,
    boost_terms: Vec<String>,
}

impl Query {
    pub fn terms(&self) -> &TermCounts {
        &self.terms
    }

    /// High-signal task keywords, in order of first appearance.
    pub fn boost_terms(&self) -> &[String] {
        &self.boost_terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The first boost term found among the title's tokens.
    ///
    /// Matching is case-insensitive and tolerates a plural `s` on either side.
    pub fn boost_match(&self, title: &str) -> Option<&str> {
        let title_tokens = tokenize(title);
        self.boost_terms
            .iter()
            .find(|term| title_tokens.iter().any(|token| same_word(token, term)))
            .map(String::as_str)
    }
}

fn same_word(a: &str, b: &str) -> bool {
    a == b || a.strip_suffix('s') == Some(b) || b.strip_suffix('s') == Some(a)
}

/// Builds the run's [`Query`] from persona role and task text.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    task_term_weight: usize,
    bigrams: bool,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl QueryBuilder {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            task_term_weight: config.task_term_weight,
            bigrams: config.bigrams,
        }
    }

    pub fn build(&self, role: &str, task: &str) -> Query {
        let role_tokens = tokenize(role);
        let task_tokens = tokenize(task);

        let mut terms = TermCounts::new();
        for term in ngrams(&role_tokens, self.bigrams)
            .into_iter()
            .chain(ngrams(&task_tokens, self.bigrams))
        {
            *terms.entry(term).or_insert(0.0) += 1.0;
        }
        if self.task_term_weight > 0 {
            for token in task_tokens.iter().filter(|t| t.chars().count() > 2) {
                *terms.entry(token.clone()).or_insert(0.0) += self.task_term_weight as f64;
            }
        }

        let role_set: HashSet<&str> = role_tokens.iter().map(String::as_str).collect();
        let boost_terms = boost_terms(task, &role_set);

        tracing::debug!(
            terms = terms.len(),
            boost_terms = ?boost_terms,
            "built query"
        );

        Query { terms, boost_terms }
    }
}

/// Pick boost terms from the task text in order of first appearance.
///
/// A token qualifies if it is capitalized in the source without starting a
/// sentence, also appears in the role, or looks like a content noun.
fn boost_terms(task: &str, role_tokens: &HashSet<&str>) -> Vec<String> {
    static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for m in WORD_RE.find_iter(task) {
        let word = m.as_str();
        let lower = word.to_lowercase();
        if is_stop_word(&lower) || seen.contains(&lower) {
            continue;
        }

        let capitalized = word.chars().next().is_some_and(char::is_uppercase)
            && !starts_sentence(&task[..m.start()]);
        let shared = role_tokens.contains(lower.as_str());

        if capitalized || shared || is_content_noun(&lower) {
            seen.insert(lower.clone());
            terms.push(lower);
        }
    }
    terms
}

fn starts_sentence(preceding: &str) -> bool {
    match preceding.trim_end().chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | ':'),
    }
}

fn is_content_noun(token: &str) -> bool {
    token.chars().count() > 2
        && !token.chars().all(|c| c.is_ascii_digit())
        && !token.ends_with("ly")
        && !COMMON_VERBS.contains(token)
}
