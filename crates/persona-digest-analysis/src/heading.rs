//! Heading detection.
//!
//! A heading is recognised from line features alone: length, numbering,
//! letter case, terminal punctuation and a keyword list, plus the line that
//! came before it. [`is_heading`] is a pure predicate so it can be tested and
//! swapped independently of the segmenter.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AnalysisConfig;

/// Whole-line keywords that always open a section.
pub(crate) const DEFAULT_STRUCTURAL_KEYWORDS: &[&str] = &[
    "Abstract",
    "Introduction",
    "Overview",
    "Background",
    "Summary",
    "Methods",
    "Results",
    "Discussion",
    "Conclusion",
    "Conclusions",
    "References",
    "Appendix",
    "Acknowledgments",
    "Acknowledgements",
];

/// Running headers/footers dropped before classification.
pub(crate) const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    r"^\d+$",
    r"(?i)^page\s+\d+(\s+of\s+\d+)?$",
    r"(?i)^copyright\b",
    r"^©",
    r"(?i)^all rights reserved",
    r"(?i)^confidential$",
];

static DEFAULT_NUMBERING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)*\.?\s+\S*\p{L}").unwrap());

static DEFAULT_IGNORE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_IGNORE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Words allowed to stay lowercase inside a Title-Case heading.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "nor", "of", "on",
    "or", "per", "the", "to", "vs", "via", "with",
];

/// A previous line ending in one of these words continues into the next line.
const CONNECTOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "of", "on", "or", "the", "to",
    "with",
];

const BULLETS: &[char] = &['•', '·', '▪', '◦', '●', '○', '■', '□', '-', '–', '—', '*', '>'];

/// Heading rules resolved once from an [`AnalysisConfig`].
#[derive(Debug, Clone)]
pub struct HeadingRules {
    min_chars: usize,
    max_chars: usize,
    keywords: HashSet<String>,
    numbering: Regex,
    ignore: Vec<Regex>,
}

impl HeadingRules {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let defaults: Vec<String> = DEFAULT_STRUCTURAL_KEYWORDS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let keywords = config
            .structural_keywords
            .resolve(&defaults)
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            min_chars: config.heading_min_chars,
            max_chars: config.heading_max_chars,
            keywords,
            numbering: config
                .numbering_re
                .clone()
                .unwrap_or_else(|| DEFAULT_NUMBERING_RE.clone()),
            ignore: config.ignore_patterns.resolve(&DEFAULT_IGNORE_RES),
        }
    }

    /// Whether a line is a running header/footer that carries no content.
    pub fn is_ignored(&self, line: &str) -> bool {
        let line = line.trim();
        self.ignore.iter().any(|re| re.is_match(line))
    }

    fn is_structural_keyword(&self, line: &str) -> bool {
        let bare = line.trim().trim_end_matches(':').trim_end();
        self.keywords.contains(&bare.to_lowercase())
    }

    fn is_numbered(&self, line: &str) -> bool {
        self.numbering.is_match(line)
    }
}

impl Default for HeadingRules {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Classify a normalized line as a heading candidate.
///
/// `previous` is the preceding text line of the same paragraph, if any. A
/// Title-Case or ALL-CAPS line directly after a line that clearly runs on
/// (trailing comma, hyphen, ampersand or connector word) is a wrapped body
/// line. Numbered and keyword headings ignore that context.
pub fn is_heading(line: &str, previous: Option<&str>, rules: &HeadingRules) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return false;
    }
    if rules.is_structural_keyword(line) {
        return true;
    }

    let len = line.chars().count();
    if len < rules.min_chars || len > rules.max_chars {
        return false;
    }
    if ends_with_terminal_punctuation(line) || is_bullet_item(line) {
        return false;
    }
    if !line.chars().any(char::is_alphabetic) {
        return false;
    }
    if rules.is_numbered(line) {
        return true;
    }
    if previous.is_some_and(continues_into_next_line) {
        return false;
    }

    is_all_caps(line) || is_title_case(line)
}

/// Title text for a heading line: trailing colon removed.
pub fn heading_title(line: &str) -> String {
    line.trim().trim_end_matches(':').trim_end().to_string()
}

fn ends_with_terminal_punctuation(line: &str) -> bool {
    line.ends_with(['.', ',', ';', '!', '?'])
}

fn is_bullet_item(line: &str) -> bool {
    line.starts_with(BULLETS)
}

fn continues_into_next_line(previous: &str) -> bool {
    let previous = previous.trim_end();
    if previous.ends_with([',', '-', '&', '/']) {
        return true;
    }
    previous
        .rsplit(char::is_whitespace)
        .next()
        .is_some_and(|last| CONNECTOR_WORDS.contains(&last))
}

fn is_all_caps(line: &str) -> bool {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 2 && !line.chars().any(char::is_lowercase)
}

fn is_title_case(line: &str) -> bool {
    let mut saw_word = false;
    for (i, word) in line.split_whitespace().enumerate() {
        let Some(first) = word.chars().find(|c| c.is_alphanumeric()) else {
            continue;
        };
        if !first.is_alphabetic() {
            continue;
        }
        if first.is_uppercase() {
            saw_word = true;
            continue;
        }
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
        if i == 0 || !MINOR_WORDS.contains(&bare) {
            return false;
        }
    }
    saw_word
}
