use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Compound-word suffixes that keep their hyphen when split across a line wrap.
pub(crate) static COMPOUND_SUFFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "based", "driven", "friendly", "free", "like", "style", "level", "term", "time", "wide",
        "known", "made", "owned", "run", "class", "day", "week", "year", "old", "star", "sized",
        "related", "specific", "oriented", "aware", "centered", "round", "inclusive", "only",
    ]
    .into_iter()
    .collect()
});

/// English stop words removed before vectorization.
pub(crate) static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just",
        "don", "should", "now", "also", "would", "could", "may", "might", "must", "shall", "us",
        "via", "per", "etc", "eg", "ie", "yet", "within", "without", "upon", "onto", "among",
        "across", "along", "around", "whether", "however", "therefore", "thus", "many", "much",
        "every", "either", "neither", "one", "another",
    ]
    .into_iter()
    .collect()
});

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Rejoin words hyphenated across a line wrap while preserving compound words.
///
/// - `"itiner-\nary"` → `"itinerary"` (syllable break)
/// - `"family-\nfriendly"` → `"family-friendly"` (compound word)
///
/// Hyphens that are not followed by a line break are left alone.
pub fn fix_hyphenation(text: &str) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)-[ \t]*\n[ \t]*(\w)(\w*)").unwrap());

    RE.replace_all(text, |caps: &regex::Captures| {
        let before = &caps[1];
        let after_word = format!("{}{}", &caps[2], &caps[3]);
        let after_lower = after_word.to_lowercase();

        // Digit before the hyphen: ranges and model names ("2-\n3", "A4-\nsize")
        if before.chars().last().is_some_and(|c| c.is_ascii_digit())
            || COMPOUND_SUFFIXES.contains(after_lower.as_str())
        {
            return format!("{}-{}", before, after_word);
        }

        format!("{}{}", before, after_word)
    })
    .into_owned()
}

/// Collapse every run of whitespace to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One line of normalized page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedLine {
    Text(String),
    /// One or more empty lines; marks a paragraph boundary.
    Break,
}

/// Normalize raw page text into trimmed, non-empty lines.
///
/// Line endings are unified, ligatures expanded, wrapped hyphenation repaired
/// and inner whitespace collapsed. Runs of empty lines become a single
/// [`NormalizedLine::Break`]; leading and trailing breaks are dropped.
pub fn normalize_page(text: &str) -> Vec<NormalizedLine> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = fix_hyphenation(&expand_ligatures(&text));

    let mut lines = Vec::new();
    for raw in text.lines() {
        let line = collapse_whitespace(raw);
        if line.is_empty() {
            if matches!(lines.last(), Some(NormalizedLine::Text(_))) {
                lines.push(NormalizedLine::Break);
            }
        } else {
            lines.push(NormalizedLine::Text(line));
        }
    }
    if matches!(lines.last(), Some(NormalizedLine::Break)) {
        lines.pop();
    }
    lines
}

/// Lowercased word tokens of at least two characters, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Whether a lowercased token is an English stop word.
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Truncate to at most `max_chars` characters, cutting at the last word
/// boundary when one exists. Returns the input unchanged if it already fits.
pub fn truncate_on_word_boundary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => cut[..pos].trim_end().to_string(),
        _ => cut,
    }
}

/// Truncate like [`truncate_on_word_boundary`] and mark the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let cut = truncate_on_word_boundary(text, max_chars);
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("ﬁnding ﬂow"), "finding flow");
        assert_eq!(expand_ligatures("eﬃcient oﬄine"), "efficient offline");
        assert_eq!(expand_ligatures("no ligatures here"), "no ligatures here");
    }

    #[test]
    fn test_fix_hyphenation_syllable_break() {
        assert_eq!(fix_hyphenation("itiner-\nary"), "itinerary");
        assert_eq!(fix_hyphenation("accommo- \n dation"), "accommodation");
    }

    #[test]
    fn test_fix_hyphenation_compound_word() {
        assert_eq!(fix_hyphenation("family-\nfriendly"), "family-friendly");
        assert_eq!(fix_hyphenation("world-\nclass"), "world-class");
        assert_eq!(fix_hyphenation("4-\nday"), "4-day");
    }

    #[test]
    fn test_fix_hyphenation_leaves_inline_hyphens() {
        assert_eq!(fix_hyphenation("a well-known spot"), "a well-known spot");
        assert_eq!(fix_hyphenation("Nice - the city"), "Nice - the city");
    }

    #[test]
    fn test_normalize_page_collapses_and_marks_paragraphs() {
        let text = "  Title   Line \r\n\tfirst\t\tbody line\n\n\n second   paragraph \n\n";
        let lines = normalize_page(text);
        assert_eq!(
            lines,
            vec![
                NormalizedLine::Text("Title Line".to_string()),
                NormalizedLine::Text("first body line".to_string()),
                NormalizedLine::Break,
                NormalizedLine::Text("second paragraph".to_string()),
            ]
        );
    }

    #[test]
    fn test_normalize_page_empty_input() {
        assert!(normalize_page("").is_empty());
        assert!(normalize_page(" \n\t\n ").is_empty());
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens = tokenize("Plan a 4-day trip for 10 college friends");
        assert_eq!(tokens, vec!["plan", "day", "trip", "10", "college", "friends"]);
    }

    #[test]
    fn test_truncate_on_word_boundary() {
        assert_eq!(truncate_on_word_boundary("short", 10), "short");
        assert_eq!(
            truncate_on_word_boundary("the quick brown fox", 12),
            "the quick"
        );
        assert_eq!(truncate_on_word_boundary("abcdefghij", 4), "abcd");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("fits", 10), "fits");
        assert_eq!(
            truncate_with_ellipsis("the quick brown fox", 12),
            "the quick..."
        );
    }
}
