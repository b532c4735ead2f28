use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use persona_digest_core::config_file::ConfigFile;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for `{parameter}`: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
    #[error("invalid pattern for `{parameter}`: {source}")]
    InvalidPattern {
        parameter: &'static str,
        source: regex::Error,
    },
}

impl ConfigError {
    /// Name of the offending configuration parameter.
    pub fn parameter(&self) -> &'static str {
        match self {
            ConfigError::InvalidParameter { parameter, .. } => parameter,
            ConfigError::InvalidPattern { parameter, .. } => parameter,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::InvalidParameter { .. } => "invalid_parameter",
            ConfigError::InvalidPattern { .. } => "invalid_pattern",
        }
    }

    fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// How a section body is split into candidate passages for refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    #[default]
    Paragraph,
    Sentence,
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paragraph" => Ok(Granularity::Paragraph),
            "sentence" => Ok(Granularity::Sentence),
            other => Err(ConfigError::invalid(
                "granularity",
                format!("expected \"paragraph\" or \"sentence\", got {other:?}"),
            )),
        }
    }
}

/// Configuration for segmentation, ranking and refinement.
///
/// Regex fields are `Option<Regex>`: `None` means "use the built-in default".
/// Use [`AnalysisConfigBuilder`] to construct with string patterns and
/// validated thresholds.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // ── heading.rs / segment.rs ──
    /// Longest line (in chars) that can be a pattern-based heading.
    pub(crate) heading_max_chars: usize,
    /// Shortest line (in chars) that can be a pattern-based heading.
    pub(crate) heading_min_chars: usize,
    /// Title length for sections opened before any heading.
    pub(crate) synthetic_title_chars: usize,
    /// Whole-line keywords that always open a section.
    pub(crate) structural_keywords: ListOverride<String>,
    /// Header/footer lines dropped before classification.
    pub(crate) ignore_patterns: ListOverride<Regex>,
    /// Regex for numbered headings (`1.`, `2.3`, ...).
    pub(crate) numbering_re: Option<Regex>,

    // ── query.rs / tfidf.rs ──
    /// Extra repetitions of task key terms in the query.
    pub(crate) task_term_weight: usize,
    /// Vocabulary cap for the run's TF-IDF space.
    pub(crate) max_features: usize,
    /// Include adjacent-word bigrams as terms.
    pub(crate) bigrams: bool,

    // ── ranking.rs ──
    pub(crate) top_n: usize,
    pub(crate) min_body_chars: usize,
    pub(crate) title_boost: f64,
    pub(crate) position_bonus: f64,

    // ── refine.rs ──
    pub(crate) granularity: Granularity,
    pub(crate) min_passage_chars: usize,
    pub(crate) max_passages: usize,
    pub(crate) max_refined_chars: usize,
    pub(crate) fallback_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            heading_max_chars: 80,
            heading_min_chars: 4,
            synthetic_title_chars: 60,
            structural_keywords: ListOverride::Default,
            ignore_patterns: ListOverride::Default,
            numbering_re: None,
            task_term_weight: 2,
            max_features: 5000,
            bigrams: true,
            top_n: 5,
            min_body_chars: 40,
            title_boost: 0.2,
            position_bonus: 0.01,
            granularity: Granularity::Paragraph,
            min_passage_chars: 50,
            max_passages: 1,
            max_refined_chars: 1000,
            fallback_chars: 200,
        }
    }
}

/// Builder for [`AnalysisConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build),
/// and validates every threshold there. Fails fast with a [`ConfigError`]
/// naming the offending parameter.
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfigBuilder {
    heading_max_chars: Option<usize>,
    heading_min_chars: Option<usize>,
    synthetic_title_chars: Option<usize>,
    structural_keywords: ListOverride<String>,
    ignore_patterns: ListOverride<String>,
    numbering_re: Option<String>,
    task_term_weight: Option<usize>,
    max_features: Option<usize>,
    bigrams: Option<bool>,
    top_n: Option<usize>,
    min_body_chars: Option<usize>,
    title_boost: Option<f64>,
    position_bonus: Option<f64>,
    granularity: Option<Granularity>,
    min_passage_chars: Option<usize>,
    max_passages: Option<usize>,
    max_refined_chars: Option<usize>,
    fallback_chars: Option<usize>,
}

/// Convert a config-file integer, rejecting negatives by name.
fn non_negative(parameter: &'static str, value: Option<i64>) -> Result<Option<usize>, ConfigError> {
    value
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| ConfigError::invalid(parameter, format!("must not be negative, got {v}")))
        })
        .transpose()
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from a loaded TOML config file.
    ///
    /// Later setter calls override file values (CLI flags sit on top).
    pub fn from_config_file(file: &ConfigFile) -> Result<Self, ConfigError> {
        let mut builder = Self::new();

        if let Some(seg) = &file.segmentation {
            builder.heading_max_chars = non_negative("heading_max_chars", seg.heading_max_chars)?;
            builder.heading_min_chars = non_negative("heading_min_chars", seg.heading_min_chars)?;
            builder.synthetic_title_chars =
                non_negative("synthetic_title_chars", seg.synthetic_title_chars)?;

            if let Some(keywords) = &seg.structural_keywords {
                builder = builder.set_structural_keywords(keywords.clone());
            }
            for keyword in seg.extra_structural_keywords.iter().flatten() {
                builder = builder.add_structural_keyword(keyword.clone());
            }
            if let Some(patterns) = &seg.ignore_patterns {
                builder = builder.set_ignore_patterns(patterns.clone());
            }
            for pattern in seg.extra_ignore_patterns.iter().flatten() {
                builder = builder.add_ignore_pattern(pattern.clone());
            }
        }

        if let Some(rank) = &file.ranking {
            builder.top_n = non_negative("top_n", rank.top_n)?;
            builder.min_body_chars = non_negative("min_body_chars", rank.min_body_chars)?;
            builder.task_term_weight = non_negative("task_term_weight", rank.task_term_weight)?;
            builder.max_features = non_negative("max_features", rank.max_features)?;
            builder.title_boost = rank.title_boost;
            builder.position_bonus = rank.position_bonus;
            builder.bigrams = rank.bigrams;
        }

        if let Some(refine) = &file.refinement {
            builder.granularity = refine
                .granularity
                .as_deref()
                .map(Granularity::from_str)
                .transpose()?;
            builder.min_passage_chars =
                non_negative("min_passage_chars", refine.min_passage_chars)?;
            builder.max_passages = non_negative("max_passages", refine.max_passages)?;
            builder.max_refined_chars =
                non_negative("max_refined_chars", refine.max_refined_chars)?;
            builder.fallback_chars = non_negative("fallback_chars", refine.fallback_chars)?;
        }

        Ok(builder)
    }

    // ── Segmentation ──

    pub fn heading_max_chars(mut self, n: usize) -> Self {
        self.heading_max_chars = Some(n);
        self
    }

    pub fn heading_min_chars(mut self, n: usize) -> Self {
        self.heading_min_chars = Some(n);
        self
    }

    pub fn synthetic_title_chars(mut self, n: usize) -> Self {
        self.synthetic_title_chars = Some(n);
        self
    }

    pub fn numbering_regex(mut self, pattern: &str) -> Self {
        self.numbering_re = Some(pattern.to_string());
        self
    }

    pub fn set_structural_keywords(mut self, keywords: Vec<String>) -> Self {
        self.structural_keywords = ListOverride::Replace(keywords);
        self
    }

    pub fn add_structural_keyword(mut self, keyword: String) -> Self {
        match &mut self.structural_keywords {
            ListOverride::Default => self.structural_keywords = ListOverride::Extend(vec![keyword]),
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(keyword),
        }
        self
    }

    pub fn set_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = ListOverride::Replace(patterns);
        self
    }

    pub fn add_ignore_pattern(mut self, pattern: String) -> Self {
        match &mut self.ignore_patterns {
            ListOverride::Default => self.ignore_patterns = ListOverride::Extend(vec![pattern]),
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(pattern),
        }
        self
    }

    // ── Query / vector space ──

    pub fn task_term_weight(mut self, n: usize) -> Self {
        self.task_term_weight = Some(n);
        self
    }

    pub fn max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn bigrams(mut self, enabled: bool) -> Self {
        self.bigrams = Some(enabled);
        self
    }

    // ── Ranking ──

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    pub fn min_body_chars(mut self, n: usize) -> Self {
        self.min_body_chars = Some(n);
        self
    }

    pub fn title_boost(mut self, bonus: f64) -> Self {
        self.title_boost = Some(bonus);
        self
    }

    pub fn position_bonus(mut self, bonus: f64) -> Self {
        self.position_bonus = Some(bonus);
        self
    }

    // ── Refinement ──

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub fn min_passage_chars(mut self, n: usize) -> Self {
        self.min_passage_chars = Some(n);
        self
    }

    pub fn max_passages(mut self, n: usize) -> Self {
        self.max_passages = Some(n);
        self
    }

    pub fn max_refined_chars(mut self, n: usize) -> Self {
        self.max_refined_chars = Some(n);
        self
    }

    pub fn fallback_chars(mut self, n: usize) -> Self {
        self.fallback_chars = Some(n);
        self
    }

    /// Compile all patterns, validate thresholds and produce an [`AnalysisConfig`].
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let defaults = AnalysisConfig::default();

        let numbering_re = self
            .numbering_re
            .map(|p| Regex::new(&p))
            .transpose()
            .map_err(|source| ConfigError::InvalidPattern {
                parameter: "numbering_regex",
                source,
            })?;

        let compile_list = |patterns: Vec<String>| -> Result<Vec<Regex>, ConfigError> {
            patterns
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ConfigError::InvalidPattern {
                    parameter: "ignore_patterns",
                    source,
                })
        };
        let ignore_patterns = match self.ignore_patterns {
            ListOverride::Default => ListOverride::Default,
            ListOverride::Replace(p) => ListOverride::Replace(compile_list(p)?),
            ListOverride::Extend(p) => ListOverride::Extend(compile_list(p)?),
        };

        let config = AnalysisConfig {
            heading_max_chars: self.heading_max_chars.unwrap_or(defaults.heading_max_chars),
            heading_min_chars: self.heading_min_chars.unwrap_or(defaults.heading_min_chars),
            synthetic_title_chars: self
                .synthetic_title_chars
                .unwrap_or(defaults.synthetic_title_chars),
            structural_keywords: self.structural_keywords,
            ignore_patterns,
            numbering_re,
            task_term_weight: self.task_term_weight.unwrap_or(defaults.task_term_weight),
            max_features: self.max_features.unwrap_or(defaults.max_features),
            bigrams: self.bigrams.unwrap_or(defaults.bigrams),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            min_body_chars: self.min_body_chars.unwrap_or(defaults.min_body_chars),
            title_boost: self.title_boost.unwrap_or(defaults.title_boost),
            position_bonus: self.position_bonus.unwrap_or(defaults.position_bonus),
            granularity: self.granularity.unwrap_or(defaults.granularity),
            min_passage_chars: self.min_passage_chars.unwrap_or(defaults.min_passage_chars),
            max_passages: self.max_passages.unwrap_or(defaults.max_passages),
            max_refined_chars: self.max_refined_chars.unwrap_or(defaults.max_refined_chars),
            fallback_chars: self.fallback_chars.unwrap_or(defaults.fallback_chars),
        };

        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &AnalysisConfig) -> Result<(), ConfigError> {
    if config.top_n == 0 {
        return Err(ConfigError::invalid("top_n", "must be at least 1"));
    }
    if config.heading_max_chars == 0 {
        return Err(ConfigError::invalid("heading_max_chars", "must be at least 1"));
    }
    if config.heading_min_chars > config.heading_max_chars {
        return Err(ConfigError::invalid(
            "heading_min_chars",
            format!(
                "{} exceeds heading_max_chars ({})",
                config.heading_min_chars, config.heading_max_chars
            ),
        ));
    }
    if config.max_features == 0 {
        return Err(ConfigError::invalid("max_features", "must be at least 1"));
    }
    if config.max_passages == 0 {
        return Err(ConfigError::invalid("max_passages", "must be at least 1"));
    }
    if config.max_refined_chars == 0 {
        return Err(ConfigError::invalid("max_refined_chars", "must be at least 1"));
    }
    if config.fallback_chars == 0 {
        return Err(ConfigError::invalid("fallback_chars", "must be at least 1"));
    }
    for (parameter, value) in [
        ("title_boost", config.title_boost),
        ("position_bonus", config.position_bonus),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::invalid(
                parameter,
                format!("must be a finite non-negative number, got {value}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_digest_core::config_file::{RankingConfig, RefinementConfig, SegmentationConfig};

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.min_body_chars, 40);
        assert_eq!(config.heading_max_chars, 80);
        assert!((config.title_boost - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.granularity, Granularity::Paragraph);
    }

    #[test]
    fn test_builder_basic() {
        let config = AnalysisConfigBuilder::new()
            .top_n(10)
            .min_body_chars(60)
            .granularity(Granularity::Sentence)
            .build()
            .unwrap();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.min_body_chars, 60);
        assert_eq!(config.granularity, Granularity::Sentence);
    }

    #[test]
    fn test_builder_rejects_zero_top_n() {
        let err = AnalysisConfigBuilder::new().top_n(0).build().unwrap_err();
        assert_eq!(err.parameter(), "top_n");
    }

    #[test]
    fn test_builder_rejects_negative_bonus() {
        let err = AnalysisConfigBuilder::new()
            .title_boost(-0.5)
            .build()
            .unwrap_err();
        assert_eq!(err.parameter(), "title_boost");

        let err = AnalysisConfigBuilder::new()
            .position_bonus(f64::NAN)
            .build()
            .unwrap_err();
        assert_eq!(err.parameter(), "position_bonus");
    }

    #[test]
    fn test_builder_rejects_inverted_heading_bounds() {
        let err = AnalysisConfigBuilder::new()
            .heading_min_chars(50)
            .heading_max_chars(20)
            .build()
            .unwrap_err();
        assert_eq!(err.parameter(), "heading_min_chars");
    }

    #[test]
    fn test_builder_invalid_regex() {
        let err = AnalysisConfigBuilder::new()
            .add_ignore_pattern(r"[invalid".to_string())
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert_eq!(err.parameter(), "ignore_patterns");

        let err = AnalysisConfigBuilder::new()
            .numbering_regex(r"(unclosed")
            .build()
            .unwrap_err();
        assert_eq!(err.parameter(), "numbering_regex");
    }

    #[test]
    fn test_from_config_file_negative_top_n() {
        let file = ConfigFile {
            ranking: Some(RankingConfig {
                top_n: Some(-1),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = AnalysisConfigBuilder::from_config_file(&file).unwrap_err();
        assert_eq!(err.parameter(), "top_n");
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_from_config_file_values_and_override() {
        let file = ConfigFile {
            segmentation: Some(SegmentationConfig {
                extra_structural_keywords: Some(vec!["Itinerary".to_string()]),
                ..Default::default()
            }),
            ranking: Some(RankingConfig {
                top_n: Some(8),
                title_boost: Some(0.5),
                ..Default::default()
            }),
            refinement: Some(RefinementConfig {
                granularity: Some("sentence".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AnalysisConfigBuilder::from_config_file(&file)
            .unwrap()
            .top_n(3)
            .build()
            .unwrap();
        assert_eq!(config.top_n, 3);
        assert!((config.title_boost - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.granularity, Granularity::Sentence);
        assert!(matches!(
            config.structural_keywords,
            ListOverride::Extend(ref v) if v == &vec!["Itinerary".to_string()]
        ));
    }

    #[test]
    fn test_unknown_granularity() {
        let err = "chapter".parse::<Granularity>().unwrap_err();
        assert_eq!(err.parameter(), "granularity");
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["c".to_string()]);
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
