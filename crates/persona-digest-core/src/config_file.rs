use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
///
/// Integer thresholds are read as `i64` so that out-of-range values such as a
/// negative `top_n` reach validation and are reported by name instead of
/// failing deserialization with a generic type error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub segmentation: Option<SegmentationConfig>,
    pub ranking: Option<RankingConfig>,
    pub refinement: Option<RefinementConfig>,
}

/// Page extraction settings, applied to the PDF backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Fraction of page height at the top treated as running header. `0` disables.
    pub header_exclusion_ratio: Option<f64>,
    /// Fraction of page height at the bottom treated as running footer. `0` disables.
    pub footer_exclusion_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub heading_max_chars: Option<i64>,
    pub heading_min_chars: Option<i64>,
    pub synthetic_title_chars: Option<i64>,
    /// Replaces the built-in structural keyword list.
    pub structural_keywords: Option<Vec<String>>,
    /// Appended to the structural keyword list.
    pub extra_structural_keywords: Option<Vec<String>>,
    /// Replaces the built-in header/footer ignore patterns (regexes).
    pub ignore_patterns: Option<Vec<String>>,
    /// Appended to the header/footer ignore patterns.
    pub extra_ignore_patterns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingConfig {
    pub top_n: Option<i64>,
    pub min_body_chars: Option<i64>,
    pub title_boost: Option<f64>,
    pub position_bonus: Option<f64>,
    pub task_term_weight: Option<i64>,
    pub max_features: Option<i64>,
    pub bigrams: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefinementConfig {
    /// `"paragraph"` or `"sentence"`.
    pub granularity: Option<String>,
    pub min_passage_chars: Option<i64>,
    pub max_passages: Option<i64>,
    pub max_refined_chars: Option<i64>,
    pub fallback_chars: Option<i64>,
}

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Platform config directory path: `<config_dir>/persona-digest/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("persona-digest").join("config.toml"))
}

/// Load config by cascading CWD `.persona-digest.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".persona-digest.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load the cascade and lay an explicitly requested file on top of it.
///
/// Unlike the cascade files, an explicit file must exist and parse.
pub fn load_config_with(explicit: Option<&Path>) -> Result<ConfigFile, ConfigFileError> {
    let cascade = load_config();
    match explicit {
        Some(path) => Ok(merge(cascade, read_config(path)?)),
        None => Ok(cascade),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    if !path.exists() {
        return None;
    }
    match read_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
            None
        }
    }
}

/// Read and parse a config file, reporting why it could not be used.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Take a field from `overlay` if set, otherwise from `base`.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (be, oe) = (base.extraction.as_ref(), overlay.extraction.as_ref());
    let (bs, os) = (base.segmentation.as_ref(), overlay.segmentation.as_ref());
    let (br, or) = (base.ranking.as_ref(), overlay.ranking.as_ref());
    let (bf, of) = (base.refinement.as_ref(), overlay.refinement.as_ref());

    ConfigFile {
        extraction: Some(ExtractionConfig {
            header_exclusion_ratio: pick(oe, be, |e| e.header_exclusion_ratio),
            footer_exclusion_ratio: pick(oe, be, |e| e.footer_exclusion_ratio),
        }),
        segmentation: Some(SegmentationConfig {
            heading_max_chars: pick(os, bs, |s| s.heading_max_chars),
            heading_min_chars: pick(os, bs, |s| s.heading_min_chars),
            synthetic_title_chars: pick(os, bs, |s| s.synthetic_title_chars),
            structural_keywords: pick(os, bs, |s| s.structural_keywords.clone()),
            extra_structural_keywords: pick(os, bs, |s| s.extra_structural_keywords.clone()),
            ignore_patterns: pick(os, bs, |s| s.ignore_patterns.clone()),
            extra_ignore_patterns: pick(os, bs, |s| s.extra_ignore_patterns.clone()),
        }),
        ranking: Some(RankingConfig {
            top_n: pick(or, br, |r| r.top_n),
            min_body_chars: pick(or, br, |r| r.min_body_chars),
            title_boost: pick(or, br, |r| r.title_boost),
            position_bonus: pick(or, br, |r| r.position_bonus),
            task_term_weight: pick(or, br, |r| r.task_term_weight),
            max_features: pick(or, br, |r| r.max_features),
            bigrams: pick(or, br, |r| r.bigrams),
        }),
        refinement: Some(RefinementConfig {
            granularity: pick(of, bf, |f| f.granularity.clone()),
            min_passage_chars: pick(of, bf, |f| f.min_passage_chars),
            max_passages: pick(of, bf, |f| f.max_passages),
            max_refined_chars: pick(of, bf, |f| f.max_refined_chars),
            fallback_chars: pick(of, bf, |f| f.fallback_chars),
        }),
    }
}
