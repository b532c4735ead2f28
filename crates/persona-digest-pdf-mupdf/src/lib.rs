use std::path::Path;

use mupdf::{Document, TextPageFlags};

use persona_digest_core::config_file::ExtractionConfig;
use persona_digest_core::{BackendError, Page, PageExtractor};

/// MuPDF-based implementation of [`PageExtractor`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so the analysis
/// pipeline can be built and tested without it.
///
/// Each text block becomes one paragraph: lines within a block are joined
/// with `\n` and blocks are separated by an empty line. Running headers and
/// footers are excluded by vertical position, by default the top 4% and
/// bottom 5% of each page.
pub struct MupdfBackend {
    /// Bottom band of the page dropped as running footer.
    footer_exclusion_ratio: Option<f32>,
    /// Top band of the page dropped as running header.
    header_exclusion_ratio: Option<f32>,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            footer_exclusion_ratio: Some(0.05),
            header_exclusion_ratio: Some(0.04),
        }
    }
}

impl MupdfBackend {
    /// Backend with the header/footer bands from an `[extraction]` config
    /// section. Unset keys keep the defaults; a ratio of `0` disables its band.
    pub fn from_config(config: Option<&ExtractionConfig>) -> Result<Self, BackendError> {
        let mut backend = Self::default();
        let Some(config) = config else {
            return Ok(backend);
        };
        if let Some(ratio) = config.header_exclusion_ratio {
            backend.header_exclusion_ratio = exclusion_band("header_exclusion_ratio", ratio)?;
        }
        if let Some(ratio) = config.footer_exclusion_ratio {
            backend.footer_exclusion_ratio = exclusion_band("footer_exclusion_ratio", ratio)?;
        }
        Ok(backend)
    }
}

/// Bands must leave the middle of the page readable.
const MAX_EXCLUSION_RATIO: f64 = 0.5;

fn exclusion_band(parameter: &'static str, ratio: f64) -> Result<Option<f32>, BackendError> {
    if !ratio.is_finite() || !(0.0..MAX_EXCLUSION_RATIO).contains(&ratio) {
        return Err(BackendError::InvalidSetting {
            parameter,
            reason: format!("{ratio} is outside [0, {MAX_EXCLUSION_RATIO})"),
        });
    }
    Ok((ratio > 0.0).then_some(ratio as f32))
}

impl PageExtractor for MupdfBackend {
    fn extract_pages(&self, path: &Path) -> Result<Vec<Page>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();

        for (index, page_result) in document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?
            .enumerate()
        {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

            let page_bounds = page
                .bounds()
                .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            let page_height = page_bounds.y1 - page_bounds.y0;

            let header_threshold = self
                .header_exclusion_ratio
                .map(|r| page_bounds.y0 + page_height * r);
            let footer_threshold = self
                .footer_exclusion_ratio
                .map(|r| page_bounds.y1 - page_height * r);

            let mut page_text = String::new();
            for block in text_page.blocks() {
                let block_bounds = block.bounds();

                // Skip blocks entirely within the header region
                if let Some(threshold) = header_threshold
                    && block_bounds.y1 <= threshold
                {
                    continue;
                }

                // Skip blocks whose top edge is in the footer region
                if let Some(threshold) = footer_threshold
                    && block_bounds.y0 >= threshold
                {
                    continue;
                }

                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
                page_text.push('\n');
            }

            pages.push(Page::new(index as u32 + 1, page_text));
        }

        tracing::debug!(path = %path.display(), pages = pages.len(), "extracted pages");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(header: Option<f64>, footer: Option<f64>) -> ExtractionConfig {
        ExtractionConfig {
            header_exclusion_ratio: header,
            footer_exclusion_ratio: footer,
        }
    }

    #[test]
    fn test_default_bands() {
        let backend = MupdfBackend::from_config(None).unwrap();
        assert_eq!(backend.header_exclusion_ratio, Some(0.04));
        assert_eq!(backend.footer_exclusion_ratio, Some(0.05));
    }

    #[test]
    fn test_config_overrides_and_disables() {
        let backend = MupdfBackend::from_config(Some(&extraction(Some(0.1), Some(0.0)))).unwrap();
        assert_eq!(backend.header_exclusion_ratio, Some(0.1));
        assert_eq!(backend.footer_exclusion_ratio, None);

        let backend = MupdfBackend::from_config(Some(&extraction(None, Some(0.08)))).unwrap();
        assert_eq!(backend.header_exclusion_ratio, Some(0.04));
        assert_eq!(backend.footer_exclusion_ratio, Some(0.08));
    }

    #[test]
    fn test_out_of_range_ratios_rejected() {
        for bad in [-0.1, 0.5, 0.9, f64::NAN, f64::INFINITY] {
            let err = MupdfBackend::from_config(Some(&extraction(None, Some(bad)))).unwrap_err();
            assert_eq!(err.kind(), "invalid_setting");
            assert!(err.to_string().contains("footer_exclusion_ratio"));
        }
        let err = MupdfBackend::from_config(Some(&extraction(Some(0.7), None))).unwrap_err();
        assert!(matches!(
            err,
            BackendError::InvalidSetting {
                parameter: "header_exclusion_ratio",
                ..
            }
        ));
    }
}
