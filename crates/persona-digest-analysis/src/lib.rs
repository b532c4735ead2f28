use thiserror::Error;

pub mod config;
pub mod heading;
pub mod pipeline;
pub mod query;
pub mod ranking;
pub mod refine;
pub mod segment;
pub mod text_processing;
pub mod tfidf;

pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigError, Granularity, ListOverride};
pub use heading::{HeadingRules, is_heading};
pub use pipeline::{DigestPipeline, DocumentSource};
pub use query::{Query, QueryBuilder};
pub use ranking::{RelevanceRanker, ScoreBreakdown};
pub use refine::SubsectionRefiner;
pub use segment::{SectionSegmenter, segment_document};
pub use tfidf::{SparseVector, TfIdfModel};
// Re-export domain types from core (canonical definitions live there)
pub use persona_digest_core::{
    Digest, Document, ExtractionFailure, Page, PageExtractor, RefinedPassage, ScoredSection,
    Section,
};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("no input data: none of the {attempted} document(s) could be extracted")]
    NoInputData { attempted: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AnalysisError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::NoInputData { .. } => "no_input_data",
            AnalysisError::Config(_) => "configuration",
        }
    }
}

/// Build a digest over already-extracted documents with the default configuration.
pub fn build_digest(documents: Vec<Document>, role: &str, task: &str) -> Result<Digest, AnalysisError> {
    DigestPipeline::default().run(documents.into_iter().map(Ok).collect(), role, task)
}
