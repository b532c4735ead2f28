use std::path::PathBuf;

use thiserror::Error;

pub mod export;
pub mod input;

pub use export::{
    ExportFormat, ExtractedSection, Metadata, OutputJson, SubsectionAnalysis, export_digest,
    render,
};
pub use input::{InputDocument, InputSpec, default_pdf_dir, load_input};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read input {path}: {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid input JSON in {path}: {source}")]
    ParseInput {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ReportError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::ReadInput { .. } => "input_unreadable",
            ReportError::ParseInput { .. } => "input_malformed",
            ReportError::InvalidInput(_) => "input_invalid",
            ReportError::Serialize(_) => "serialization",
            ReportError::Write { .. } => "output_unwritable",
        }
    }
}
