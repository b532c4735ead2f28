use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ReportError;

/// Directory next to the input file that holds the PDFs by default.
pub const DEFAULT_PDF_DIR: &str = "PDFs";

/// Run description: which documents to read and for whom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    /// Accepted for compatibility with batch manifests; not used by the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_info: Option<ChallengeInfo>,
    pub documents: Vec<InputDocument>,
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeInfo {
    #[serde(default)]
    pub challenge_id: Option<String>,
    #[serde(default)]
    pub test_case_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDocument {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

impl InputSpec {
    pub fn role(&self) -> &str {
        self.persona.role.trim()
    }

    pub fn task(&self) -> &str {
        self.job_to_be_done.task.trim()
    }

    /// Reject specs the pipeline cannot run on.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.documents.is_empty() {
            return Err(ReportError::InvalidInput("no documents listed".into()));
        }
        if let Some(i) = self
            .documents
            .iter()
            .position(|d| d.filename.trim().is_empty())
        {
            return Err(ReportError::InvalidInput(format!(
                "document {} has an empty filename",
                i + 1
            )));
        }
        if self.role().is_empty() {
            return Err(ReportError::InvalidInput("persona.role is empty".into()));
        }
        if self.task().is_empty() {
            return Err(ReportError::InvalidInput(
                "job_to_be_done.task is empty".into(),
            ));
        }
        Ok(())
    }

    /// Filenames in input order, as echoed in the output metadata.
    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }

    /// Resolve each document to `(filename, title, path)` under `pdf_dir`.
    pub fn resolve_paths(&self, pdf_dir: &Path) -> Vec<(String, Option<String>, PathBuf)> {
        self.documents
            .iter()
            .map(|d| (d.filename.clone(), d.title.clone(), pdf_dir.join(&d.filename)))
            .collect()
    }
}

/// Default PDF directory for an input file: `<input dir>/PDFs`.
pub fn default_pdf_dir(input_path: &Path) -> PathBuf {
    input_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(DEFAULT_PDF_DIR)
}

/// Read, parse and validate an input JSON file.
pub fn load_input(path: &Path) -> Result<InputSpec, ReportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReportError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    let spec: InputSpec =
        serde_json::from_str(&content).map_err(|source| ReportError::ParseInput {
            path: path.to_path_buf(),
            source,
        })?;
    spec.validate()?;
    tracing::debug!(
        path = %path.display(),
        documents = spec.documents.len(),
        "loaded input"
    );
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "challenge_info": {"challenge_id": "round_1b_002", "test_case_name": "travel_planner"},
        "documents": [
            {"filename": "South of France - Cities.pdf", "title": "South of France - Cities"},
            {"filename": "South of France - Cuisine.pdf"}
        ],
        "persona": {"role": "Travel Planner"},
        "job_to_be_done": {"task": "Plan a trip of 4 days for a group of 10 college friends."}
    }"#;

    fn write_input(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_sample_input() {
        let (_dir, path) = write_input(SAMPLE);
        let spec = load_input(&path).unwrap();
        assert_eq!(spec.documents.len(), 2);
        assert_eq!(spec.role(), "Travel Planner");
        assert_eq!(spec.documents[1].title, None);
        assert_eq!(
            spec.challenge_info.unwrap().challenge_id.as_deref(),
            Some("round_1b_002")
        );
    }

    #[test]
    fn test_challenge_info_optional() {
        let spec: InputSpec = serde_json::from_str(
            r#"{"documents": [{"filename": "a.pdf"}],
                "persona": {"role": "Chef"},
                "job_to_be_done": {"task": "Prepare a menu"}}"#,
        )
        .unwrap();
        assert!(spec.challenge_info.is_none());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let base: InputSpec = serde_json::from_str(SAMPLE).unwrap();

        let mut spec = base.clone();
        spec.documents.clear();
        assert!(matches!(spec.validate(), Err(ReportError::InvalidInput(_))));

        let mut spec = base.clone();
        spec.documents[1].filename = "  ".into();
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("document 2"));

        let mut spec = base.clone();
        spec.persona.role = " ".into();
        assert!(spec.validate().unwrap_err().to_string().contains("persona.role"));

        let mut spec = base;
        spec.job_to_be_done.task = String::new();
        assert_eq!(spec.validate().unwrap_err().kind(), "input_invalid");
    }

    #[test]
    fn test_malformed_json() {
        let (_dir, path) = write_input("{\"documents\": [");
        let err = load_input(&path).unwrap_err();
        assert_eq!(err.kind(), "input_malformed");
    }

    #[test]
    fn test_missing_file() {
        let err = load_input(Path::new("/nonexistent/input.json")).unwrap_err();
        assert!(matches!(err, ReportError::ReadInput { .. }));
    }

    #[test]
    fn test_default_pdf_dir_and_paths() {
        let pdf_dir = default_pdf_dir(Path::new("/data/collection1/input.json"));
        assert_eq!(pdf_dir, PathBuf::from("/data/collection1/PDFs"));

        let spec: InputSpec = serde_json::from_str(SAMPLE).unwrap();
        let paths = spec.resolve_paths(&pdf_dir);
        assert_eq!(
            paths[0].2,
            PathBuf::from("/data/collection1/PDFs/South of France - Cities.pdf")
        );
        assert_eq!(paths[0].1.as_deref(), Some("South of France - Cities"));
    }
}
