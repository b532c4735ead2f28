use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use persona_digest_core::Digest;

use crate::ReportError;
use crate::input::InputSpec;

/// Output formats supported by [`export_digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Markdown => "Markdown",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            other => Err(ReportError::InvalidInput(format!(
                "unknown output format {other:?} (expected json or markdown)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

impl Metadata {
    /// Metadata for a run of `spec`, stamped with the current local time.
    pub fn for_run(spec: &InputSpec) -> Self {
        Self {
            input_documents: spec.filenames(),
            persona: spec.role().to_string(),
            job_to_be_done: spec.task().to_string(),
            processing_timestamp: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    pub importance_rank: usize,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

/// The digest as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputJson {
    pub metadata: Metadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

impl OutputJson {
    /// Lay out a digest in rank order.
    pub fn from_digest(digest: &Digest, metadata: Metadata) -> Self {
        let extracted_sections = digest
            .sections
            .iter()
            .map(|s| ExtractedSection {
                document: s.section.document.clone(),
                section_title: s.section.title.clone(),
                importance_rank: s.importance_rank,
                page_number: s.section.page_number,
            })
            .collect();
        let subsection_analysis = digest
            .passages
            .iter()
            .map(|p| SubsectionAnalysis {
                document: p.document.clone(),
                refined_text: p.text.clone(),
                page_number: p.page_number,
            })
            .collect();
        Self {
            metadata,
            extracted_sections,
            subsection_analysis,
        }
    }
}

/// Render the output in the given format.
pub fn render(output: &OutputJson, format: ExportFormat) -> Result<String, ReportError> {
    match format {
        ExportFormat::Json => render_json(output),
        ExportFormat::Markdown => Ok(render_markdown(output)),
    }
}

/// Write the output to `path`, creating missing parent directories.
pub fn export_digest(
    output: &OutputJson,
    format: ExportFormat,
    path: &Path,
) -> Result<(), ReportError> {
    let content = render(output, format)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), format = format.label(), "wrote digest");
    Ok(())
}

/// Pretty JSON with 4-space indentation.
fn render_json(output: &OutputJson) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    output.serialize(&mut serializer)?;
    buf.push(b'\n');
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

fn render_markdown(output: &OutputJson) -> String {
    let meta = &output.metadata;
    let mut out = String::from("# Persona Digest\n\n");
    out.push_str(&format!("**Persona:** {}  \n", meta.persona));
    out.push_str(&format!("**Task:** {}  \n", meta.job_to_be_done));
    out.push_str(&format!(
        "**Documents:** {}  \n",
        meta.input_documents.join(", ")
    ));
    out.push_str(&format!("**Generated:** {}\n\n", meta.processing_timestamp));

    out.push_str("## Extracted Sections\n\n");
    if output.extracted_sections.is_empty() {
        out.push_str("_No relevant sections found._\n\n");
    } else {
        out.push_str("| Rank | Section | Document | Page |\n");
        out.push_str("|---:|---|---|---:|\n");
        for s in &output.extracted_sections {
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                s.importance_rank,
                md_escape(&s.section_title),
                md_escape(&s.document),
                s.page_number
            ));
        }
        out.push('\n');
    }

    if !output.subsection_analysis.is_empty() {
        out.push_str("## Subsection Analysis\n\n");
        for (i, a) in output.subsection_analysis.iter().enumerate() {
            out.push_str(&format!(
                "### {}. {} (page {})\n\n",
                i + 1,
                a.document,
                a.page_number
            ));
            for line in a.refined_text.lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
    }

    out
}
