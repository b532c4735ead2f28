use std::io::Write;
use std::path::Path;
use std::time::Duration;

use owo_colors::OwoColorize;

use persona_digest_analysis::text_processing::{collapse_whitespace, truncate_with_ellipsis};
use persona_digest_core::{Digest, Document, Section};

/// Characters of body text shown per section by `inspect`.
const PREVIEW_CHARS: usize = 160;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the ranking summary after a run.
pub fn print_run_summary(
    w: &mut dyn Write,
    digest: &Digest,
    documents: usize,
    output_path: &Path,
    elapsed: Duration,
    color: ColorMode,
) -> std::io::Result<()> {
    for failed in &digest.failed_documents {
        if color.enabled() {
            writeln!(w, "{} could not extract {}", "WARNING:".yellow(), failed)?;
        } else {
            writeln!(w, "WARNING: could not extract {}", failed)?;
        }
    }

    writeln!(
        w,
        "Ranked {} of {} sections from {} documents in {:.2}s",
        digest.sections.len(),
        digest.total_sections,
        documents.saturating_sub(digest.failed_documents.len()),
        elapsed.as_secs_f64()
    )?;

    if digest.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "No section met the minimum length.".dimmed())?;
        } else {
            writeln!(w, "No section met the minimum length.")?;
        }
    }

    for scored in &digest.sections {
        let section = &scored.section;
        let location = format!("({}, p. {})", section.document, section.page_number);
        if color.enabled() {
            writeln!(
                w,
                "  {}. {} {} {}",
                scored.importance_rank,
                section.title.bold(),
                location.dimmed(),
                format!("{:.3}", scored.score).cyan()
            )?;
        } else {
            writeln!(
                w,
                "  {}. {} {} {:.3}",
                scored.importance_rank, section.title, location, scored.score
            )?;
        }
    }

    if color.enabled() {
        writeln!(w, "{} {}", "Wrote".green(), output_path.display())?;
    } else {
        writeln!(w, "Wrote {}", output_path.display())?;
    }
    Ok(())
}

/// Print every section of one segmented document.
pub fn print_sections(
    w: &mut dyn Write,
    document: &Document,
    sections: &[Section],
    color: ColorMode,
) -> std::io::Result<()> {
    let header = format!(
        "{}: {} pages, {} sections",
        document.name,
        document.page_count(),
        sections.len()
    );
    if color.enabled() {
        writeln!(w, "{}", header.bold())?;
    } else {
        writeln!(w, "{}", header)?;
    }

    for section in sections {
        writeln!(w)?;
        let words = section.body.split_whitespace().count();
        let meta = format!("(page {}, {} words)", section.page_number, words);
        if color.enabled() {
            writeln!(
                w,
                "{}. {} {}",
                section.ordinal + 1,
                section.title.cyan(),
                meta.dimmed()
            )?;
        } else {
            writeln!(w, "{}. {} {}", section.ordinal + 1, section.title, meta)?;
        }
        let preview = truncate_with_ellipsis(&collapse_whitespace(&section.body), PREVIEW_CHARS);
        writeln!(w, "   {}", preview)?;
    }
    Ok(())
}
