use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use persona_digest_analysis::{
    AnalysisConfig, AnalysisConfigBuilder, DigestPipeline, DocumentSource, SectionSegmenter,
};
use persona_digest_core::{Document, PageExtractor, config_file};
use persona_digest_pdf_mupdf::MupdfBackend;
use persona_digest_reporting::{
    ExportFormat, Metadata, OutputJson, default_pdf_dir, export_digest, load_input,
};

mod output;

use output::ColorMode;

/// Environment override for the number of ranked sections.
const TOP_N_ENV: &str = "PERSONA_DIGEST_TOP_N";

/// Persona Digest - Rank the sections of a PDF collection for a persona and task
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank sections across the documents listed in an input JSON file
    Run {
        /// Input JSON: documents, persona and job to be done
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the digest
        #[arg(short, long)]
        output: PathBuf,

        /// Directory holding the PDFs (default: <input dir>/PDFs)
        #[arg(long)]
        pdf_dir: Option<PathBuf>,

        /// Extra TOML config file, applied over the platform and CWD configs
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of ranked sections to keep
        #[arg(long)]
        top_n: Option<usize>,

        /// Output format: json or markdown
        #[arg(long, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Verbose logging to stderr
        #[arg(long)]
        debug: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Extract and segment one PDF, printing every section found
    Inspect {
        /// Path to the PDF
        pdf: PathBuf,

        /// Extra TOML config file, applied over the platform and CWD configs
        #[arg(long)]
        config: Option<PathBuf>,

        /// Verbose logging to stderr
        #[arg(long)]
        debug: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            input,
            output,
            pdf_dir,
            config,
            top_n,
            format,
            debug,
            no_color,
        } => {
            init_tracing(debug);
            run(
                &input,
                &output,
                pdf_dir,
                config.as_deref(),
                top_n,
                format,
                ColorMode(!no_color),
            )
        }
        Command::Inspect {
            pdf,
            config,
            debug,
            no_color,
        } => {
            init_tracing(debug);
            inspect(&pdf, config.as_deref(), ColorMode(!no_color))
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `--debug`; the default is `warn`.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings for one invocation, resolved from every configuration source.
struct Settings {
    analysis: AnalysisConfig,
    backend: MupdfBackend,
}

/// Resolve configuration: CLI flags > env vars > config files > defaults.
fn resolve_settings(config_path: Option<&Path>, top_n: Option<usize>) -> anyhow::Result<Settings> {
    let file = config_file::load_config_with(config_path)?;
    let backend = MupdfBackend::from_config(file.extraction.as_ref())?;
    let mut builder = AnalysisConfigBuilder::from_config_file(&file)?;

    let env_top_n = match std::env::var(TOP_N_ENV) {
        Ok(value) => Some(
            value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("invalid {TOP_N_ENV} value {value:?}"))?,
        ),
        Err(_) => None,
    };
    if let Some(n) = top_n.or(env_top_n) {
        builder = builder.top_n(n);
    }

    Ok(Settings {
        analysis: builder.build()?,
        backend,
    })
}

fn run(
    input: &Path,
    output_path: &Path,
    pdf_dir: Option<PathBuf>,
    config_path: Option<&Path>,
    top_n: Option<usize>,
    format: ExportFormat,
    color: ColorMode,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let settings = resolve_settings(config_path, top_n)?;
    let spec = load_input(input)?;

    let pdf_dir = pdf_dir.unwrap_or_else(|| default_pdf_dir(input));
    if !pdf_dir.is_dir() {
        anyhow::bail!("PDF directory not found: {}", pdf_dir.display());
    }

    let sources: Vec<DocumentSource> = spec
        .resolve_paths(&pdf_dir)
        .into_iter()
        .map(|(name, title, path)| DocumentSource::new(name, title, path))
        .collect();

    let digest = DigestPipeline::new(settings.analysis).run_with_backend(
        &settings.backend,
        &sources,
        spec.role(),
        spec.task(),
    )?;

    let report = OutputJson::from_digest(&digest, Metadata::for_run(&spec));
    export_digest(&report, format, output_path)?;

    let mut stderr = std::io::stderr();
    output::print_run_summary(
        &mut stderr,
        &digest,
        sources.len(),
        output_path,
        started.elapsed(),
        color,
    )?;
    stderr.flush()?;
    Ok(())
}

fn inspect(pdf: &Path, config_path: Option<&Path>, color: ColorMode) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("PDF not found: {}", pdf.display());
    }
    let settings = resolve_settings(config_path, None)?;

    let pages = settings
        .backend
        .extract_pages(pdf)
        .with_context(|| format!("failed to extract {}", pdf.display()))?;
    let name = pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf.display().to_string());
    let document = Document::new(name, None, pages);
    let sections = SectionSegmenter::new(&settings.analysis).segment(&document);

    let mut stdout = std::io::stdout().lock();
    output::print_sections(&mut stdout, &document, &sections, color)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_format(args: &[&str]) -> Result<ExportFormat, clap::Error> {
        let base = ["persona-digest", "run", "-i", "input.json", "-o", "out.json"];
        let cli = Cli::try_parse_from(base.iter().chain(args))?;
        match cli.command {
            Command::Run { format, .. } => Ok(format),
            Command::Inspect { .. } => unreachable!("parsed a run command"),
        }
    }

    #[test]
    fn test_format_flag() {
        assert_eq!(run_format(&[]).unwrap(), ExportFormat::Json);
        assert_eq!(
            run_format(&["--format", "markdown"]).unwrap(),
            ExportFormat::Markdown
        );
        assert_eq!(run_format(&["--format", "md"]).unwrap(), ExportFormat::Markdown);
        assert!(run_format(&["--format", "csv"]).is_err());
    }
}
