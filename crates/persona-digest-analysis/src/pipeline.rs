use std::path::PathBuf;

use rayon::prelude::*;

use persona_digest_core::{Digest, Document, ExtractionFailure, PageExtractor, Section};

use crate::AnalysisError;
use crate::config::{AnalysisConfig, AnalysisConfigBuilder};
use crate::query::QueryBuilder;
use crate::ranking::RelevanceRanker;
use crate::refine::SubsectionRefiner;
use crate::segment::SectionSegmenter;
use crate::tfidf::{TermCounts, TfIdfModel, term_counts};

/// A document to load: its output identifier, optional title and file path.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    pub name: String,
    pub title: Option<String>,
    pub path: PathBuf,
}

impl DocumentSource {
    pub fn new(name: impl Into<String>, title: Option<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            title,
            path: path.into(),
        }
    }
}

/// Runs segmentation, ranking and refinement over one batch of documents.
///
/// Stages run strictly in order. Extraction and segmentation fan out per
/// document and join before the run's TF-IDF model is fit; the model is then
/// shared by the ranker and the refiner and dropped with the run.
#[derive(Debug, Clone, Default)]
pub struct DigestPipeline {
    config: AnalysisConfig,
}

impl DigestPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Validate a builder's settings before any document is touched.
    pub fn from_builder(builder: AnalysisConfigBuilder) -> Result<Self, AnalysisError> {
        Ok(Self::new(builder.build()?))
    }

    /// Extract every source with `backend`, then run the digest.
    ///
    /// A source that fails to extract is logged and skipped.
    pub fn run_with_backend(
        &self,
        backend: &dyn PageExtractor,
        sources: &[DocumentSource],
        role: &str,
        task: &str,
    ) -> Result<Digest, AnalysisError> {
        let extracted: Vec<Result<Document, ExtractionFailure>> = sources
            .par_iter()
            .map(|source| {
                backend
                    .extract_pages(&source.path)
                    .map(|pages| Document::new(&source.name, source.title.clone(), pages))
                    .map_err(|e| ExtractionFailure {
                        document: source.name.clone(),
                        source: e,
                    })
            })
            .collect();
        self.run(extracted, role, task)
    }

    /// Run the digest over already-extracted documents.
    ///
    /// Failed documents count as zero-page documents. The run fails with
    /// [`AnalysisError::NoInputData`] only when no document was extracted.
    pub fn run(
        &self,
        extracted: Vec<Result<Document, ExtractionFailure>>,
        role: &str,
        task: &str,
    ) -> Result<Digest, AnalysisError> {
        let attempted = extracted.len();
        let mut documents = Vec::with_capacity(attempted);
        let mut failed_documents = Vec::new();

        for result in extracted {
            match result {
                Ok(document) => documents.push(document),
                Err(failure) => {
                    tracing::warn!(
                        document = %failure.document,
                        kind = failure.kind(),
                        error = %failure.source,
                        "skipping document that failed extraction"
                    );
                    failed_documents.push(failure.document.clone());
                    documents.push(Document::empty(failure.document, None));
                }
            }
        }

        if failed_documents.len() == attempted {
            return Err(AnalysisError::NoInputData { attempted });
        }

        let sections = self.segment_all(&documents);
        let query = QueryBuilder::new(&self.config).build(role, task);
        let model = self.fit_model(&sections, query.terms());

        let ranked = RelevanceRanker::new(&self.config).rank(&sections, &query, &model);
        let query_vector = model.query_vector(&query);
        let passages = SubsectionRefiner::new(&self.config).refine_all(&ranked, &query_vector, &model);

        tracing::info!(
            documents = documents.len(),
            failed = failed_documents.len(),
            sections = sections.len(),
            ranked = ranked.len(),
            "digest complete"
        );

        Ok(Digest {
            sections: ranked,
            passages,
            total_sections: sections.len(),
            failed_documents,
        })
    }

    /// Segment every document in parallel and join the results.
    ///
    /// Output keeps document order, and section order within each document.
    /// This is the barrier before the corpus-wide model is fit.
    pub fn segment_all(&self, documents: &[Document]) -> Vec<Section> {
        let segmenter = SectionSegmenter::new(&self.config);
        let per_document: Vec<Vec<Section>> = documents
            .par_iter()
            .map(|document| segmenter.segment(document))
            .collect();
        per_document.into_iter().flatten().collect()
    }

    fn fit_model(&self, sections: &[Section], query_terms: &TermCounts) -> TfIdfModel {
        let mut corpus: Vec<TermCounts> = sections
            .par_iter()
            .map(|section| term_counts(&section.body, self.config.bigrams))
            .collect();
        corpus.push(query_terms.clone());
        TfIdfModel::fit(&corpus, self.config.max_features, self.config.bigrams)
    }
}
