//! Lease-analysis pipeline: extract text from an uploaded PDF, analyze it in
//! bounded chunks, then merge the chunk analyses into a final summary and a
//! potential-issues review.

pub mod chunker;
pub mod prompts;

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::llm::{CompletionGateway, LlmError};
use chunker::{split_into_chunks, DEFAULT_MAX_TOKENS};

/// Final artifact returned to the caller: two free-text blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseAnalysis {
    pub summary: String,
    pub issues: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("failed to extract text from document: {0}")]
    Extraction(String),
    #[error("document contained no extractable text")]
    EmptyDocument,
    #[error(transparent)]
    Completion(#[from] LlmError),
    #[error("failed to stage uploaded document: {0}")]
    Io(#[from] std::io::Error),
}

/// Orchestrates one lease-analysis request.
///
/// Chunk failures are tolerated (a placeholder is substituted); failure of
/// either global summarization call fails the whole request. Completion calls
/// are issued one at a time.
pub struct LeaseAnalyzer {
    gateway: Arc<dyn CompletionGateway>,
    max_tokens: usize,
}

impl LeaseAnalyzer {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self::with_chunk_budget(gateway, DEFAULT_MAX_TOKENS)
    }

    pub fn with_chunk_budget(gateway: Arc<dyn CompletionGateway>, max_tokens: usize) -> Self {
        Self { gateway, max_tokens }
    }

    /// Process a raw uploaded file: stage it in a uniquely named temp file,
    /// extract its text, and run the analysis pipeline.
    ///
    /// The temp file is removed on every exit path, success or failure.
    pub async fn process_upload(&self, bytes: &[u8]) -> Result<LeaseAnalysis, AnalysisError> {
        let mut staged = NamedTempFile::new()?;
        staged.write_all(bytes)?;
        staged.flush()?;

        let text = pdf_extract::extract_text(staged.path())
            .map_err(|err| AnalysisError::Extraction(err.to_string()))?;
        debug!(chars = text.len(), "extracted document text");

        self.analyze_text(&text).await
    }

    /// Run chunk analysis and global summarization over already-extracted
    /// text. Rejects documents with no extractable text before any
    /// completion call is made.
    pub async fn analyze_text(&self, text: &str) -> Result<LeaseAnalysis, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }

        let chunks = split_into_chunks(text, self.max_tokens);
        info!(chunks = chunks.len(), "analyzing document");

        let mut analyses = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            analyses.push(self.analyze_chunk(chunk, index).await);
        }

        self.summarize(&analyses).await
    }

    /// Analyze one chunk. A failed call is swallowed and replaced with a
    /// placeholder so the pipeline always produces one analysis per chunk.
    async fn analyze_chunk(&self, chunk: &str, index: usize) -> String {
        let prompt = prompts::chunk_analysis(chunk, index);
        match self.gateway.complete(&prompt, None).await {
            Ok(analysis) => analysis,
            Err(err) => {
                warn!(chunk = index + 1, %err, "chunk analysis failed; substituting placeholder");
                format!("Analysis failed for chunk {}", index + 1)
            }
        }
    }

    /// Merge chunk analyses with two sequential completion calls: the overall
    /// summary first, then the issues review. Either failure fails the whole
    /// operation; no partial result is returned.
    async fn summarize(&self, analyses: &[String]) -> Result<LeaseAnalysis, AnalysisError> {
        let combined = analyses.join(prompts::ANALYSIS_SEPARATOR);

        let summary = self
            .gateway
            .complete(&prompts::global_summary(&combined), None)
            .await?;
        let issues = self
            .gateway
            .complete(&prompts::issue_review(&combined), None)
            .await?;

        Ok(LeaseAnalysis { summary, issues })
    }
}
