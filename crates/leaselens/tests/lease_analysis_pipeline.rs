use async_trait::async_trait;
use leaselens::analysis::{AnalysisError, LeaseAnalyzer};
use leaselens::llm::{CompletionGateway, LlmError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Completion stub that records every prompt and can fail one call by its
/// 1-based position in the sequence.
struct ScriptedGateway {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_on: Option<usize>,
}

impl ScriptedGateway {
    fn new(fail_on: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_on,
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str, _model: Option<&str>) -> Result<String, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        if self.fail_on == Some(call) {
            return Err(LlmError::ExhaustedRetries {
                attempts: 3,
                last_error: "rate limited (429)".to_string(),
            });
        }
        Ok(format!("analysis {call}"))
    }
}

#[tokio::test]
async fn short_document_makes_one_chunk_call_plus_two_summary_calls() {
    let gateway = ScriptedGateway::new(None);
    let analyzer = LeaseAnalyzer::new(gateway.clone());

    let text = "lease ".repeat(2_000);
    let analysis = analyzer.analyze_text(&text).await.expect("analysis succeeds");

    assert_eq!(gateway.call_count(), 3);
    assert_eq!(analysis.summary, "analysis 2");
    assert_eq!(analysis.issues, "analysis 3");
}

#[tokio::test]
async fn long_document_is_analyzed_chunk_by_chunk() {
    let gateway = ScriptedGateway::new(None);
    let analyzer = LeaseAnalyzer::with_chunk_budget(gateway.clone(), 10);

    // 100 chars against a 40-char window: three chunks, then two merge calls.
    let text = "a".repeat(100);
    analyzer.analyze_text(&text).await.expect("analysis succeeds");

    assert_eq!(gateway.call_count(), 5);
    let prompts = gateway.prompts();
    assert!(prompts[0].contains("(Part 1)"));
    assert!(prompts[1].contains("(Part 2)"));
    assert!(prompts[2].contains("(Part 3)"));
}

#[tokio::test]
async fn failed_chunk_is_replaced_with_a_placeholder() {
    let gateway = ScriptedGateway::new(Some(1));
    let analyzer = LeaseAnalyzer::with_chunk_budget(gateway.clone(), 10);

    let text = "b".repeat(80);
    let analysis = analyzer.analyze_text(&text).await.expect("pipeline tolerates chunk failure");

    // Two chunks plus two merge calls; the merge prompts carry the placeholder.
    assert_eq!(gateway.call_count(), 4);
    let prompts = gateway.prompts();
    assert!(prompts[2].contains("Analysis failed for chunk 1"));
    assert!(prompts[3].contains("Analysis failed for chunk 1"));
    assert_eq!(analysis.summary, "analysis 3");
}

#[tokio::test]
async fn failed_summary_call_fails_the_whole_analysis() {
    let gateway = ScriptedGateway::new(Some(2));
    let analyzer = LeaseAnalyzer::new(gateway.clone());

    let err = analyzer
        .analyze_text("a short lease")
        .await
        .expect_err("summary failure propagates");

    assert!(matches!(err, AnalysisError::Completion(_)));
    assert_eq!(gateway.call_count(), 2);
}

#[tokio::test]
async fn failed_issue_review_fails_the_whole_analysis() {
    let gateway = ScriptedGateway::new(Some(3));
    let analyzer = LeaseAnalyzer::new(gateway.clone());

    let err = analyzer
        .analyze_text("a short lease")
        .await
        .expect_err("issue review failure propagates");

    assert!(matches!(err, AnalysisError::Completion(_)));
    assert_eq!(gateway.call_count(), 3);
}

#[tokio::test]
async fn blank_documents_are_rejected_before_any_completion_call() {
    let gateway = ScriptedGateway::new(None);
    let analyzer = LeaseAnalyzer::new(gateway.clone());

    let err = analyzer
        .analyze_text("   \n\t  ")
        .await
        .expect_err("blank text rejected");

    assert!(matches!(err, AnalysisError::EmptyDocument));
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn unreadable_uploads_are_rejected_before_any_completion_call() {
    let gateway = ScriptedGateway::new(None);
    let analyzer = LeaseAnalyzer::new(gateway.clone());

    let err = analyzer
        .process_upload(b"this is not a pdf")
        .await
        .expect_err("extraction fails");

    assert!(matches!(err, AnalysisError::Extraction(_)));
    assert_eq!(gateway.call_count(), 0);
}
