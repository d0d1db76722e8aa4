//! Shared test support: a scripted mock implementation of the media
//! service boundary with call recording for invariant assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use atelier_engine::models::{Artifact, Dimensions};
use atelier_engine::services::media::{
    MediaServices, NarrationResponse, ServiceError, ServiceResult,
};

/// Scripted mock of the three media service calls.
///
/// Replies are popped front-to-back per call; when a queue runs dry the
/// mock falls back to a benign default (a satisfied verdict, a plain
/// narration). Every call is recorded so tests can assert on ordering,
/// counts, and the exact references passed to the generator.
#[derive(Default)]
pub struct MockMediaServices {
    judge_replies: Mutex<VecDeque<String>>,
    narrate_replies: Mutex<VecDeque<ServiceResult<NarrationResponse>>>,
    fail_generate: Mutex<Option<ServiceError>>,

    pub generate_calls: AtomicUsize,
    pub judge_calls: AtomicUsize,
    pub narrate_calls: AtomicUsize,

    /// Reference artifact ids passed to each generate call
    pub generate_references: Mutex<Vec<Vec<String>>>,
    /// Dimensions passed to each generate call
    pub generate_dimensions: Mutex<Vec<Option<Dimensions>>>,
    /// Ids of artifacts produced by the generator, in order
    pub produced_ids: Mutex<Vec<String>>,
    /// Number of artifacts passed to each judge call
    pub judged_artifact_counts: Mutex<Vec<usize>>,
}

impl MockMediaServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue judge replies, consumed one per verification call.
    pub fn with_judge_replies<S: AsRef<str>>(self, replies: &[S]) -> Self {
        {
            let mut queue = self.judge_replies.lock().unwrap();
            queue.extend(replies.iter().map(|r| r.as_ref().to_string()));
        }
        self
    }

    /// Queue a successful narration reply.
    pub fn with_narrate_reply(self, response: NarrationResponse) -> Self {
        self.narrate_replies
            .lock()
            .unwrap()
            .push_back(Ok(response));
        self
    }

    /// Queue a narration transport failure.
    pub fn with_narrate_error(self, error: ServiceError) -> Self {
        self.narrate_replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Make every generate call fail with the given error.
    pub fn with_generate_error(self, error: ServiceError) -> Self {
        *self.fail_generate.lock().unwrap() = Some(error);
        self
    }

    pub fn generate_call_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn judge_call_count(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst)
    }

    pub fn narrate_call_count(&self) -> usize {
        self.narrate_calls.load(Ordering::SeqCst)
    }
}

/// An unsatisfied verdict reply naming one issue.
pub fn unsatisfied_reply(issue: &str, suggested: &str) -> String {
    format!(
        r#"{{"satisfied": false, "issues": ["{}"], "suggestedEdit": "{}"}}"#,
        issue, suggested
    )
}

/// A satisfied verdict reply.
pub fn satisfied_reply() -> String {
    r#"{"satisfied": true, "issues": [], "suggestedEdit": ""}"#.to_string()
}

/// A reference image artifact with known dimensions. The payload is not a
/// real image, so the dimensions are set directly.
pub fn reference_artifact(width: u32, height: u32) -> Artifact {
    let mut artifact = Artifact::image("image/png", "cmVmZXJlbmNl");
    artifact.dimensions = Some(Dimensions::new(width, height));
    artifact
}

#[async_trait]
impl MediaServices for MockMediaServices {
    async fn generate(
        &self,
        _prompt: &str,
        references: Option<&[Artifact]>,
        dimensions: Option<Dimensions>,
        _model: &str,
    ) -> ServiceResult<Artifact> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.fail_generate.lock().unwrap().clone() {
            return Err(error);
        }

        let reference_ids = references
            .map(|refs| refs.iter().map(|a| a.id.clone()).collect())
            .unwrap_or_default();
        self.generate_references.lock().unwrap().push(reference_ids);
        self.generate_dimensions.lock().unwrap().push(dimensions);

        let artifact = Artifact::image("image/png", "Z2VuZXJhdGVk");
        self.produced_ids.lock().unwrap().push(artifact.id.clone());
        Ok(artifact)
    }

    async fn judge(
        &self,
        artifacts: &[Artifact],
        _instruction: &str,
        _model: &str,
    ) -> ServiceResult<String> {
        self.judge_calls.fetch_add(1, Ordering::SeqCst);
        self.judged_artifact_counts
            .lock()
            .unwrap()
            .push(artifacts.len());

        let reply = self.judge_replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or_else(satisfied_reply))
    }

    async fn narrate(
        &self,
        _system_instruction: &str,
        _user_context: &str,
        _references: Option<&[Artifact]>,
        _model: &str,
    ) -> ServiceResult<NarrationResponse> {
        self.narrate_calls.fetch_add(1, Ordering::SeqCst);

        let reply = self.narrate_replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Ok(NarrationResponse::text("a plain narration")))
    }
}
