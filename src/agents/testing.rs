// Test doubles for LlmGateway.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::gateway::{CompletionRequest, LlmError, LlmGateway};

/// Replays canned replies in order, failing once the script runs out.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Transport("connection refused".to_string())))
    }
}

/// Answers each request through a closure, so concurrent callers can be
/// told apart by their prompt.
pub struct FnGateway<F> {
    respond: F,
    calls: AtomicUsize,
}

impl<F> FnGateway<F>
where
    F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> LlmGateway for FnGateway<F>
where
    F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync,
{
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(request)
    }
}

/// Replies by task: a valid prediction, then fixed generated texts.
pub fn happy_path(request: &CompletionRequest) -> Result<String, LlmError> {
    if request.system.contains("JSON") {
        Ok(r#"{"predicted_stars": 5, "explanation": "The reviewer is delighted."}"#.to_string())
    } else if request.system.contains("summaries") {
        Ok("Guest loved the food and the attentive service.".to_string())
    } else if request.system.contains("action items") {
        Ok("- Thank the kitchen team\n- Keep service staffing steady".to_string())
    } else {
        Ok("Thank you so much for the kind words about our food and service!".to_string())
    }
}
