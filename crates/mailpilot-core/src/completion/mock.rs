use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CompletionError, CompletionProvider};

/// Queue-backed test double for [`CompletionProvider`]. Responses are returned
/// in enqueue order; an empty queue is an error so tests fail loudly when a
/// call was not expected.
#[derive(Debug, Default, Clone)]
pub struct MockCompletionClient {
    responses: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, response: Result<String, CompletionError>) {
        let mut guard = self.responses.lock().expect("lock responses");
        guard.push_back(response);
    }

    /// Number of times `complete` has been called. Sentinel short-circuits do
    /// not count.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock prompts").clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("lock prompts")
            .push(prompt.to_string());
        let mut guard = self.responses.lock().expect("lock responses");
        guard.pop_front().unwrap_or_else(|| {
            Err(CompletionError::Provider {
                message: "mock response not provided".to_string(),
            })
        })
    }
}
