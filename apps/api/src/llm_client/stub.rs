//! Canned-response generator for network-free tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{GenerationOptions, ProviderError, TextGenerator};
use crate::credentials::Credential;

#[derive(Debug, Clone)]
pub enum StubReply {
    Text(String),
    Fail(String),
    Unauthorized,
    /// Sleeps (tokio time, so paused clocks auto-advance) then answers.
    Delayed(Duration, String),
}

impl StubReply {
    pub fn text(s: impl Into<String>) -> Self {
        StubReply::Text(s.into())
    }
}

enum Mode {
    /// Replies handed out in call order; the last one repeats.
    Sequence(Mutex<VecDeque<StubReply>>),
    /// First entry whose marker appears in the prompt answers.
    Routed(Vec<(String, StubReply)>),
}

pub struct StubGenerator {
    mode: Mode,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn sequence(replies: Vec<StubReply>) -> Self {
        Self::with_mode(Mode::Sequence(Mutex::new(replies.into())))
    }

    pub fn always(reply: StubReply) -> Self {
        Self::sequence(vec![reply])
    }

    pub fn routed(routes: Vec<(&str, StubReply)>) -> Self {
        Self::with_mode(Mode::Routed(
            routes
                .into_iter()
                .map(|(marker, reply)| (marker.to_string(), reply))
                .collect(),
        ))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_reply(&self, prompt: &str) -> StubReply {
        match &self.mode {
            Mode::Sequence(queue) => {
                let mut queue = queue.lock().unwrap();
                if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue
                        .front()
                        .cloned()
                        .unwrap_or_else(|| StubReply::Fail("stub exhausted".to_string()))
                }
            }
            Mode::Routed(routes) => routes
                .iter()
                .find(|(marker, _)| prompt.contains(marker.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| StubReply::Fail(format!("no stub route for prompt: {prompt}"))),
        }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
        _credential: &Credential,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match self.next_reply(prompt) {
            StubReply::Text(text) => Ok(text),
            StubReply::Fail(message) => Err(ProviderError::Other(message)),
            StubReply::Unauthorized => Err(ProviderError::Unauthorized("invalid x-api-key".to_string())),
            StubReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }
}
