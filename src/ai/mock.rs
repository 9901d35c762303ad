use super::GenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Failure {
    Upstream(String),
    Internal(String),
}

/// Scripted generation client that records every call it receives.
pub struct MockGenerationClient {
    responses: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<Failure>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    credentials: Arc<Mutex<Vec<String>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(Mutex::new(None)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            credentials: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    /// Every call fails with `Error::Upstream(details)`.
    pub fn with_failure(self, details: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(Failure::Upstream(details.into()));
        self
    }

    /// Every call fails with `Error::Invariant(details)`, an error that is not
    /// the provider's.
    pub fn with_internal_failure(self, details: impl Into<String>) -> Self {
        *self.failure.lock().unwrap() = Some(Failure::Internal(details.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn credentials(&self) -> Vec<String> {
        self.credentials.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockGenerationClient {
    /// Clones share the same script and call log.
    fn clone(&self) -> Self {
        Self {
            responses: Arc::clone(&self.responses),
            failure: Arc::clone(&self.failure),
            prompts: Arc::clone(&self.prompts),
            credentials: Arc::clone(&self.credentials),
        }
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        self.credentials.lock().unwrap().push(credential.to_string());

        match self.failure.lock().unwrap().clone() {
            Some(Failure::Upstream(details)) => return Err(Error::Upstream(details)),
            Some(Failure::Internal(details)) => return Err(Error::Invariant(details)),
            None => {}
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response
            Ok(r##"{"thumbnails":[{"title":"Mock","background":"#000000","textColor":"#ffffff","accentColor":"#ff0000"}]}"##.to_string())
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response_is_json() {
        let client = MockGenerationClient::new();
        let text = client.generate("p", "k").await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["thumbnails"][0]["title"], "Mock");
    }

    #[tokio::test]
    async fn test_mock_custom_responses_cycle() {
        let client = MockGenerationClient::new()
            .with_response("first")
            .with_response("second");

        assert_eq!(client.generate("p", "k").await.unwrap(), "first");
        assert_eq!(client.generate("p", "k").await.unwrap(), "second");
        assert_eq!(client.generate("p", "k").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let client = MockGenerationClient::new();
        let spy = client.clone();
        assert_eq!(spy.get_call_count(), 0);

        client.generate("prompt-a", "key-a").await.unwrap();
        assert_eq!(spy.get_call_count(), 1);
        assert_eq!(spy.prompts(), vec!["prompt-a".to_string()]);
        assert_eq!(spy.credentials(), vec!["key-a".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockGenerationClient::new().with_failure("quota exceeded");
        let err = client.generate("p", "k").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref d) if d == "quota exceeded"));
        assert_eq!(client.get_call_count(), 1);
    }
}
