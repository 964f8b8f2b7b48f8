use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Generation, GenerationRequest, Generator, ServiceError};

/// A scripted generator for tests. Returns pre-defined results in
/// order and records every request it receives, so tests can assert
/// how many calls were made and with what.
pub struct MockGenerator {
    script: Vec<Result<Generation, ServiceError>>,
    index: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(script: Vec<Result<Generation, ServiceError>>) -> Self {
        Self {
            script,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: a script of plain text answers.
    pub fn answering(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|text| {
                    Ok(Generation {
                        text: text.to_string(),
                        usage: None,
                    })
                })
                .collect(),
        )
    }

    /// How many times `generate` was called.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());

        let i = self.index.fetch_add(1, Ordering::SeqCst);
        match self.script.get(i) {
            Some(result) => result.clone(),
            None => Err(ServiceError::Malformed(format!(
                "mock script exhausted (call {})",
                i + 1
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest {
            model: "test-model".to_string(),
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn returns_script_in_order() {
        let mock = MockGenerator::answering(&["first", "second"]);

        let a = mock.generate(&request("one")).await.unwrap();
        let b = mock.generate(&request("two")).await.unwrap();

        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
    }

    #[tokio::test]
    async fn records_requests() {
        let mock = MockGenerator::answering(&["ok"]);
        mock.generate(&request("hello")).await.unwrap();

        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.requests()[0].prompt, "hello");
        assert_eq!(mock.requests()[0].model, "test-model");
    }

    #[tokio::test]
    async fn scripted_failure_is_returned() {
        let mock = MockGenerator::new(vec![Err(ServiceError::Timeout)]);
        let err = mock.generate(&request("x")).await.unwrap_err();
        assert_eq!(err, ServiceError::Timeout);
    }

    #[tokio::test]
    async fn exhausted_script_is_an_error() {
        let mock = MockGenerator::answering(&[]);
        let err = mock.generate(&request("x")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
        // The call is still recorded.
        assert_eq!(mock.calls(), 1);
    }
}
