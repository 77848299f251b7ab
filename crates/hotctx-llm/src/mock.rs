//! Test-only deterministic embedding provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::EmbeddingProvider;

#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dim: usize,
    pub fail: bool,
    fixed: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(8)
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            fail: false,
            fixed: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Pin the vector returned for an exact input text.
    #[must_use]
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.lock().unwrap().insert(text.into(), vector);
        self
    }

    /// Number of `embed` calls served so far, including failed ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn derive(&self, text: &str) -> Vec<f32> {
        let len = self.dim.max(1);
        let mut v = vec![0.0f32; len];
        for (i, b) in text.bytes().enumerate() {
            v[i % len] += f32::from(b);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        if let Some(v) = self.fixed.lock().unwrap().get(text) {
            return Ok(v.clone());
        }
        Ok(self.derive(text))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_for_same_text() {
        let m = MockEmbedder::new(4);
        let a = m.embed("hello").await.unwrap();
        let b = m.embed("hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(m.calls(), 2);
    }

    #[tokio::test]
    async fn text_longer_than_dim_wraps_and_normalizes() {
        let m = MockEmbedder::new(3);
        let v = m.embed("a sentence much longer than three bytes").await.unwrap();
        assert_eq!(v.len(), 3);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn pinned_vector_wins() {
        let m = MockEmbedder::new(3).with_vector("q", vec![1.0, 0.0, 0.0]);
        assert_eq!(m.embed("q").await.unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn failing_mock_errors() {
        let m = MockEmbedder::failing();
        assert!(m.embed("x").await.is_err());
        assert_eq!(m.calls(), 1);
    }
}
