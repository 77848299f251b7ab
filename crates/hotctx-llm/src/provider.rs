use std::future::Future;

use crate::error::LlmError;

/// A service that turns text into a fixed-dimension vector.
///
/// Implementations perform exactly one backend call per invocation and never cache.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into a vector.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a response
    /// body that matches none of the known shapes.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn name(&self) -> &str;
}
