//! Generation service integration
//!
//! Sends the built prompt to a hosted text-generation model and hands back the
//! raw completion text. The credential travels with every call; clients never
//! hold one.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiGenerationClient;
pub use mock::MockGenerationClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Performs exactly one outbound call and returns the model text verbatim.
    async fn generate(&self, prompt: &str, credential: &str) -> Result<String>;
}
