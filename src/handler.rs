//! Request orchestration: validate, build the prompt, call the generation
//! service once, normalize.

use crate::ai::GenerationService;
use crate::models::{GenerationRequest, GenerationResponse};
use crate::{normalizer, prompts, Error, Result};
use serde::Serialize;

/// Credentials at or below this many characters are reported as likely invalid.
pub const MIN_PLAUSIBLE_CREDENTIAL_CHARS: usize = 20;

/// Best-effort classification of the caller's credential after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialAssessment {
    Plausible,
    LikelyInvalid,
}

impl CredentialAssessment {
    /// Surrounding whitespace does not count toward the length.
    pub fn assess(credential: &str) -> Self {
        if credential.trim().chars().count() > MIN_PLAUSIBLE_CREDENTIAL_CHARS {
            Self::Plausible
        } else {
            Self::LikelyInvalid
        }
    }

    pub fn is_plausible(self) -> bool {
        self == Self::Plausible
    }
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument { field });
    }
    Ok(trimmed)
}

/// Entry point for one thumbnail generation.
pub struct ThumbnailService {
    generator: Box<dyn GenerationService>,
}

impl ThumbnailService {
    pub fn new(generator: Box<dyn GenerationService>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let title = require("title", &request.title)?;
        let keywords = require("keywords", &request.keywords)?;
        let credential = require("apiKey", &request.credential)?;

        tracing::info!(title, keywords, "Generating thumbnails");
        let prompt = prompts::build_prompt(title, keywords);

        let raw = self
            .generator
            .generate(&prompt, credential)
            .await
            .map_err(|e| match e {
                Error::Upstream(details) => {
                    let assessment = CredentialAssessment::assess(credential);
                    tracing::error!(?assessment, "Thumbnail generation failed: {}", details);
                    Error::GenerationFailed {
                        details,
                        credential: assessment,
                    }
                }
                other => other,
            })?;

        tracing::debug!(bytes = raw.len(), "Received model output");
        normalizer::normalize(&raw, title, keywords)
    }
}
