//! Data models and structures
//!
//! Defines the thumbnail suggestion types exchanged with the browser and the
//! generation service, plus runtime configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One styled thumbnail suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionItem {
    /// Assigned during normalization, which never reads the model's own id.
    /// Read back from the browser so render requests keep their file name.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Solid color or gradient expression, interpreted only by the renderer.
    pub background: String,
    pub text_color: String,
    pub accent_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_elements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_bait: Option<String>,
}

impl SuggestionItem {
    /// Name of the first required field that is blank, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        [
            ("title", &self.title),
            ("background", &self.background),
            ("textColor", &self.text_color),
            ("accentColor", &self.accent_color),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Ordered batch of suggestions produced by one generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    #[serde(rename = "thumbnails", alias = "items")]
    pub items: Vec<SuggestionItem>,
}

/// Inputs for one generation. The credential is passed through explicitly and
/// never stored beyond the request.
#[derive(Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default, rename = "apiKey")]
    pub credential: String,
}

impl GenerationRequest {
    pub fn new(
        title: impl Into<String>,
        keywords: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            keywords: keywords.into(),
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("title", &self.title)
            .field("keywords", &self.keywords)
            .field("credential", &"<redacted>")
            .finish()
    }
}

// Configuration
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct Config {
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout: Duration,
    pub bind_addr: String,
    /// Only consulted by the CLI; the server takes credentials per request.
    pub gemini_api_key: Option<String>,
    /// Font file tried first when drawing card text (`CARD_FONT_PATH`).
    pub card_font_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let gemini_timeout = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    crate::Error::Config(format!(
                        "GEMINI_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_timeout,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            card_font_path: lookup("CARD_FONT_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_timeout", &self.gemini_timeout)
            .field("bind_addr", &self.bind_addr)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("card_font_path", &self.card_font_path)
            .finish()
    }
}
