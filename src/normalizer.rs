//! Response normalization
//!
//! Model output is free text that usually, but not always, contains the JSON
//! batch we asked for. Normalization runs an ordered chain of parse strategies
//! and substitutes a fixed fallback batch when none of them yields items, so
//! callers always receive something renderable.

use crate::models::{GenerationResponse, SuggestionItem};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Titles longer than this many characters are shortened in the fallback batch.
pub const FALLBACK_TITLE_MAX_CHARS: usize = 8;
pub const ELLIPSIS: &str = "..";
/// Used when the keywords have no usable first token.
pub const DEFAULT_KEYWORD: &str = "트렌드";

/// Result of one parse strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(Vec<SuggestionItem>),
    /// The text contains no `{ ... }` span to try.
    NoJsonObject,
    /// Candidate text is not a batch of well-formed items.
    Invalid(String),
    /// Parsed fine but carried no items.
    Empty,
}

/// Where the final items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    EmbeddedObject,
    WholeText,
    Fallback,
}

/// Greedy outermost-brace span: first `{` through last `}`.
pub fn extract_braced(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// One item as the model writes it. Any `id` it sends is ignored, and every
/// field takes whatever JSON the model chose and is flattened to text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelItem {
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    subtitle: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    background: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    text_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    accent_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    visual_elements: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    emotion: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    click_bait: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelBatch {
    #[serde(rename = "thumbnails", alias = "items")]
    items: Vec<ModelItem>,
}

impl From<ModelItem> for SuggestionItem {
    fn from(item: ModelItem) -> Self {
        SuggestionItem {
            id: String::new(),
            title: item.title.unwrap_or_default(),
            subtitle: item.subtitle,
            background: item.background.unwrap_or_default(),
            text_color: item.text_color.unwrap_or_default(),
            accent_color: item.accent_color.unwrap_or_default(),
            visual_elements: item.visual_elements,
            emotion: item.emotion,
            click_bait: item.click_bait,
        }
    }
}

/// Text form of an arbitrary JSON value: strings as-is, scalars printed,
/// arrays joined with `, `, objects as compact JSON. `null` and empty arrays
/// carry no text.
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(json_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| json_text(&value))
}

fn parse_batch(candidate: &str) -> ParseOutcome {
    let batch: ModelBatch = match serde_json::from_str(candidate) {
        Ok(batch) => batch,
        Err(e) => return ParseOutcome::Invalid(e.to_string()),
    };

    if batch.items.is_empty() {
        return ParseOutcome::Empty;
    }

    let items: Vec<SuggestionItem> = batch.items.into_iter().map(SuggestionItem::from).collect();
    let blank = items.iter().enumerate().find_map(|(index, item)| {
        item.missing_required_field()
            .map(|field| format!("item {} has a blank {}", index + 1, field))
    });
    match blank {
        Some(reason) => ParseOutcome::Invalid(reason),
        None => ParseOutcome::Parsed(items),
    }
}

/// Strategy 1: parse the outermost braced span embedded in surrounding prose.
pub fn parse_embedded_object(raw: &str) -> ParseOutcome {
    match extract_braced(raw) {
        Some(candidate) => parse_batch(candidate),
        None => ParseOutcome::NoJsonObject,
    }
}

/// Strategy 2: parse the whole trimmed text.
pub fn parse_whole_text(raw: &str) -> ParseOutcome {
    parse_batch(raw.trim())
}

fn short_title(title: &str) -> String {
    let title = title.trim();
    if title.chars().count() > FALLBACK_TITLE_MAX_CHARS {
        let prefix: String = title.chars().take(FALLBACK_TITLE_MAX_CHARS).collect();
        format!("{}{}", prefix, ELLIPSIS)
    } else {
        title.to_string()
    }
}

fn first_keyword(keywords: &str) -> String {
    keywords
        .split(',')
        .next()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(DEFAULT_KEYWORD)
        .to_string()
}

fn fallback_item(
    title: String,
    subtitle: String,
    background: &str,
    text_color: &str,
    accent_color: &str,
    notes: [&str; 3],
) -> SuggestionItem {
    let [visual_elements, emotion, click_bait] = notes;
    SuggestionItem {
        id: String::new(),
        title,
        subtitle: Some(subtitle),
        background: background.to_string(),
        text_color: text_color.to_string(),
        accent_color: accent_color.to_string(),
        visual_elements: Some(visual_elements.to_string()),
        emotion: Some(emotion.to_string()),
        click_bait: Some(click_bait.to_string()),
    }
}

/// The fixed batch used when the model output cannot be parsed.
pub fn fallback_items(title: &str, keywords: &str) -> Vec<SuggestionItem> {
    let short_title = short_title(title);
    let keyword = first_keyword(keywords);

    vec![
        fallback_item(
            format!("충격! {}", short_title),
            "99% 몰랐던 비밀".to_string(),
            "#ff1744",
            "#ffffff",
            "#ffff00",
            ["강렬한 빨간 배경에 노란 강조 요소", "충격과 호기심", "숫자와 비율로 신뢰성 어필"],
        ),
        fallback_item(
            "대박 실화냐".to_string(),
            format!("{} 진실", keyword),
            "linear-gradient(45deg, #667eea 0%, #764ba2 100%)",
            "#ffffff",
            "#00ff88",
            ["보라-파랑 그라데이션 배경", "놀라움과 의심", "실화 여부 확인 욕구 자극"],
        ),
        fallback_item(
            "지금 핫한".to_string(),
            format!("{} 정보", keyword),
            "#ffc107",
            "#000000",
            "#dc3545",
            ["밝은 노란 배경, 빨간 포인트", "FOMO (놓칠까봐 하는 불안)", "시급함과 트렌드 강조"],
        ),
        fallback_item(
            "완벽 정리".to_string(),
            "한번에 끝내기".to_string(),
            "#f8f9fa",
            "#212529",
            "#007bff",
            ["깔끔한 회색 배경, 파란 포인트", "완성도와 효율성", "한번에 해결 가능함 어필"],
        ),
        fallback_item(
            "프로 비밀".to_string(),
            format!("{} 노하우", keyword),
            "#1a1a1a",
            "#ffffff",
            "#ffd700",
            ["검은 배경에 금색 강조", "전문성과 특별함", "전문가만 아는 비밀 정보"],
        ),
    ]
}

/// Run the parse chain, falling back to the fixed batch.
pub fn select_items(raw: &str, title: &str, keywords: &str) -> (BatchSource, Vec<SuggestionItem>) {
    let strategies: [(BatchSource, fn(&str) -> ParseOutcome); 2] = [
        (BatchSource::EmbeddedObject, parse_embedded_object),
        (BatchSource::WholeText, parse_whole_text),
    ];

    for (source, strategy) in strategies {
        match strategy(raw) {
            ParseOutcome::Parsed(items) => return (source, items),
            outcome => tracing::debug!(?source, ?outcome, "Parse strategy did not yield items"),
        }
    }

    tracing::warn!("Model output was not a usable thumbnail batch, using fallback");
    (BatchSource::Fallback, fallback_items(title, keywords))
}

/// Check the batch invariants: non-empty, required fields present.
pub fn validate(response: &GenerationResponse) -> Result<()> {
    if response.items.is_empty() {
        return Err(Error::MalformedResponse("batch has no items".to_string()));
    }

    for item in &response.items {
        if let Some(field) = item.missing_required_field() {
            return Err(Error::MalformedResponse(format!(
                "{} has a blank {}",
                item.id, field
            )));
        }
    }

    Ok(())
}

/// Turn raw model text into a validated batch with sequential ids.
pub fn normalize(raw: &str, title: &str, keywords: &str) -> Result<GenerationResponse> {
    let (source, mut items) = select_items(raw, title, keywords);

    for (index, item) in items.iter_mut().enumerate() {
        item.id = format!("thumbnail-{}", index + 1);
    }

    let response = GenerationResponse { items };
    validate(&response)?;

    tracing::info!(?source, count = response.items.len(), "Normalized thumbnail batch");
    Ok(response)
}
