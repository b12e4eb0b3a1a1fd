use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use zhconv::{zhconv, Variant};

use crate::core::error::{StudioError, StudioResult};
use crate::core::state::{CardContent, LayoutVariant, NarrativeStyle, SERIES_LEN};
use crate::services::llm::{
    Content, GenerateContentRequest, GenerationConfig, GenerativeBackend, Part,
};
use crate::utils::data_url::InlineImage;
use crate::utils::text::strip_code_blocks;

const SYSTEM_INSTRUCTION_HEAD: &str = "\
你是一位顶尖的视觉叙事专家。你的任务是将用户的输入拆解为一个“三部曲”系列的视觉海报（起始、展开、终章）。
输出必须是 JSON 格式。

逻辑要求：
1. 分解叙事：将内容逻辑地分为三个阶段：起始 (setup)、展开 (development)、终章 (resolution)。
2. 布局多样化：为每张卡片从以下布局中选择最合适的：";

const SYSTEM_INSTRUCTION_TAIL: &str = "。
3. 内容：使用简体中文。标题必须是单行、简短有力，不得包含换行；正文要富有文学感。quote 布局的 body 只包含一句金句。
4. 颜色：提供一个适合该主题的六位十六进制主题色 (themeColor)，例如 #1a2b3c。
5. 背景：为每张卡片给出 imagePrompt（英文画面描述，不出现文字），并用 isDarkBackground 标明该画面整体是否偏暗。

JSON 结构：
{
  \"themeColor\": \"#xxxxxx\",
  \"cards\": [
    { \"title\": \"...\", \"subtitle\": \"...\", \"body\": [\"...\", \"...\"], \"layout\": \"hero\", \"imagePrompt\": \"...\", \"accentText\": \"...\", \"isDarkBackground\": true },
    { \"title\": \"...\", \"subtitle\": \"...\", \"body\": [\"...\", \"...\"], \"layout\": \"story\", \"imagePrompt\": \"...\", \"accentText\": \"...\", \"isDarkBackground\": false },
    { \"title\": \"...\", \"subtitle\": \"...\", \"body\": [\"...\"], \"layout\": \"quote\", \"imagePrompt\": \"...\", \"accentText\": \"...\", \"isDarkBackground\": true }
  ]
}";

/// Result of the single content call: three cards and the run's palette.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesContent {
    pub cards: Vec<CardContent>,
    pub theme_color: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeriesContent {
    theme_color: String,
    cards: Vec<CardContent>,
}

/// Content Generation Adapter: one structured request, strictly validated.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
}

impl ContentGenerator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub async fn generate(
        &self,
        user_input: &str,
        style: NarrativeStyle,
        image: Option<&InlineImage>,
    ) -> StudioResult<SeriesContent> {
        let request = build_request(user_input, style, image);
        let response = self.backend.generate_content(&self.model, &request).await?;

        let text = response.text().ok_or_else(|| {
            StudioError::schema(format!(
                "content response has no text (finish reason: {})",
                response.finish_reason()
            ))
        })?;

        parse_series_content(&text)
    }
}

pub fn build_request(
    user_input: &str,
    style: NarrativeStyle,
    image: Option<&InlineImage>,
) -> GenerateContentRequest {
    let prompt = format!("输入：{}。风格：{}。请创作三部曲内容。", user_input.trim(), style);

    let mut parts = vec![Part::text(prompt)];
    if let Some(img) = image {
        parts.push(Part::inline(img.mime_type.clone(), img.data.clone()));
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        system_instruction: Some(Content {
            role: None,
            parts: vec![Part::text(system_instruction())],
        }),
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(response_schema()),
            ..Default::default()
        }),
    }
}

/// The layout menu lists only the variants the backend may pick.
pub fn system_instruction() -> String {
    let menu: Vec<String> = LayoutVariant::GENERATED
        .iter()
        .map(|l| format!("{} ({})", l.as_str(), layout_hint(*l)))
        .collect();
    format!("{}{}{}", SYSTEM_INSTRUCTION_HEAD, menu.join(", "), SYSTEM_INSTRUCTION_TAIL)
}

fn layout_hint(layout: LayoutVariant) -> &'static str {
    match layout {
        LayoutVariant::Hero => "大标题优先",
        LayoutVariant::Story => "正文优先",
        LayoutVariant::Split => "图文对比",
        LayoutVariant::Quote => "金句优先",
        LayoutVariant::List => "要点列表",
    }
}

/// Structured output schema sent with every content request.
pub fn response_schema() -> serde_json::Value {
    let layouts: Vec<&str> = LayoutVariant::ALL.iter().map(|l| l.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "themeColor": { "type": "STRING" },
            "cards": {
                "type": "ARRAY",
                "minItems": SERIES_LEN,
                "maxItems": SERIES_LEN,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "subtitle": { "type": "STRING" },
                        "body": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "layout": { "type": "STRING", "enum": layouts },
                        "imagePrompt": { "type": "STRING" },
                        "accentText": { "type": "STRING" },
                        "isDarkBackground": { "type": "BOOLEAN" }
                    },
                    "required": ["title", "subtitle", "body", "layout", "imagePrompt"]
                }
            }
        },
        "required": ["themeColor", "cards"]
    })
}

/// Parses and validates the backend's JSON. Anything off-contract is rejected whole.
pub fn parse_series_content(response: &str) -> StudioResult<SeriesContent> {
    let clean_json = strip_code_blocks(response);
    let raw: RawSeriesContent = serde_json::from_str(&clean_json)
        .map_err(|e| StudioError::schema(format!("{}: {}", e, clean_json)))?;

    if raw.cards.len() != SERIES_LEN {
        return Err(StudioError::schema(format!(
            "expected {} cards, got {}",
            SERIES_LEN,
            raw.cards.len()
        )));
    }
    if !is_hex_color(&raw.theme_color) {
        return Err(StudioError::schema(format!(
            "themeColor is not a 6-digit hex colour: {:?}",
            raw.theme_color
        )));
    }

    let mut cards = Vec::with_capacity(SERIES_LEN);
    for (i, card) in raw.cards.into_iter().enumerate() {
        validate_card(i, &card)?;
        cards.push(normalize_card(card));
    }

    Ok(SeriesContent {
        cards,
        theme_color: raw.theme_color.to_ascii_lowercase(),
    })
}

fn validate_card(index: usize, card: &CardContent) -> StudioResult<()> {
    if card.title.trim().is_empty() {
        return Err(StudioError::schema(format!("card {} has an empty title", index)));
    }
    if card.title.contains('\n') || card.title.contains('\r') {
        return Err(StudioError::schema(format!(
            "card {} title contains a line break",
            index
        )));
    }
    if card.body.is_empty() {
        return Err(StudioError::schema(format!("card {} has an empty body", index)));
    }
    Ok(())
}

fn normalize_card(card: CardContent) -> CardContent {
    let to_hans = |s: &str| zhconv(s.trim(), Variant::ZhHans);
    CardContent {
        title: to_hans(card.title.as_str()),
        subtitle: to_hans(card.subtitle.as_str()),
        body: card.body.iter().map(|p| to_hans(p.as_str())).collect(),
        accent_text: card
            .accent_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(to_hans),
        ..card
    }
}

pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
