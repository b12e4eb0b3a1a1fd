use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use serde_json::json;

use articly::core::config::GeminiConfig;
use articly::core::error::{StudioError, StudioResult};
use articly::core::io::NativeStorage;
use articly::core::state::{LayoutVariant, NarrativeStyle, Phase};
use articly::render::card::{render_series, Role};
use articly::render::svg::to_svg;
use articly::services::export::{CaptureOptions, ExportEngine, ResvgCapture};
use articly::services::llm::{GenerateContentRequest, GenerateContentResponse, GenerativeBackend};
use articly::services::workflow::{GenerationInput, SeriesOrchestrator};

/// Answers text-model calls with a fixed three-act series and image-model
/// calls with a small real PNG.
#[derive(Debug)]
struct MockGemini {
    image_model: String,
    calls: Mutex<Vec<String>>,
}

impl MockGemini {
    fn new(config: &GeminiConfig) -> Self {
        Self {
            image_model: config.image_model.clone(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

fn tiny_png_base64() -> String {
    let img = image::RgbImage::from_pixel(18, 32, image::Rgb([200, 120, 60]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn series_json() -> String {
    json!({
        "themeColor": "#8B0000",
        "cards": [
            {
                "title": "開端",
                "subtitle": "旧城的雨",
                "body": ["雨落在青石板上。", "她撑伞走过。"],
                "layout": "hero",
                "imagePrompt": "rainy old town",
                "accentText": "序",
                "isDarkBackground": true
            },
            {
                "title": "转折",
                "subtitle": "一封旧信",
                "body": ["信纸已经泛黄。"],
                "layout": "story",
                "imagePrompt": "old letter on desk",
                "accentText": ""
            },
            {
                "title": "归途",
                "subtitle": "时间是最温柔的刀",
                "body": ["时间是最温柔的刀。", "这句不会出现。"],
                "layout": "quote",
                "imagePrompt": "sunset over river",
                "isDarkBackground": false
            }
        ]
    })
    .to_string()
}

#[async_trait]
impl GenerativeBackend for MockGemini {
    async fn generate_content(
        &self,
        model: &str,
        _request: &GenerateContentRequest,
    ) -> StudioResult<GenerateContentResponse> {
        self.calls.lock().unwrap().push(model.to_string());
        let body = if model == self.image_model {
            json!({ "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": tiny_png_base64() } }
            ] } }] })
        } else {
            json!({ "candidates": [{ "content": { "parts": [{ "text": series_json() }] } }] })
        };
        serde_json::from_value(body).map_err(|e| StudioError::transport(e.to_string()))
    }
}

#[tokio::test]
async fn test_generate_render_and_export_series() {
    let config = GeminiConfig::default();
    let backend = Arc::new(MockGemini::new(&config));
    let mut orchestrator = SeriesOrchestrator::new(backend.clone(), &config);

    let input = GenerationInput {
        text: "一个关于归乡的故事".to_string(),
        style: NarrativeStyle::Elegant,
        image: None,
    };
    let series = orchestrator.generate(&input).await.unwrap().clone();
    assert_eq!(orchestrator.state().phase, Phase::Complete);
    assert!(!orchestrator.state().is_generating);

    let calls = backend.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], config.text_model);
    assert!(calls[1..].iter().all(|m| *m == config.image_model));

    // Traditional characters are normalized and the empty accent dropped.
    assert_eq!(series.cards()[0].title, "开端");
    assert_eq!(series.cards()[1].accent_text, None);
    assert_eq!(series.cards()[2].layout, LayoutVariant::Quote);

    let cards = render_series(&series);
    assert_eq!(cards.len(), 3);
    assert_eq!(cards[2].paragraphs.len(), 1);
    assert_eq!(cards[2].elements_with(Role::BodyRule).count(), 0);
    assert_eq!(cards[1].elements_with(Role::BodyRule).count(), 1);
    for card in &cards {
        assert_eq!(to_svg(card), to_svg(card));
    }

    let dir = tempfile::tempdir().unwrap();
    let exporter = ExportEngine::new(
        Arc::new(ResvgCapture::new(&[])),
        Arc::new(NativeStorage::new()),
        dir.path(),
        CaptureOptions::default(),
    );
    let outcomes = exporter.export_series(&cards).await;
    assert_eq!(outcomes.len(), 3);
    for (i, outcome) in outcomes.into_iter().enumerate() {
        let path = outcome.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("灵感叙事-第{}章-", i + 1)));
        let png = image::load_from_memory(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!((png.width(), png.height()), (900, 1600));
    }
}

#[tokio::test]
async fn test_empty_input_makes_no_backend_calls() {
    let config = GeminiConfig::default();
    let backend = Arc::new(MockGemini::new(&config));
    let mut orchestrator = SeriesOrchestrator::new(backend.clone(), &config);

    let err = orchestrator
        .generate(&GenerationInput {
            text: "   ".to_string(),
            style: NarrativeStyle::Modern,
            image: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::EmptyInput));
    assert_eq!(orchestrator.state().phase, Phase::Failed);
    assert!(backend.calls.lock().unwrap().is_empty());
}
