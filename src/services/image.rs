use std::sync::Arc;

use crate::core::error::{StudioError, StudioResult};
use crate::core::state::ImageRef;
use crate::services::llm::{
    Content, GenerateContentRequest, GenerationConfig, GenerativeBackend, ImageConfig, Part,
};
use crate::utils::data_url::to_data_url;

/// Appended to every image prompt. The renderer always lays text over the
/// image, so the picture has to leave quiet space for it.
pub const STYLE_SUFFIX: &str = " -- Cinematic lighting, 4k, artistic, high quality, commercial background photography, no text, leave generous negative space for text overlay.";

/// Matches the 450x800 card canvas.
pub const ASPECT_RATIO: &str = "9:16";

/// Image Generation Adapter: one request per card prompt, one inline image back.
#[derive(Debug, Clone)]
pub struct ImageGenerator {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
}

impl ImageGenerator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub async fn generate(&self, image_prompt: &str) -> StudioResult<ImageRef> {
        let request = build_request(image_prompt);
        let response = self.backend.generate_content(&self.model, &request).await?;

        match response.inline_data() {
            Some(inline) if !inline.data.is_empty() => {
                Ok(to_data_url(&inline.mime_type, &inline.data))
            }
            _ => Err(StudioError::image(format!(
                "response carries no inline image (finish reason: {})",
                response.finish_reason()
            ))),
        }
    }
}

pub fn build_request(image_prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(format!("{}{}", image_prompt.trim(), STYLE_SUFFIX))],
        }],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            image_config: Some(ImageConfig {
                aspect_ratio: ASPECT_RATIO.to_string(),
            }),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::GenerateContentResponse;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct CannedBackend {
        body: &'static str,
    }

    #[async_trait]
    impl GenerativeBackend for CannedBackend {
        async fn generate_content(
            &self,
            _model: &str,
            _request: &GenerateContentRequest,
        ) -> StudioResult<GenerateContentResponse> {
            Ok(serde_json::from_str(self.body).unwrap())
        }
    }

    #[test]
    fn test_request_appends_suffix_and_aspect_ratio() {
        let value = serde_json::to_value(build_request("fog over a lake ")).unwrap();
        let text = value["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("fog over a lake -- Cinematic lighting"));
        assert!(text.contains("negative space"));
        assert_eq!(value["generationConfig"]["imageConfig"]["aspectRatio"], "9:16");
        assert_eq!(value["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[tokio::test]
    async fn test_inline_image_becomes_data_url() {
        let backend = Arc::new(CannedBackend {
            body: r#"{"candidates":[{"content":{"parts":[
                {"text":"here you go"},
                {"inlineData":{"mimeType":"image/png","data":"iVBORw0KGgo="}}
            ]}}]}"#,
        });
        let url = ImageGenerator::new(backend, "image-model")
            .generate("fog")
            .await
            .unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
    }

    #[tokio::test]
    async fn test_text_only_response_is_image_error() {
        let backend = Arc::new(CannedBackend {
            body: r#"{"candidates":[{"content":{"parts":[{"text":"I cannot draw that"}]},"finishReason":"STOP"}]}"#,
        });
        let err = ImageGenerator::new(backend, "image-model")
            .generate("fog")
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::ImageGeneration(_)));
    }

    #[tokio::test]
    async fn test_no_candidates_is_image_error() {
        let backend = Arc::new(CannedBackend { body: r#"{"candidates":[]}"# });
        let err = ImageGenerator::new(backend, "image-model")
            .generate("fog")
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::ImageGeneration(_)));
    }
}
