use std::sync::Arc;

use crate::core::config::GeminiConfig;
use crate::core::error::{StudioError, StudioResult};
use crate::core::state::{GenerationState, NarrativeStyle, Phase, Series, SERIES_LEN};
use crate::services::content::{ContentGenerator, SeriesContent};
use crate::services::image::ImageGenerator;
use crate::services::llm::GenerativeBackend;
use crate::utils::data_url::InlineImage;

const STATUS_CONTENT: &str = "AI 正在深度拆解叙事结构...";

/// What the user submitted with the generate action.
#[derive(Debug, Clone, Default)]
pub struct GenerationInput {
    pub text: String,
    pub style: NarrativeStyle,
    pub image: Option<InlineImage>,
}

impl GenerationInput {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none()
    }
}

/// Notified after every state transition, e.g. to drive a spinner.
pub trait StatusObserver: Send + Sync {
    fn on_status(&self, state: &GenerationState);
}

pub struct NoopObserver;

impl StatusObserver for NoopObserver {
    fn on_status(&self, _state: &GenerationState) {}
}

/// Series Orchestrator. Runs one content call then three image calls in
/// order, and publishes the series only when all four succeeded.
pub struct SeriesOrchestrator {
    content: ContentGenerator,
    images: ImageGenerator,
    state: GenerationState,
    observer: Box<dyn StatusObserver>,
}

impl SeriesOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: &GeminiConfig) -> Self {
        Self::with_generators(
            ContentGenerator::new(backend.clone(), config.text_model.clone()),
            ImageGenerator::new(backend, config.image_model.clone()),
        )
    }

    pub fn with_generators(content: ContentGenerator, images: ImageGenerator) -> Self {
        Self {
            content,
            images,
            state: GenerationState::default(),
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn StatusObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// Runs the whole pipeline from scratch. On failure the previous series
    /// (if any) stays in place and `state().error` holds the user-facing message.
    pub async fn generate(&mut self, input: &GenerationInput) -> StudioResult<&Series> {
        self.state.error = None;
        self.state.images_ready = 0;
        self.transition(Phase::Validating, String::new());

        if input.is_empty() {
            return Err(self.fail(StudioError::EmptyInput));
        }

        self.state.is_generating = true;
        match self.run(input).await {
            Ok(series) => {
                self.state.is_generating = false;
                self.state.series = Some(series);
                self.transition(Phase::Complete, String::new());
                log::info!("Series complete");
                self.state
                    .series
                    .as_ref()
                    .ok_or_else(|| StudioError::schema("series missing after publish"))
            }
            Err(e) => {
                // Backend detail goes to the log only; the state carries the generic message.
                if e.is_backend() {
                    log::error!("Backend call failed: {}", e);
                } else {
                    log::warn!("Generation failed: {}", e);
                }
                Err(self.fail(e))
            }
        }
    }

    async fn run(&mut self, input: &GenerationInput) -> StudioResult<Series> {
        self.transition(Phase::GeneratingContent, STATUS_CONTENT.to_string());
        let SeriesContent { cards, theme_color } = self
            .content
            .generate(&input.text, input.style, input.image.as_ref())
            .await?;
        log::info!("Content ready (theme {}), generating {} images", theme_color, cards.len());

        let mut image_urls = Vec::with_capacity(SERIES_LEN);
        for (i, card) in cards.iter().enumerate() {
            self.transition(
                Phase::GeneratingImage(i),
                format!("正在构思第 {}/{} 章视觉背景...", i + 1, SERIES_LEN),
            );
            let url = self.images.generate(&card.image_prompt).await?;
            image_urls.push(url);
            self.state.images_ready = image_urls.len();
        }

        Series::assemble(cards, image_urls, input.style, theme_color).map_err(StudioError::schema)
    }

    fn transition(&mut self, phase: Phase, status: String) {
        log::info!("Phase {:?}: {}", phase, status);
        self.state.phase = phase;
        self.state.status_message = status;
        self.observer.on_status(&self.state);
    }

    fn fail(&mut self, err: StudioError) -> StudioError {
        self.state.is_generating = false;
        self.state.error = Some(err.user_message());
        self.transition(Phase::Failed, String::new());
        err
    }
}
