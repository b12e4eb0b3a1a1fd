use std::sync::Arc;

use anyhow::Result;
use articly::core::config::Config;
use articly::core::error::StudioError;
use articly::core::io::{NativeStorage, Storage};
use articly::core::state::Series;
use articly::render::card::{render_series, CardComposition};
use articly::render::svg::to_svg;
use articly::services::export::{CaptureOptions, ExportEngine, ResvgCapture};
use articly::services::llm::{GeminiClient, GenerativeBackend};
use articly::services::setup::{self, GalleryAction, SpinnerObserver};
use articly::services::workflow::{GenerationInput, SeriesOrchestrator};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please check that 'config.yml' is valid YAML.");
            return Err(e);
        }
    };
    config.ensure_directories()?;
    setup::ensure_credential(&mut config)?;

    let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());
    let backend: Arc<dyn GenerativeBackend> = Arc::new(GeminiClient::new(&config.gemini)?);
    let mut orchestrator = SeriesOrchestrator::new(backend, &config.gemini)
        .with_observer(Box::new(SpinnerObserver::new()));
    let exporter = ExportEngine::new(
        Arc::new(ResvgCapture::new(&config.render.font_dirs)),
        storage.clone(),
        &config.output_folder,
        CaptureOptions::with_scale(config.export.scale),
    );

    loop {
        let input = setup::run_form(&config, storage.clone()).await?;
        let Some(series) = generate(&mut orchestrator, &input).await? else {
            continue;
        };

        let cards = render_series(&series);
        write_previews(storage.as_ref(), &config.output_folder, &cards).await;
        for (i, card, _) in series.entries() {
            println!("  0{} {} | {}", i + 1, card.title, card.subtitle);
        }

        match gallery(&exporter, &cards, &series).await? {
            GalleryAction::Quit => break,
            _ => continue,
        }
    }

    Ok(())
}

/// Runs the orchestrator until it succeeds, the user declines a retry, or the
/// input itself is empty (back to the form).
async fn generate(orchestrator: &mut SeriesOrchestrator, input: &GenerationInput) -> Result<Option<Series>> {
    loop {
        match orchestrator.generate(input).await {
            Ok(series) => return Ok(Some(series.clone())),
            Err(StudioError::EmptyInput) => {
                println!("{}", StudioError::EmptyInput.user_message());
                return Ok(None);
            }
            Err(e) => {
                if !setup::prompt_retry(&e.user_message())? {
                    return Ok(None);
                }
            }
        }
    }
}

async fn write_previews(storage: &dyn Storage, output_folder: &str, cards: &[CardComposition]) {
    for card in cards {
        let path = format!("{}/preview-0{}.svg", output_folder, card.index + 1);
        match storage.write(&path, to_svg(card).as_bytes()).await {
            Ok(()) => println!("预览: {}", path),
            Err(e) => log::warn!("Could not write preview {}: {}", path, e),
        }
    }
}

/// Returns `Restart` or `Quit`; exports are handled in place.
async fn gallery(exporter: &ExportEngine, cards: &[CardComposition], series: &Series) -> Result<GalleryAction> {
    loop {
        match setup::prompt_gallery(series)? {
            GalleryAction::ExportAll => {
                for (i, outcome) in exporter.export_series(cards).await.into_iter().enumerate() {
                    match outcome {
                        Ok(path) => println!("已导出: {}", path.display()),
                        Err(e) => println!("第 {} 章导出失败: {}", i + 1, e),
                    }
                }
            }
            GalleryAction::ExportOne(i) => {
                if let Some(card) = cards.get(i) {
                    match exporter.export_card(card).await {
                        Ok(path) => println!("已导出: {}", path.display()),
                        Err(e) => println!("第 {} 章导出失败: {}", i + 1, e),
                    }
                }
            }
            action => return Ok(action),
        }
    }
}
