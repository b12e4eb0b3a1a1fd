use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Confirm, Password, Select, Text};

use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::state::{GenerationState, NarrativeStyle, Phase, Series};
use crate::services::workflow::{GenerationInput, StatusObserver};
use crate::utils::data_url::InlineImage;

/// Asks for a Gemini API key when neither the config file nor the
/// environment provided one, and offers to persist it.
pub fn ensure_credential(config: &mut Config) -> Result<()> {
    if config.has_credential() {
        return Ok(());
    }

    println!("未找到 Gemini API Key（可在 config.yml 或环境变量 GEMINI_API_KEY 中设置）。");
    let key = Password::new("Gemini API Key:")
        .without_confirmation()
        .prompt()?;
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(anyhow!("API key is required"));
    }
    config.gemini.api_key = key;

    if Confirm::new("保存到 config.yml？").with_default(true).prompt()? {
        config.save()?;
        println!("Configuration saved.");
    }
    Ok(())
}

/// The input form: story text, optional reference image, style.
pub async fn run_form(config: &Config, storage: Arc<dyn Storage>) -> Result<GenerationInput> {
    let text = Text::new("你想讲述什么故事？")
        .with_help_message("可以留空，仅凭参考图片创作")
        .prompt()?;

    let image_path = Text::new("参考图片路径（可选）:").prompt()?;
    let image = load_reference_image(storage.as_ref(), &image_path).await?;

    let options = style_options();
    let cursor = NarrativeStyle::ALL
        .iter()
        .position(|s| *s == config.default_style)
        .unwrap_or(0);
    let choice = Select::new("叙事风格:", options)
        .with_starting_cursor(cursor)
        .prompt()?;
    let style = parse_style_choice(&choice)?;

    Ok(GenerationInput { text, style, image })
}

/// Blank path means no image. Anything that is not a recognizable image is
/// rejected here so it never reaches the backend.
pub async fn load_reference_image(storage: &dyn Storage, path: &str) -> Result<Option<InlineImage>> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(None);
    }
    let bytes = storage.read(path).await?;
    if image::guess_format(&bytes).is_err() {
        return Err(anyhow!("不支持的图片格式: {}", path));
    }
    log::info!("Loaded reference image {} ({} bytes)", path, bytes.len());
    Ok(Some(InlineImage::from_bytes(&bytes)))
}

pub fn style_options() -> Vec<String> {
    NarrativeStyle::ALL
        .iter()
        .map(|s| format!("{} ({})", s.label(), s.as_str()))
        .collect()
}

pub fn parse_style_choice(choice: &str) -> Result<NarrativeStyle> {
    let name = choice
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("empty style choice"))?;
    name.parse()
        .map_err(|_| anyhow!("unknown style: {}", choice))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryAction {
    ExportAll,
    ExportOne(usize),
    /// Back to the form for a new series.
    Restart,
    Quit,
}

pub fn gallery_actions(series: &Series) -> Vec<(GalleryAction, String)> {
    let mut actions = vec![(GalleryAction::ExportAll, "导出全部图片".to_string())];
    for (i, card, _) in series.entries() {
        actions.push((
            GalleryAction::ExportOne(i),
            format!("导出第 {} 章：{}", i + 1, card.title),
        ));
    }
    actions.push((GalleryAction::Restart, "重新创作".to_string()));
    actions.push((GalleryAction::Quit, "退出".to_string()));
    actions
}

pub fn prompt_gallery(series: &Series) -> Result<GalleryAction> {
    let actions = gallery_actions(series);
    let labels: Vec<String> = actions.iter().map(|(_, label)| label.clone()).collect();
    let picked = Select::new("下一步:", labels).raw_prompt()?;
    actions
        .get(picked.index)
        .map(|(action, _)| *action)
        .ok_or_else(|| anyhow!("invalid gallery selection"))
}

pub fn prompt_retry(message: &str) -> Result<bool> {
    Ok(Confirm::new(&format!("{} 是否重试？", message))
        .with_default(true)
        .prompt()?)
}

/// Terminal spinner driven by orchestrator status updates.
#[derive(Default)]
pub struct SpinnerObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}

impl StatusObserver for SpinnerObserver {
    fn on_status(&self, state: &GenerationState) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        match state.phase {
            Phase::Idle | Phase::Validating => {}
            Phase::GeneratingContent | Phase::GeneratingImage(_) => {
                let pb = slot.get_or_insert_with(Self::spinner);
                pb.set_message(state.status_message.clone());
            }
            Phase::Complete => {
                if let Some(pb) = slot.take() {
                    pb.finish_with_message("三部曲已生成");
                }
            }
            Phase::Failed => {
                if let Some(pb) = slot.take() {
                    pb.abandon_with_message(state.error.clone().unwrap_or_default());
                }
            }
        }
    }
}
