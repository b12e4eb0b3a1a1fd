use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::state::NarrativeStyle;

pub const CONFIG_FILE: &str = "config.yml";
const API_KEY_ENV: &str = "GEMINI_API_KEY";
const API_KEY_ENV_FALLBACK: &str = "API_KEY";
/// 450x800 at 8x is already a 3600x6400 pixmap.
const MAX_EXPORT_SCALE: f32 = 8.0;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default)]
    pub default_style: NarrativeStyle,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RenderConfig {
    /// Extra font directories loaded next to the system fonts.
    #[serde(default)]
    pub font_dirs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_scale")]
    pub scale: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_folder: default_output(),
            default_style: NarrativeStyle::default(),
            gemini: GeminiConfig::default(),
            render: RenderConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
        }
    }
}

fn default_output() -> String {
    "output".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_text_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}
fn default_timeout() -> u64 {
    120
}
fn default_scale() -> f32 {
    2.0
}

impl Config {
    /// Loads `config.yml` if present, otherwise defaults. The credential
    /// from the environment wins over the file.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        if let Some(key) = api_key_from_env() {
            config.gemini.api_key = key;
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(config)
    }

    /// Rejects values that would only fail later, at capture time.
    pub fn validate(&self) -> Result<()> {
        let scale = self.export.scale;
        if !scale.is_finite() || scale <= 0.0 || scale > MAX_EXPORT_SCALE {
            bail!(
                "export.scale must be in (0, {}], got {}",
                MAX_EXPORT_SCALE,
                scale
            );
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }

    pub fn has_credential(&self) -> bool {
        !self.gemini.api_key.trim().is_empty()
    }
}

fn api_key_from_env() -> Option<String> {
    [API_KEY_ENV, API_KEY_ENV_FALLBACK]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load_from(&dir.path().join("config.yml"))?;
        assert_eq!(config.output_folder, "output");
        assert_eq!(config.default_style, NarrativeStyle::Modern);
        assert_eq!(config.gemini.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.export.scale, 2.0);
        Ok(())
    }

    #[test]
    fn test_partial_yaml_fills_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "default_style: elegant\ngemini:\n  api_key: abc\n  timeout_seconds: 30\n",
        )?;

        let config = Config::load_from(&path)?;
        assert_eq!(config.default_style, NarrativeStyle::Elegant);
        assert_eq!(config.gemini.api_key, "abc");
        assert_eq!(config.gemini.timeout_seconds, 30);
        assert_eq!(config.gemini.text_model, "gemini-3-flash-preview");
        assert!(config.has_credential());
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");
        let mut config = Config::default();
        config.render.font_dirs = vec!["fonts".to_string()];
        config.save_to(&path)?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.render.font_dirs, vec!["fonts".to_string()]);
        assert!(!loaded.has_credential());
        Ok(())
    }

    #[test]
    fn test_bad_export_scale_is_rejected_at_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");
        for bad in ["0", "-2.0", ".nan", "64"] {
            fs::write(&path, format!("export:\n  scale: {}\n", bad))?;
            let err = Config::load_from(&path).unwrap_err();
            assert!(format!("{:#}", err).contains("export.scale"), "{}", bad);
        }

        fs::write(&path, "export:\n  scale: 1.5\n")?;
        assert_eq!(Config::load_from(&path)?.export.scale, 1.5);
        Ok(())
    }

    #[test]
    fn test_invalid_yaml_is_an_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.yml");
        fs::write(&path, "default_style: [unclosed")?;
        assert!(Config::load_from(&path).is_err());
        Ok(())
    }
}
