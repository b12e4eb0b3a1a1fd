use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use resvg::tiny_skia::{Pixmap, Transform};

use crate::core::error::{StudioError, StudioResult};
use crate::core::io::Storage;
use crate::render::card::{CardComposition, CARD_HEIGHT, CARD_WIDTH};
use crate::render::svg::to_svg;
use crate::utils::data_url::decode_data_url;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Pixel ratio applied to the logical canvas.
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
        }
    }
}

impl CaptureOptions {
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.scale).round() as u32,
            (self.height as f32 * self.scale).round() as u32,
        )
    }
}

/// Rasterizes a composition to PNG bytes.
pub trait RasterCapture: Send + Sync {
    fn capture(&self, card: &CardComposition, options: &CaptureOptions) -> StudioResult<Vec<u8>>;
}

pub struct ResvgCapture {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ResvgCapture {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` found in `font_dirs`.
    pub fn new(font_dirs: &[String]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, Path::new(dir));
        }
        log::debug!("Font database holds {} faces", db.len());
        Self { fontdb: Arc::new(db) }
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        log::warn!("Font directory {} is not readable", dir.display());
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if path.is_file() && (ext == "ttf" || ext == "otf" || ext == "ttc") {
            let _ = db.load_font_file(&path);
        }
    }
}

impl RasterCapture for ResvgCapture {
    fn capture(&self, card: &CardComposition, options: &CaptureOptions) -> StudioResult<Vec<u8>> {
        // Only inline images can be embedded; anything else would be fetched
        // from somewhere we do not control.
        if !card.image.is_empty() {
            if !card.image.starts_with("data:") {
                return Err(StudioError::capture(format!(
                    "card {} references a non-inline image",
                    card.index + 1
                )));
            }
            if decode_data_url(&card.image).is_none() {
                return Err(StudioError::capture(format!(
                    "card {} carries a malformed inline image",
                    card.index + 1
                )));
            }
        }

        let svg = to_svg(card);
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts)
            .map_err(|e| StudioError::capture(format!("parse card svg: {}", e)))?;

        let (width, height) = options.pixel_size();
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| StudioError::capture(format!("invalid canvas {}x{}", width, height)))?;
        let size = tree.size();
        let transform = Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| StudioError::capture(format!("encode png: {}", e)))
    }
}

pub fn export_filename(index: usize, unix_millis: u128) -> String {
    format!("灵感叙事-第{}章-{}.png", index + 1, unix_millis)
}

pub struct ExportEngine {
    capture: Arc<dyn RasterCapture>,
    storage: Arc<dyn Storage>,
    output_folder: PathBuf,
    options: CaptureOptions,
}

impl ExportEngine {
    pub fn new(
        capture: Arc<dyn RasterCapture>,
        storage: Arc<dyn Storage>,
        output_folder: impl Into<PathBuf>,
        options: CaptureOptions,
    ) -> Self {
        Self {
            capture,
            storage,
            output_folder: output_folder.into(),
            options,
        }
    }

    pub async fn export_card(&self, card: &CardComposition) -> StudioResult<PathBuf> {
        let capture = self.capture.clone();
        let options = self.options;
        let owned = card.clone();
        let png = tokio::task::spawn_blocking(move || capture.capture(&owned, &options))
            .await
            .map_err(|e| StudioError::capture(format!("capture task failed: {}", e)))??;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.output_folder.join(export_filename(card.index, millis));
        let path_str = path.to_string_lossy();
        self.storage
            .write(&path_str, &png)
            .await
            .map_err(|e| StudioError::capture(format!("write {}: {}", path_str, e)))?;

        log::info!("Exported card {} to {}", card.index + 1, path.display());
        Ok(path)
    }

    /// Exports every card in order. A failed card is logged and reported in
    /// its slot; the rest still go out.
    pub async fn export_series(&self, cards: &[CardComposition]) -> Vec<StudioResult<PathBuf>> {
        let mut outcomes = Vec::with_capacity(cards.len());
        for card in cards {
            let outcome = self.export_card(card).await;
            if let Err(e) = &outcome {
                log::error!("Export of card {} failed: {}", card.index + 1, e);
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;
    use crate::core::state::{CardContent, LayoutVariant, NarrativeStyle};
    use crate::render::card::render_card;
    use crate::utils::data_url::InlineImage;
    use std::io::Cursor;
    use std::sync::Mutex;

    fn content() -> CardContent {
        CardContent {
            title: "雾起".to_string(),
            subtitle: "清晨".to_string(),
            body: vec!["湖面很静。".to_string()],
            layout: LayoutVariant::Story,
            image_prompt: "fog".to_string(),
            accent_text: Some("序章".to_string()),
            is_dark_background: None,
        }
    }

    fn png_data_url() -> String {
        let img = image::RgbImage::from_pixel(9, 16, image::Rgb([40, 80, 120]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        InlineImage::from_bytes(&bytes).to_data_url()
    }

    struct FlakyCapture {
        fail_index: usize,
        calls: Mutex<Vec<usize>>,
    }

    impl RasterCapture for FlakyCapture {
        fn capture(&self, card: &CardComposition, _options: &CaptureOptions) -> StudioResult<Vec<u8>> {
            self.calls.lock().unwrap().push(card.index);
            if card.index == self.fail_index {
                Err(StudioError::capture("boom"))
            } else {
                Ok(vec![0x89, b'P', b'N', b'G'])
            }
        }
    }

    #[test]
    fn test_filename_carries_one_based_index() {
        let first = export_filename(0, 1_700_000_000_000);
        let second = export_filename(1, 1_700_000_000_000);
        assert_eq!(second, "灵感叙事-第2章-1700000000000.png");
        assert_ne!(first, second);
    }

    #[test]
    fn test_pixel_size_uses_scale() {
        assert_eq!(CaptureOptions::default().pixel_size(), (900, 1600));
        assert_eq!(CaptureOptions::with_scale(1.0).pixel_size(), (450, 800));
    }

    #[tokio::test]
    async fn test_export_writes_scaled_png() {
        let dir = tempfile::tempdir().unwrap();
        let card = render_card(&content(), &png_data_url(), NarrativeStyle::Elegant, "#8b0000", 1);
        let engine = ExportEngine::new(
            Arc::new(ResvgCapture::new(&[])),
            Arc::new(NativeStorage::new()),
            dir.path(),
            CaptureOptions::default(),
        );

        let path = engine.export_card(&card).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("灵感叙事-第2章-"));
        assert!(name.ends_with(".png"));

        let decoded = image::load_from_memory(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (900, 1600));
    }

    #[test]
    fn test_remote_image_is_rejected() {
        let card = render_card(
            &content(),
            &"https://example.com/bg.png".to_string(),
            NarrativeStyle::Modern,
            "#000000",
            0,
        );
        let err = ResvgCapture::new(&[])
            .capture(&card, &CaptureOptions::default())
            .unwrap_err();
        assert!(matches!(err, StudioError::Capture(_)));
    }

    #[test]
    fn test_malformed_inline_image_is_rejected() {
        let card = render_card(
            &content(),
            &"data:image/png;base64,@@not-base64@@".to_string(),
            NarrativeStyle::Modern,
            "#000000",
            0,
        );
        let err = ResvgCapture::new(&[])
            .capture(&card, &CaptureOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("malformed inline image"));
    }

    #[tokio::test]
    async fn test_series_export_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let capture = Arc::new(FlakyCapture {
            fail_index: 1,
            calls: Mutex::new(Vec::new()),
        });
        let engine = ExportEngine::new(
            capture.clone(),
            Arc::new(NativeStorage::new()),
            dir.path(),
            CaptureOptions::default(),
        );
        let cards: Vec<_> = (0..3)
            .map(|i| render_card(&content(), &String::new(), NarrativeStyle::Dark, "#000000", i))
            .collect();

        let outcomes = engine.export_series(&cards).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(StudioError::Capture(_))));
        assert!(outcomes[2].is_ok());
        assert_eq!(*capture.calls.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
