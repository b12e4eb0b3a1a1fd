use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of cards in every series: setup, development, resolution.
pub const SERIES_LEN: usize = 3;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStyle {
    #[default]
    Modern,
    Elegant,
    Minimal,
    Vibrant,
    Dark,
}

impl NarrativeStyle {
    pub const ALL: [NarrativeStyle; 5] = [
        NarrativeStyle::Modern,
        NarrativeStyle::Elegant,
        NarrativeStyle::Minimal,
        NarrativeStyle::Vibrant,
        NarrativeStyle::Dark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeStyle::Modern => "modern",
            NarrativeStyle::Elegant => "elegant",
            NarrativeStyle::Minimal => "minimal",
            NarrativeStyle::Vibrant => "vibrant",
            NarrativeStyle::Dark => "dark",
        }
    }

    /// Label shown in the style selector.
    pub fn label(&self) -> &'static str {
        match self {
            NarrativeStyle::Modern => "现代简约",
            NarrativeStyle::Elegant => "雅致古韵",
            NarrativeStyle::Minimal => "极简纯白",
            NarrativeStyle::Vibrant => "潮流色彩",
            NarrativeStyle::Dark => "高级暗调",
        }
    }
}

impl fmt::Display for NarrativeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NarrativeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NarrativeStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()) || style.label() == s.trim())
            .ok_or_else(|| format!("unknown narrative style: {}", s))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    Hero,
    Story,
    Split,
    Quote,
    List,
}

impl LayoutVariant {
    pub const ALL: [LayoutVariant; 5] = [
        LayoutVariant::Hero,
        LayoutVariant::Story,
        LayoutVariant::Split,
        LayoutVariant::Quote,
        LayoutVariant::List,
    ];

    /// Variants offered to the content backend. `List` is renderable but never requested.
    pub const GENERATED: [LayoutVariant; 4] = [
        LayoutVariant::Hero,
        LayoutVariant::Story,
        LayoutVariant::Split,
        LayoutVariant::Quote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutVariant::Hero => "hero",
            LayoutVariant::Story => "story",
            LayoutVariant::Split => "split",
            LayoutVariant::Quote => "quote",
            LayoutVariant::List => "list",
        }
    }
}

/// Position of a card in the three-act structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Act {
    Setup,
    Development,
    Resolution,
}

impl Act {
    pub fn for_index(index: usize) -> Self {
        match index {
            0 => Act::Setup,
            1 => Act::Development,
            _ => Act::Resolution,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Act::Setup => "SETUP",
            Act::Development => "DEVELOPMENT",
            Act::Resolution => "RESOLUTION",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CardContent {
    pub title: String,
    pub subtitle: String,
    pub body: Vec<String>,
    pub layout: LayoutVariant,
    pub image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_dark_background: Option<bool>,
}

/// A self-contained image reference, normally a `data:` URL.
pub type ImageRef = String;

/// One completed generation run. Only ever built with all cards and images present.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    cards: Vec<CardContent>,
    image_urls: Vec<ImageRef>,
    style: NarrativeStyle,
    theme_color: String,
}

impl Series {
    /// Pairs cards with images index by index. Fails unless both hold exactly three entries.
    pub fn assemble(
        cards: Vec<CardContent>,
        image_urls: Vec<ImageRef>,
        style: NarrativeStyle,
        theme_color: String,
    ) -> Result<Self, String> {
        if cards.len() != SERIES_LEN || image_urls.len() != SERIES_LEN {
            return Err(format!(
                "series needs {} cards and {} images, got {} and {}",
                SERIES_LEN,
                SERIES_LEN,
                cards.len(),
                image_urls.len()
            ));
        }
        Ok(Self {
            cards,
            image_urls,
            style,
            theme_color,
        })
    }

    pub fn cards(&self) -> &[CardContent] {
        &self.cards
    }

    pub fn image_urls(&self) -> &[ImageRef] {
        &self.image_urls
    }

    pub fn style(&self) -> NarrativeStyle {
        self.style
    }

    pub fn theme_color(&self) -> &str {
        &self.theme_color
    }

    /// Iterates `(index, card, image)` triples in series order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &CardContent, &ImageRef)> {
        self.cards
            .iter()
            .zip(self.image_urls.iter())
            .enumerate()
            .map(|(i, (card, image))| (i, card, image))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    GeneratingContent,
    GeneratingImage(usize),
    Complete,
    Failed,
}

/// Process-wide generation state. Mutated only by the orchestrator.
#[derive(Clone, Debug, Default)]
pub struct GenerationState {
    pub phase: Phase,
    pub is_generating: bool,
    pub status_message: String,
    pub error: Option<String>,
    pub series: Option<Series>,
    /// Images collected so far in the current run, in card order.
    pub images_ready: usize,
}
