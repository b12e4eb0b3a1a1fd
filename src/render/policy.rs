//! Style/Layout Policy: a pure mapping from narrative style, brightness and
//! layout variant to the concrete visual treatment of a card.

use crate::core::state::{LayoutVariant, NarrativeStyle};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbb`; the alpha goes into a separate opacity attribute.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontClass {
    Sans,
    Serif,
}

impl FontClass {
    pub fn family(&self) -> &'static str {
        match self {
            FontClass::Sans => "'Noto Sans CJK SC', 'Source Han Sans SC', 'PingFang SC', 'Microsoft YaHei', sans-serif",
            FontClass::Serif => "'Noto Serif CJK SC', 'Source Han Serif SC', 'Songti SC', 'SimSun', serif",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TitleStyle {
    pub font: FontClass,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
    pub uppercase: bool,
    pub letter_spacing: f32,
    /// Rotation in degrees around the title's anchor.
    pub rotate: f32,
    /// Solid box drawn behind the title, with its own text colour.
    pub boxed: Option<(Rgba, Rgba)>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Solid(Rgba),
    /// Top-to-bottom gradient through three stops.
    Gradient { from: Rgba, via: Rgba, to: Rgba },
    /// Tint composited with multiply blending.
    Multiply(Rgba),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AccentStyle {
    Filled { background: Rgba, text: Rgba },
    Outlined,
}

/// Ornament attached to the header or the paragraph block.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoration {
    /// Short bar above the title in the text colour.
    TitleBar { width: f32, height: f32 },
    /// Vertical rule left of the paragraphs.
    BodyRule { color: Rgba, width: f32, indent: f32 },
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualConfig {
    pub overlay: Overlay,
    pub title: TitleStyle,
    pub subtitle_font: FontClass,
    pub body_weight: u16,
    pub text_color: Rgba,
    pub accent: AccentStyle,
    pub decoration: Decoration,
    pub padding: f32,
    /// Minimal centres every layout horizontally.
    pub force_center: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vertical {
    Center,
    Bottom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Horizontal {
    Start,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alignment {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

/// How the body paragraphs are presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyTreatment {
    Paragraphs,
    PullQuote,
}

/// Brightness assumed when the card carries no hint.
pub fn default_dark(style: NarrativeStyle) -> bool {
    match style {
        NarrativeStyle::Modern => true,
        NarrativeStyle::Elegant => false,
        NarrativeStyle::Minimal => false,
        NarrativeStyle::Vibrant => true,
        NarrativeStyle::Dark => true,
    }
}

pub fn visual_config(style: NarrativeStyle, is_dark: bool) -> VisualConfig {
    match style {
        NarrativeStyle::Elegant => VisualConfig {
            overlay: Overlay::Solid(if is_dark {
                Rgba::BLACK.with_alpha(0.5)
            } else {
                Rgba::WHITE.with_alpha(0.6)
            }),
            title: TitleStyle {
                font: FontClass::Serif,
                size: 48.0,
                weight: 700,
                italic: false,
                uppercase: false,
                letter_spacing: -1.2,
                rotate: 0.0,
                boxed: None,
            },
            subtitle_font: FontClass::Serif,
            body_weight: 300,
            text_color: if is_dark {
                Rgba::rgb(0xf8, 0xf5, 0xf0)
            } else {
                Rgba::rgb(0x1a, 0x1a, 0x1a)
            },
            accent: if is_dark {
                AccentStyle::Filled {
                    background: Rgba::WHITE.with_alpha(0.1),
                    text: Rgba::WHITE.with_alpha(0.8),
                }
            } else {
                AccentStyle::Filled {
                    background: Rgba::BLACK.with_alpha(0.05),
                    text: Rgba::BLACK.with_alpha(0.6),
                }
            },
            decoration: Decoration::BodyRule {
                color: Rgba::rgba(0xb9, 0x1c, 0x1c, 0.8),
                width: 4.0,
                indent: 24.0,
            },
            padding: 56.0,
            force_center: false,
        },
        NarrativeStyle::Modern => VisualConfig {
            overlay: if is_dark {
                Overlay::Gradient {
                    from: Rgba::BLACK.with_alpha(0.8),
                    via: Rgba::BLACK.with_alpha(0.2),
                    to: Rgba::BLACK.with_alpha(0.0),
                }
            } else {
                Overlay::Gradient {
                    from: Rgba::WHITE.with_alpha(0.9),
                    via: Rgba::WHITE.with_alpha(0.4),
                    to: Rgba::WHITE.with_alpha(0.0),
                }
            },
            title: TitleStyle {
                font: FontClass::Sans,
                size: 60.0,
                weight: 900,
                italic: true,
                uppercase: true,
                letter_spacing: -3.0,
                rotate: 0.0,
                boxed: None,
            },
            subtitle_font: FontClass::Sans,
            body_weight: 500,
            text_color: if is_dark {
                Rgba::WHITE
            } else {
                Rgba::rgb(0x0f, 0x17, 0x2a)
            },
            accent: AccentStyle::Filled {
                background: Rgba::rgb(0x4f, 0x46, 0xe5),
                text: Rgba::WHITE,
            },
            decoration: Decoration::TitleBar {
                width: 96.0,
                height: 6.0,
            },
            padding: 48.0,
            force_center: false,
        },
        NarrativeStyle::Minimal => VisualConfig {
            overlay: Overlay::Solid(if is_dark {
                Rgba::BLACK.with_alpha(0.4)
            } else {
                Rgba::WHITE.with_alpha(0.7)
            }),
            title: TitleStyle {
                font: FontClass::Sans,
                size: 36.0,
                weight: 300,
                italic: false,
                uppercase: true,
                letter_spacing: 14.4,
                rotate: 0.0,
                boxed: None,
            },
            subtitle_font: FontClass::Sans,
            body_weight: 300,
            text_color: if is_dark {
                Rgba::rgb(0xf1, 0xf5, 0xf9)
            } else {
                Rgba::rgb(0x1e, 0x29, 0x3b)
            },
            accent: AccentStyle::Outlined,
            decoration: Decoration::None,
            padding: 64.0,
            force_center: true,
        },
        NarrativeStyle::Vibrant => VisualConfig {
            overlay: Overlay::Multiply(Rgba::rgb(0x31, 0x2e, 0x81).with_alpha(if is_dark {
                0.1
            } else {
                0.35
            })),
            title: TitleStyle {
                font: FontClass::Sans,
                size: 48.0,
                weight: 900,
                italic: false,
                uppercase: false,
                letter_spacing: 0.0,
                rotate: -1.0,
                boxed: Some((Rgba::WHITE, Rgba::BLACK)),
            },
            subtitle_font: FontClass::Sans,
            body_weight: 300,
            text_color: Rgba::WHITE,
            accent: AccentStyle::Filled {
                background: Rgba::rgb(0xfa, 0xcc, 0x15),
                text: Rgba::BLACK,
            },
            decoration: Decoration::None,
            padding: 40.0,
            force_center: false,
        },
        NarrativeStyle::Dark => VisualConfig {
            overlay: Overlay::Solid(Rgba::BLACK.with_alpha(if is_dark { 0.4 } else { 0.6 })),
            title: TitleStyle {
                font: FontClass::Sans,
                size: 36.0,
                weight: 700,
                italic: false,
                uppercase: false,
                letter_spacing: 0.0,
                rotate: 0.0,
                boxed: None,
            },
            subtitle_font: FontClass::Sans,
            body_weight: 300,
            text_color: Rgba::WHITE,
            accent: AccentStyle::Filled {
                background: Rgba::WHITE.with_alpha(0.2),
                text: Rgba::WHITE,
            },
            decoration: Decoration::None,
            padding: 48.0,
            force_center: false,
        },
    }
}

/// Layout alignment. Independent of style brightness.
pub fn alignment(layout: LayoutVariant, force_center: bool) -> Alignment {
    match layout {
        LayoutVariant::Hero => Alignment {
            vertical: Vertical::Center,
            horizontal: if force_center { Horizontal::Center } else { Horizontal::Start },
        },
        LayoutVariant::Quote => Alignment {
            vertical: Vertical::Center,
            horizontal: Horizontal::Center,
        },
        LayoutVariant::Story | LayoutVariant::Split | LayoutVariant::List => Alignment {
            vertical: Vertical::Bottom,
            horizontal: if force_center { Horizontal::Center } else { Horizontal::Start },
        },
    }
}

pub fn body_treatment(layout: LayoutVariant) -> BodyTreatment {
    match layout {
        LayoutVariant::Quote => BodyTreatment::PullQuote,
        _ => BodyTreatment::Paragraphs,
    }
}
