//! Card Renderer: turns one card's content, its background image and the
//! run's style into a fixed-size composition. Pure; identical inputs give
//! identical compositions, which is what makes preview and export agree.

use crate::core::state::{Act, CardContent, ImageRef, NarrativeStyle, Series, SERIES_LEN};
use crate::render::policy::{
    alignment, body_treatment, default_dark, visual_config, AccentStyle, Alignment, BodyTreatment,
    Decoration, FontClass, Horizontal, Overlay, Rgba, Vertical, VisualConfig,
};
use crate::utils::text::{estimate_width, wrap_text};

pub const CARD_WIDTH: u32 = 450;
pub const CARD_HEIGHT: u32 = 800;
pub const CORNER_RADIUS: f32 = 48.0;

/// Bottom inset for caption-style layouts; larger than the padding so the
/// content clears the footer.
const CAPTION_BOTTOM: f32 = 96.0;
const EDGE: f32 = 48.0;
const SLATE: Rgba = Rgba::rgb(0xe2, 0xe8, 0xf0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub degrees: f32,
    pub cx: f32,
    pub cy: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub size: f32,
    pub weight: u16,
    pub font: FontClass,
    pub italic: bool,
    pub letter_spacing: f32,
    pub color: Rgba,
    pub anchor: Anchor,
    pub rotate: Option<Rotation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectShape {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub fill: Option<Rgba>,
    pub stroke: Option<(Rgba, f32)>,
    pub rotate: Option<Rotation>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Text(TextRun),
    Rect(RectShape),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    TitleBar,
    TitleBox,
    Title,
    Subtitle,
    BodyRule,
    Paragraph,
    QuoteGlyph,
    Quote,
    AccentPill,
    Accent,
    Sequence,
    Footer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub role: Role,
    pub shape: Shape,
}

impl Element {
    fn translate_y(&mut self, dy: f32) {
        match &mut self.shape {
            Shape::Text(t) => {
                t.y += dy;
                if let Some(r) = t.rotate.as_mut() {
                    r.cy += dy;
                }
            }
            Shape::Rect(r) => {
                r.y += dy;
                if let Some(rot) = r.rotate.as_mut() {
                    rot.cy += dy;
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CardComposition {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub image: ImageRef,
    /// Shown behind the image until (or instead of) it loads.
    pub placeholder: Rgba,
    pub is_dark: bool,
    pub config: VisualConfig,
    pub alignment: Alignment,
    pub body: BodyTreatment,
    /// Body paragraphs that made it onto the card.
    pub paragraphs: Vec<String>,
    pub elements: Vec<Element>,
}

impl CardComposition {
    pub fn overlay(&self) -> &Overlay {
        &self.config.overlay
    }

    pub fn elements_with(&self, role: Role) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.role == role)
    }

    /// Text of every run with the given role, in drawing order.
    pub fn texts(&self, role: Role) -> Vec<&str> {
        self.elements_with(role)
            .filter_map(|e| match &e.shape {
                Shape::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub fn render_card(
    content: &CardContent,
    image: &ImageRef,
    style: NarrativeStyle,
    theme_color: &str,
    index: usize,
) -> CardComposition {
    let is_dark = content.is_dark_background.unwrap_or_else(|| default_dark(style));
    let config = visual_config(style, is_dark);
    let alignment = alignment(content.layout, config.force_center);
    let body = body_treatment(content.layout);

    let paragraphs: Vec<String> = match body {
        BodyTreatment::PullQuote => content.body.iter().take(1).cloned().collect(),
        BodyTreatment::Paragraphs => content.body.clone(),
    };

    let mut block = Block::new(&config, alignment);
    block.header(content);
    match body {
        BodyTreatment::Paragraphs => block.paragraphs(&paragraphs),
        BodyTreatment::PullQuote => block.pull_quote(paragraphs.first().map(String::as_str).unwrap_or("")),
    }
    if let Some(accent) = content.accent_text.as_deref().filter(|s| !s.trim().is_empty()) {
        block.accent(accent);
    }

    let height = CARD_HEIGHT as f32;
    let offset = match alignment.vertical {
        Vertical::Center => (height - block.y) / 2.0,
        Vertical::Bottom => height - CAPTION_BOTTOM - block.y,
    };
    let mut elements = block.elements;
    for e in elements.iter_mut() {
        e.translate_y(offset);
    }

    let theme = parse_hex(theme_color).unwrap_or(SLATE);
    elements.extend(chrome(index, config.text_color, theme));

    CardComposition {
        index,
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
        image: image.clone(),
        placeholder: SLATE,
        is_dark,
        config,
        alignment,
        body,
        paragraphs,
        elements,
    }
}

/// Every card of a series, in order, with the series' style and theme.
pub fn render_series(series: &Series) -> Vec<CardComposition> {
    series
        .entries()
        .map(|(i, card, image)| render_card(card, image, series.style(), series.theme_color(), i))
        .collect()
}

/// Lays out the content block top-down from y = 0; the caller positions it.
struct Block<'a> {
    config: &'a VisualConfig,
    x: f32,
    anchor: Anchor,
    width: f32,
    y: f32,
    elements: Vec<Element>,
}

impl<'a> Block<'a> {
    fn new(config: &'a VisualConfig, alignment: Alignment) -> Self {
        let width = CARD_WIDTH as f32 - 2.0 * config.padding;
        let (x, anchor) = match alignment.horizontal {
            Horizontal::Start => (config.padding, Anchor::Start),
            Horizontal::Center => (CARD_WIDTH as f32 / 2.0, Anchor::Middle),
        };
        Self {
            config,
            x,
            anchor,
            width,
            y: 0.0,
            elements: Vec::new(),
        }
    }

    fn color(&self, opacity: f32) -> Rgba {
        let c = self.config.text_color;
        c.with_alpha(c.a * opacity)
    }

    /// Left edge of a box of `w` pixels placed according to the anchor.
    fn box_left(&self, x: f32, w: f32) -> f32 {
        match self.anchor {
            Anchor::Start => x,
            Anchor::Middle => x - w / 2.0,
            Anchor::End => x - w,
        }
    }

    fn push_text(&mut self, role: Role, run: TextRun) {
        self.elements.push(Element {
            role,
            shape: Shape::Text(run),
        });
    }

    fn push_rect(&mut self, role: Role, rect: RectShape) {
        self.elements.push(Element {
            role,
            shape: Shape::Rect(rect),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn line(
        &mut self,
        role: Role,
        text: &str,
        x: f32,
        size: f32,
        line_height: f32,
        weight: u16,
        font: FontClass,
        italic: bool,
        letter_spacing: f32,
        color: Rgba,
    ) {
        let baseline = self.y + (line_height - size) / 2.0 + size * 0.88;
        self.push_text(
            role,
            TextRun {
                text: text.to_string(),
                x,
                y: baseline,
                size,
                weight,
                font,
                italic,
                letter_spacing,
                color,
                anchor: self.anchor,
                rotate: None,
            },
        );
        self.y += line_height;
    }

    fn header(&mut self, content: &CardContent) {
        let config = self.config;
        if let Decoration::TitleBar { width, height } = config.decoration {
            let left = self.box_left(self.x, width);
            let rect = RectShape {
                x: left,
                y: self.y,
                width,
                height,
                radius: 0.0,
                fill: Some(self.color(1.0)),
                stroke: None,
                rotate: None,
            };
            self.push_rect(Role::TitleBar, rect);
            self.y += height + 32.0;
        }

        let title_style = &config.title;
        let title = if title_style.uppercase {
            content.title.to_uppercase()
        } else {
            content.title.clone()
        };
        let line_height = title_style.size * 1.1;

        match title_style.boxed {
            Some((background, text_color)) => {
                let (pad_x, pad_y) = (24.0, 12.0);
                let text_w = estimate_width(&title, title_style.size, title_style.letter_spacing);
                let box_w = text_w + 2.0 * pad_x;
                let box_h = line_height + 2.0 * pad_y;
                let left = self.box_left(self.x, box_w);
                let rotate = Some(Rotation {
                    degrees: title_style.rotate,
                    cx: left + box_w / 2.0,
                    cy: self.y + box_h / 2.0,
                });
                self.push_rect(
                    Role::TitleBox,
                    RectShape {
                        x: left,
                        y: self.y,
                        width: box_w,
                        height: box_h,
                        radius: 0.0,
                        fill: Some(background),
                        stroke: None,
                        rotate,
                    },
                );
                let text_x = match self.anchor {
                    Anchor::Start => self.x + pad_x,
                    _ => self.x,
                };
                self.y += pad_y;
                self.line(
                    Role::Title,
                    &title,
                    text_x,
                    title_style.size,
                    line_height,
                    title_style.weight,
                    title_style.font,
                    title_style.italic,
                    title_style.letter_spacing,
                    text_color,
                );
                if let Some(Element { shape: Shape::Text(run), .. }) = self.elements.last_mut() {
                    run.rotate = rotate;
                }
                self.y += pad_y;
            }
            None => {
                let color = self.color(1.0);
                self.line(
                    Role::Title,
                    &title,
                    self.x,
                    title_style.size,
                    line_height,
                    title_style.weight,
                    title_style.font,
                    title_style.italic,
                    title_style.letter_spacing,
                    color,
                );
            }
        }
        self.y += 16.0;

        let color = self.color(0.9);
        for line in wrap_text(&content.subtitle, self.width, 24.0, 0.0) {
            self.line(
                Role::Subtitle,
                &line,
                self.x,
                24.0,
                32.0,
                500,
                config.subtitle_font,
                false,
                0.0,
                color,
            );
        }
        self.y += 32.0;
    }

    fn paragraphs(&mut self, paragraphs: &[String]) {
        let config = self.config;
        let (rule, indent) = match config.decoration {
            Decoration::BodyRule { color, width, indent } => (Some((color, width)), indent),
            _ => (None, 0.0),
        };
        let x = match self.anchor {
            Anchor::Start => self.x + indent,
            _ => self.x,
        };
        let wrap_width = self.width - indent;
        let color = self.color(0.95);

        if rule.is_some() {
            self.y += 32.0;
        }
        let top = self.y;
        for (i, paragraph) in paragraphs.iter().enumerate() {
            if i > 0 {
                self.y += 20.0;
            }
            for line in wrap_text(paragraph, wrap_width, 20.0, 0.0) {
                self.line(
                    Role::Paragraph,
                    &line,
                    x,
                    20.0,
                    32.5,
                    config.body_weight,
                    FontClass::Sans,
                    false,
                    0.0,
                    color,
                );
            }
        }
        if let Some((rule_color, rule_width)) = rule {
            let rect = RectShape {
                x: config.padding,
                y: top,
                width: rule_width,
                height: self.y - top,
                radius: 0.0,
                fill: Some(rule_color),
                stroke: None,
                rotate: None,
            };
            self.push_rect(Role::BodyRule, rect);
            self.y += 32.0;
        }
    }

    fn pull_quote(&mut self, quote: &str) {
        let glyph_color = self.color(0.2);
        let text_color = self.color(1.0);
        // Glyphs and quote are always centred on the card, whatever the style.
        let saved = (self.x, self.anchor);
        self.x = CARD_WIDTH as f32 / 2.0;
        self.anchor = Anchor::Middle;

        self.y += 40.0;
        self.line(Role::QuoteGlyph, "\u{201C}", self.x, 72.0, 40.0, 400, FontClass::Serif, true, 0.0, glyph_color);
        for line in wrap_text(quote, self.width - 16.0, 30.0, 0.0) {
            self.line(Role::Quote, &line, self.x, 30.0, 41.25, 700, FontClass::Sans, false, 0.0, text_color);
        }
        self.line(Role::QuoteGlyph, "\u{201D}", self.x, 72.0, 40.0, 400, FontClass::Serif, true, 0.0, glyph_color);
        self.y += 40.0;

        (self.x, self.anchor) = saved;
    }

    fn accent(&mut self, accent: &str) {
        let label = accent.trim().to_uppercase();
        let (size, spacing, pad_x, pad_y) = (14.0, 2.8, 24.0, 8.0);
        let text_w = estimate_width(&label, size, spacing);
        let box_w = text_w + 2.0 * pad_x;
        let box_h = size * 1.4 + 2.0 * pad_y;

        self.y += 40.0;
        let left = self.box_left(self.x, box_w);
        let border = self.color(0.2);
        let (fill, text_color) = match &self.config.accent {
            AccentStyle::Filled { background, text } => (Some(*background), *text),
            AccentStyle::Outlined => (None, self.color(1.0)),
        };
        self.push_rect(
            Role::AccentPill,
            RectShape {
                x: left,
                y: self.y,
                width: box_w,
                height: box_h,
                radius: box_h / 2.0,
                fill,
                stroke: Some((border, 1.0)),
                rotate: None,
            },
        );

        let text_x = match self.anchor {
            Anchor::Start => self.x + pad_x,
            _ => self.x,
        };
        self.y += pad_y;
        self.line(Role::Accent, &label, text_x, size, size * 1.4, 900, FontClass::Sans, false, spacing, text_color);
        self.y += pad_y;
    }
}

/// Sequence indicator and footer, drawn on every card at low weight.
fn chrome(index: usize, text_color: Rgba, theme: Rgba) -> Vec<Element> {
    let number = format!("0{}", index + 1);
    let faint = |opacity: f32| text_color.with_alpha(text_color.a * opacity);
    let right = CARD_WIDTH as f32 - EDGE;
    let bottom = CARD_HEIGHT as f32 - EDGE;

    let text = |role: Role,
                text: String,
                x: f32,
                y: f32,
                size: f32,
                italic: bool,
                spacing: f32,
                color: Rgba,
                anchor: Anchor| Element {
        role,
        shape: Shape::Text(TextRun {
            text,
            x,
            y,
            size,
            weight: 900,
            font: FontClass::Sans,
            italic,
            letter_spacing: spacing,
            color,
            anchor,
            rotate: None,
        }),
    };

    let number_width = estimate_width(&number, 72.0, 0.0);
    vec![
        text(Role::Sequence, number, EDGE, EDGE + 63.0, 72.0, true, 0.0, faint(0.2), Anchor::Start),
        Element {
            role: Role::Sequence,
            shape: Shape::Rect(RectShape {
                x: EDGE + number_width + 12.0,
                y: EDGE + 36.0,
                width: 48.0,
                height: 1.0,
                radius: 0.0,
                fill: Some(theme.with_alpha(0.6)),
                stroke: None,
                rotate: None,
            }),
        },
        text(Role::Footer, "VISUAL CHAPTER".to_string(), EDGE, bottom - 18.0, 10.0, false, 3.0, faint(0.24), Anchor::Start),
        text(
            Role::Footer,
            format!("0{} / 0{}", index + 1, SERIES_LEN),
            EDGE,
            bottom,
            12.0,
            false,
            3.0,
            faint(0.4),
            Anchor::Start,
        ),
        text(Role::Footer, "ARTICLY AI NARRATIVE".to_string(), right, bottom - 18.0, 10.0, false, 3.0, faint(0.4), Anchor::End),
        text(
            Role::Footer,
            Act::for_index(index).label().to_string(),
            right,
            bottom,
            10.0,
            true,
            3.0,
            faint(0.24),
            Anchor::End,
        ),
    ]
}

/// `#rrggbb` to an opaque colour.
pub fn parse_hex(s: &str) -> Option<Rgba> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgba::rgb(channel(0)?, channel(2)?, channel(4)?))
}
