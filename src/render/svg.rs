use std::fmt::Write;

use crate::render::card::{Anchor, CardComposition, CORNER_RADIUS, RectShape, Rotation, Shape, TextRun};
use crate::render::policy::{Overlay, Rgba};
use crate::utils::text::xml_escape;

/// Serializes a composition to a standalone SVG document. The same string
/// backs the terminal preview file and the PNG export.
pub fn to_svg(card: &CardComposition) -> String {
    let (w, h) = (card.width, card.height);
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    out.push_str("<defs>\n");
    let _ = writeln!(
        out,
        r#"<clipPath id="card-clip"><rect width="{w}" height="{h}" rx="{r}" ry="{r}"/></clipPath>"#,
        r = num(CORNER_RADIUS)
    );
    if let Overlay::Gradient { from, via, to } = card.overlay() {
        let _ = writeln!(
            out,
            r#"<linearGradient id="overlay" x1="0" y1="1" x2="0" y2="0"><stop offset="0"{}/><stop offset="0.5"{}/><stop offset="1"{}/></linearGradient>"#,
            stop(from),
            stop(via),
            stop(to)
        );
    }
    out.push_str("</defs>\n");
    out.push_str("<g clip-path=\"url(#card-clip)\">\n");

    let _ = writeln!(out, r#"<rect width="{w}" height="{h}"{}/>"#, paint("fill", card.placeholder));
    if !card.image.is_empty() {
        let _ = writeln!(
            out,
            r#"<image x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"/>"#,
            xml_escape(&card.image)
        );
    }

    match card.overlay() {
        Overlay::Solid(color) => {
            let _ = writeln!(out, r#"<rect width="{w}" height="{h}"{}/>"#, paint("fill", *color));
        }
        Overlay::Gradient { .. } => {
            let _ = writeln!(out, r#"<rect width="{w}" height="{h}" fill="url(#overlay)"/>"#);
        }
        Overlay::Multiply(color) => {
            let _ = writeln!(
                out,
                r#"<rect width="{w}" height="{h}"{} style="mix-blend-mode:multiply"/>"#,
                paint("fill", *color)
            );
        }
    }

    for element in &card.elements {
        match &element.shape {
            Shape::Text(run) => write_text(&mut out, run),
            Shape::Rect(rect) => write_rect(&mut out, rect),
        }
    }

    out.push_str("</g>\n</svg>\n");
    out
}

fn write_text(out: &mut String, run: &TextRun) {
    let anchor = match run.anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    };
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" text-anchor="{}""#,
        num(run.x),
        num(run.y),
        run.font.family(),
        num(run.size),
        run.weight,
        anchor
    );
    if run.italic {
        out.push_str(r#" font-style="italic""#);
    }
    if run.letter_spacing != 0.0 {
        let _ = write!(out, r#" letter-spacing="{}""#, num(run.letter_spacing));
    }
    out.push_str(&paint("fill", run.color));
    out.push_str(&transform(run.rotate));
    let _ = writeln!(out, ">{}</text>", xml_escape(&run.text));
}

fn write_rect(out: &mut String, rect: &RectShape) {
    let _ = write!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}""#,
        num(rect.x),
        num(rect.y),
        num(rect.width),
        num(rect.height)
    );
    if rect.radius > 0.0 {
        let _ = write!(out, r#" rx="{0}" ry="{0}""#, num(rect.radius));
    }
    match rect.fill {
        Some(fill) => out.push_str(&paint("fill", fill)),
        None => out.push_str(r#" fill="none""#),
    }
    if let Some((color, width)) = rect.stroke {
        out.push_str(&paint("stroke", color));
        let _ = write!(out, r#" stroke-width="{}""#, num(width));
    }
    out.push_str(&transform(rect.rotate));
    out.push_str("/>\n");
}

/// ` fill="#rrggbb" fill-opacity=".."`, the opacity only when not opaque.
fn paint(attr: &str, color: Rgba) -> String {
    if color.a >= 1.0 {
        format!(r#" {}="{}""#, attr, color.hex())
    } else {
        format!(r#" {0}="{1}" {0}-opacity="{2}""#, attr, color.hex(), num(color.a))
    }
}

fn stop(color: &Rgba) -> String {
    format!(r#" stop-color="{}" stop-opacity="{}""#, color.hex(), num(color.a))
}

fn transform(rotate: Option<Rotation>) -> String {
    match rotate {
        Some(r) if r.degrees != 0.0 => format!(
            r#" transform="rotate({} {} {})""#,
            num(r.degrees),
            num(r.cx),
            num(r.cy)
        ),
        _ => String::new(),
    }
}

/// Two decimals at most, no trailing zeros.
fn num(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{CardContent, LayoutVariant, NarrativeStyle};
    use crate::render::card::render_card;

    fn content(title: &str) -> CardContent {
        CardContent {
            title: title.to_string(),
            subtitle: "副标题".to_string(),
            body: vec!["正文。".to_string()],
            layout: LayoutVariant::Hero,
            image_prompt: "x".to_string(),
            accent_text: None,
            is_dark_background: None,
        }
    }

    #[test]
    fn test_svg_is_deterministic() {
        let card = render_card(&content("标题"), &"data:image/png;base64,AAAA".to_string(), NarrativeStyle::Modern, "#123456", 0);
        assert_eq!(to_svg(&card), to_svg(&card.clone()));
    }

    #[test]
    fn test_svg_clips_rounded_canvas() {
        let card = render_card(&content("标题"), &String::new(), NarrativeStyle::Dark, "#123456", 0);
        let svg = to_svg(&card);
        assert!(svg.contains(r#"width="450" height="800" viewBox="0 0 450 800""#));
        assert!(svg.contains(r#"rx="48" ry="48""#));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_svg_escapes_text() {
        let card = render_card(&content("A<B & C"), &String::new(), NarrativeStyle::Dark, "#123456", 0);
        let svg = to_svg(&card);
        assert!(svg.contains("A&lt;B &amp; C"));
        assert!(!svg.contains("A<B"));
    }

    #[test]
    fn test_svg_overlays() {
        let modern = to_svg(&render_card(&content("t"), &String::new(), NarrativeStyle::Modern, "#000000", 0));
        assert!(modern.contains("<linearGradient id=\"overlay\""));
        let vibrant = to_svg(&render_card(&content("t"), &String::new(), NarrativeStyle::Vibrant, "#000000", 0));
        assert!(vibrant.contains("mix-blend-mode:multiply"));
        assert!(vibrant.contains("rotate(-1 "));
    }

    #[test]
    fn test_svg_embeds_image() {
        let url = "data:image/png;base64,AAAA".to_string();
        let svg = to_svg(&render_card(&content("t"), &url, NarrativeStyle::Elegant, "#000000", 0));
        assert!(svg.contains(r#"preserveAspectRatio="xMidYMid slice" xlink:href="data:image/png;base64,AAAA""#));
    }

    #[test]
    fn test_num() {
        assert_eq!(num(48.0), "48");
        assert_eq!(num(32.5), "32.5");
        assert_eq!(num(-0.0001), "0");
    }
}
