/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json").trim_end_matches("```").trim().to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```").trim_end_matches("```").trim().to_string()
    } else {
        s.to_string()
    }
}

/// Advance of one glyph in ems. Wide (CJK, fullwidth) glyphs take a full em.
fn char_advance_em(c: char) -> f32 {
    if is_wide(c) {
        1.0
    } else if c == ' ' {
        0.3
    } else {
        0.55
    }
}

fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD
    )
}

/// Estimated rendered width in pixels. Layout only needs a stable
/// approximation, not exact shaping.
pub fn estimate_width(text: &str, font_size: f32, letter_spacing: f32) -> f32 {
    let count = text.chars().count();
    if count == 0 {
        return 0.0;
    }
    let advance: f32 = text.chars().map(char_advance_em).sum::<f32>() * font_size;
    advance + letter_spacing * (count - 1) as f32
}

/// Greedy line breaking. Wide glyphs may break anywhere; runs of narrow
/// glyphs break at spaces unless a single word overflows on its own.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32, letter_spacing: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for token in tokenize(text) {
        let candidate = format!("{}{}", current, token);
        if current.is_empty() || estimate_width(&candidate, font_size, letter_spacing) <= max_width {
            current = candidate;
        } else {
            lines.push(current.trim_end().to_string());
            current = token.trim_start().to_string();
        }

        // A single overlong token is split by characters.
        while current.chars().count() > 1
            && estimate_width(current.trim_end(), font_size, letter_spacing) > max_width
        {
            let (head, tail) = split_at_width(&current, max_width, font_size, letter_spacing);
            lines.push(head);
            current = tail;
        }
    }

    if !current.trim().is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}

/// Longest non-empty prefix that fits, and the remainder.
fn split_at_width(s: &str, max_width: f32, font_size: f32, letter_spacing: f32) -> (String, String) {
    let mut head = String::new();
    for (i, c) in s.char_indices() {
        let next = format!("{}{}", head, c);
        if !head.is_empty() && estimate_width(&next, font_size, letter_spacing) > max_width {
            return (head, s[i..].to_string());
        }
        head = next;
    }
    (head, String::new())
}

/// Splits into wide glyphs individually and narrow words with their trailing space.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if is_wide(c) {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            tokens.push(c.to_string());
        } else if c == ' ' {
            word.push(c);
            tokens.push(std::mem::take(&mut word));
        } else if c != '\n' && c != '\r' {
            word.push(c);
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

/// Escapes text for use in XML character data and attribute values.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
