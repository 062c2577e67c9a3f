//! Text measurement for the PDF base-14 fonts and word wrapping.
//!
//! The native engine only draws with the standard Helvetica, Times and
//! Courier faces, so measuring uses the Helvetica AFM advance widths for
//! ASCII and simple ratios for the other faces.

use serde::{Deserialize, Serialize};

/// Generic font family, mapped to a base-14 face when drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
}

impl FontFamily {
    /// Map a CSS `font-family` list to a generic family.
    pub fn from_css(value: &str) -> Self {
        let value = value.to_ascii_lowercase();
        if value.contains("mono") || value.contains("courier") || value.contains("consolas") {
            FontFamily::Mono
        } else if value.contains("sans") || value.contains("helvetica") || value.contains("arial")
        {
            FontFamily::Sans
        } else if value.contains("serif") || value.contains("times") || value.contains("georgia")
        {
            FontFamily::Serif
        } else {
            FontFamily::Sans
        }
    }
}

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9 : ; < = > ?
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // @ A-O
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // P-Z [ \ ] ^ _
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // ` a-o
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // p-z { | } ~
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const DEFAULT_WIDTH: u16 = 556;
const MONO_WIDTH: f32 = 600.0;
const BOLD_FACTOR: f32 = 1.07;
const SERIF_FACTOR: f32 = 0.92;

fn helvetica_width(c: char) -> u16 {
    match c as u32 {
        code @ 0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
        0xA0 => HELVETICA_WIDTHS[0],
        _ => DEFAULT_WIDTH,
    }
}

/// Width of `text` in points.
pub fn measure_text_width(text: &str, font_size: f32, family: FontFamily, bold: bool) -> f32 {
    let units: f32 = match family {
        FontFamily::Mono => text.chars().count() as f32 * MONO_WIDTH,
        FontFamily::Sans | FontFamily::Serif => {
            let base: f32 = text.chars().map(|c| helvetica_width(c) as f32).sum();
            let base = if family == FontFamily::Serif {
                base * SERIF_FACTOR
            } else {
                base
            };
            if bold {
                base * BOLD_FACTOR
            } else {
                base
            }
        }
    };
    units * font_size / 1000.0
}

/// Word-wrap text to fit within `max_width` points. Existing `\n` characters
/// start new lines; words wider than a whole line are split by character.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    family: FontFamily,
    bold: bool,
    max_width: f32,
) -> Vec<String> {
    let measure = |s: &str| measure_text_width(s, font_size, family, bold);
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            if measure(&candidate) <= max_width {
                current_line = candidate;
                continue;
            }

            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if measure(word) <= max_width {
                current_line = word.to_string();
                continue;
            }

            // Split an overlong word across as many lines as needed.
            for c in word.chars() {
                current_line.push(c);
                if measure(&current_line) > max_width && current_line.chars().count() > 1 {
                    current_line.pop();
                    lines.push(std::mem::take(&mut current_line));
                    current_line.push(c);
                }
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Line height in points.
pub fn line_height(font_size: f32, factor: f32) -> f32 {
    font_size * factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths() {
        // H e l l o = 722 + 556 + 222 + 222 + 556
        let w = measure_text_width("Hello", 10.0, FontFamily::Sans, false);
        assert!((w - 22.78).abs() < 0.01);
        assert!(measure_text_width("Hello", 10.0, FontFamily::Sans, true) > w);
    }

    #[test]
    fn courier_is_fixed_pitch() {
        let w = measure_text_width("iiii", 10.0, FontFamily::Mono, false);
        assert!((w - 24.0).abs() < 0.01);
    }

    #[test]
    fn word_wrap_basic() {
        let lines = wrap_text("Hello world foo bar", 16.0, FontFamily::Sans, false, 60.0);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        for line in &lines {
            assert!(measure_text_width(line, 16.0, FontFamily::Sans, false) <= 60.0);
        }
    }

    #[test]
    fn overlong_word_is_split() {
        let lines = wrap_text(&"W".repeat(40), 12.0, FontFamily::Sans, false, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "W".repeat(40));
    }

    #[test]
    fn explicit_breaks_start_new_lines() {
        let lines = wrap_text("one\ntwo", 12.0, FontFamily::Sans, false, 500.0);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn family_from_css() {
        assert_eq!(FontFamily::from_css("'Courier New', monospace"), FontFamily::Mono);
        assert_eq!(FontFamily::from_css("Georgia, serif"), FontFamily::Serif);
        assert_eq!(FontFamily::from_css("Arial, sans-serif"), FontFamily::Sans);
    }
}
