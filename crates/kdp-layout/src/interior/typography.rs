//! Age-tiered text styles, line wrapping and caption truncation

use crate::constants::LEADING_FACTOR;
use crate::render::{Color, StandardFont};
use crate::types::{AgeGroup, Alignment, ChapterFormatting};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f32,
    pub leading: f32,
    pub space_after: f32,
    pub alignment: Alignment,
    pub color: Color,
}

impl TextStyle {
    fn new(font: StandardFont, size: f32, space_after: f32, alignment: Alignment) -> Self {
        Self {
            font,
            size,
            leading: size * LEADING_FACTOR,
            space_after,
            alignment,
            color: Color::BLACK,
        }
    }
}

/// Title, body and caption styles for one age group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSet {
    pub title: TextStyle,
    pub body: TextStyle,
    pub caption: TextStyle,
}

/// (title, body, caption) point sizes
pub fn font_sizes(age_group: AgeGroup) -> (f32, f32, f32) {
    match age_group {
        AgeGroup::Toddler => (24.0, 16.0, 12.0),
        AgeGroup::Preschool => (22.0, 14.0, 11.0),
        AgeGroup::EarlyReader => (20.0, 12.0, 10.0),
        AgeGroup::MiddleGrade => (18.0, 11.0, 9.0),
    }
}

impl StyleSet {
    /// Default Helvetica styles for an age group
    pub fn for_age(age_group: AgeGroup) -> Self {
        let (title, body, caption) = font_sizes(age_group);
        Self {
            title: TextStyle::new(StandardFont::HelveticaBold, title, title, Alignment::Center),
            body: TextStyle::new(StandardFont::Helvetica, body, body / 2.0, Alignment::Left),
            caption: TextStyle::new(
                StandardFont::HelveticaOblique,
                caption,
                caption,
                Alignment::Center,
            ),
        }
    }

    /// Age styles with template fonts, alignment and text color applied
    pub fn with_formatting(self, formatting: &ChapterFormatting) -> Self {
        let color = Color::from_hex_or(&formatting.color_scheme.text, Color::BLACK);
        let mut styles = self;

        styles.title.font = StandardFont::resolve(&formatting.title_font, self.title.font);
        styles.title.alignment = formatting.title_alignment;
        styles.title.color = color;

        styles.body.font = StandardFont::resolve(&formatting.body_font, self.body.font);
        styles.body.alignment = formatting.body_alignment;
        styles.body.color = color;

        styles.caption.font = StandardFont::resolve(&formatting.caption_font, self.caption.font);
        styles.caption.color = color;

        styles
    }
}

/// Greedy word wrap by measured width.
///
/// Single newlines force a break. Words wider than `max_width` are split
/// between characters.
pub fn wrap_text(text: &str, font: StandardFont, size: f32, max_width: f32) -> Vec<String> {
    let space = font.text_width(" ", size);
    let mut lines = Vec::new();

    for source_line in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in source_line.split_whitespace() {
            let word_width = font.text_width(word, size);

            if !current.is_empty() && current_width + space + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                let mut pieces = split_long_word(word, font, size, max_width);
                let last = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
                current_width = font.text_width(&last, size);
                current = last;
            }
        }

        lines.push(current);
    }

    lines
}

fn split_long_word(word: &str, font: StandardFont, size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0;
    for c in word.chars() {
        let w = font.char_width(c) as f32 * size / 1000.0;
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    pieces.push(piece);
    pieces
}

/// Cut a caption to `max_len` characters, ending in "..." when shortened
pub fn truncate_caption(caption: &str, max_len: usize) -> String {
    if caption.chars().count() <= max_len {
        return caption.to_string();
    }
    let kept: String = caption.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}
