//! Drawing surface for one PDF page
//!
//! A `Canvas` records content-stream operations and the resources they
//! name. Nothing touches a `Document` until the page is added through
//! [`PdfBuilder::add_page`](super::PdfBuilder::add_page).

use lopdf::content::Operation;
use lopdf::{Object, ObjectId, StringFormat};
use std::collections::{BTreeMap, BTreeSet};

use super::color::Color;
use super::fonts::{StandardFont, encode_win_ansi};

/// Image XObject already stored in the output document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle {
    pub(crate) id: ObjectId,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageHandle {
    /// Width over height in pixels
    pub fn aspect(&self) -> f32 {
        self.width_px as f32 / self.height_px.max(1) as f32
    }
}

pub struct Canvas {
    width: f32,
    height: f32,
    ops: Vec<Operation>,
    pub(crate) fonts: BTreeSet<StandardFont>,
    pub(crate) images: BTreeMap<String, ObjectId>,
    /// Fill alpha in thousandths, keyed by resource name
    pub(crate) alphas: BTreeMap<String, u16>,
}

pub(crate) fn font_resource_name(font: StandardFont) -> String {
    format!("F{}", font as u8 + 1)
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            fonts: BTreeSet::new(),
            images: BTreeMap::new(),
            alphas: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub(crate) fn into_operations(self) -> Vec<Operation> {
        self.ops
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    pub fn save_state(&mut self) {
        self.op("q", vec![]);
    }

    pub fn restore_state(&mut self) {
        self.op("Q", vec![]);
    }

    fn fill_color(&mut self, color: Color) {
        self.op("rg", vec![real(color.r), real(color.g), real(color.b)]);
    }

    fn stroke_color(&mut self, color: Color) {
        self.op("RG", vec![real(color.r), real(color.g), real(color.b)]);
    }

    /// Fill alpha for subsequent painting; wrap in save/restore to scope it
    pub fn set_fill_alpha(&mut self, alpha: f32) {
        let permille = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u16;
        let name = format!("GS{permille}");
        self.alphas.insert(name.clone(), permille);
        self.op("gs", vec![Object::Name(name.into_bytes())]);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.fill_color(color);
        self.op("re", vec![real(x), real(y), real(w), real(h)]);
        self.op("f", vec![]);
    }

    /// Filled rectangle with an outline
    #[allow(clippy::too_many_arguments)]
    pub fn fill_stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        fill: Color,
        stroke: Color,
        line_width: f32,
    ) {
        self.fill_color(fill);
        self.stroke_color(stroke);
        self.op("w", vec![real(line_width)]);
        self.op("re", vec![real(x), real(y), real(w), real(h)]);
        self.op("B", vec![]);
    }

    /// Rectangle outline, optionally dashed as (on, off) lengths
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
        line_width: f32,
        dash: Option<(f32, f32)>,
    ) {
        self.save_state();
        self.stroke_color(color);
        self.op("w", vec![real(line_width)]);
        if let Some((on, off)) = dash {
            self.op(
                "d",
                vec![Object::Array(vec![real(on), real(off)]), Object::Integer(0)],
            );
        }
        self.op("re", vec![real(x), real(y), real(w), real(h)]);
        self.op("S", vec![]);
        self.restore_state();
    }

    fn begin_text(&mut self, font: StandardFont, size: f32, color: Color) {
        self.fonts.insert(font);
        self.op("BT", vec![]);
        self.fill_color(color);
        self.op(
            "Tf",
            vec![
                Object::Name(font_resource_name(font).into_bytes()),
                real(size),
            ],
        );
    }

    fn show_text(&mut self, text: &str) {
        self.op(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        );
    }

    /// Text with its baseline starting at (x, y)
    pub fn text(&mut self, x: f32, y: f32, font: StandardFont, size: f32, color: Color, text: &str) {
        self.begin_text(font, size, color);
        self.op("Td", vec![real(x), real(y)]);
        self.show_text(text);
        self.op("ET", vec![]);
    }

    /// Text horizontally centered on `cx`
    pub fn text_centered(
        &mut self,
        cx: f32,
        y: f32,
        font: StandardFont,
        size: f32,
        color: Color,
        text: &str,
    ) {
        let width = font.text_width(text, size);
        self.text(cx - width / 2.0, y, font, size, color, text);
    }

    /// Text with extra spacing added at every space character
    #[allow(clippy::too_many_arguments)]
    pub fn text_word_spaced(
        &mut self,
        x: f32,
        y: f32,
        font: StandardFont,
        size: f32,
        color: Color,
        word_spacing: f32,
        text: &str,
    ) {
        self.begin_text(font, size, color);
        self.op("Tw", vec![real(word_spacing)]);
        self.op("Td", vec![real(x), real(y)]);
        self.show_text(text);
        self.op("Tw", vec![real(0.0)]);
        self.op("ET", vec![]);
    }

    /// Text rotated 90° counter-clockwise, centered on (cx, cy)
    pub fn text_rotated_centered(
        &mut self,
        cx: f32,
        cy: f32,
        font: StandardFont,
        size: f32,
        color: Color,
        text: &str,
    ) {
        let width = font.text_width(text, size);
        // Shift the baseline right so glyph bodies straddle the center line
        let x = cx + 0.35 * size;
        let y = cy - width / 2.0;
        self.begin_text(font, size, color);
        self.op(
            "Tm",
            vec![
                real(0.0),
                real(1.0),
                real(-1.0),
                real(0.0),
                real(x),
                real(y),
            ],
        );
        self.show_text(text);
        self.op("ET", vec![]);
    }

    /// Paint an image XObject into the given rectangle
    pub fn draw_image(&mut self, image: ImageHandle, x: f32, y: f32, w: f32, h: f32) {
        let name = format!("Im{}", image.id.0);
        self.images.insert(name.clone(), image.id);
        self.save_state();
        self.op(
            "cm",
            vec![real(w), real(0.0), real(0.0), real(h), real(x), real(y)],
        );
        self.op("Do", vec![Object::Name(name.into_bytes())]);
        self.restore_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_registers_font() {
        let mut canvas = Canvas::new(100.0, 100.0);
        canvas.text(10.0, 10.0, StandardFont::HelveticaBold, 12.0, Color::BLACK, "Hi");
        assert!(canvas.fonts.contains(&StandardFont::HelveticaBold));
        assert_eq!(font_resource_name(StandardFont::Helvetica), "F1");
    }

    #[test]
    fn test_alpha_registers_gstate() {
        let mut canvas = Canvas::new(100.0, 100.0);
        canvas.set_fill_alpha(0.5);
        assert_eq!(canvas.alphas.get("GS500"), Some(&500));
    }
}
