//! Top-to-bottom flow of text blocks and images across interior pages

use image::RgbImage;

use super::typography::{TextStyle, wrap_text};
use crate::constants::{MIN_ILLUSTRATION_SCALE, PAGE_NUMBER_FONT_SIZE};
use crate::dimensions::Dimensions;
use crate::render::{Canvas, Color, ImageHandle, PageBoxes, PdfBuilder, StandardFont};
use crate::types::{Alignment, Result};

/// Content area of a page, in points from the bottom-left media corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Frame {
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

struct OpenPage {
    canvas: Canvas,
    numbered: bool,
}

pub struct PageFlow {
    builder: PdfBuilder,
    boxes: PageBoxes,
    frame: Frame,
    /// Page-number baseline, centered in the bottom margin
    number_y: f32,
    current: Option<OpenPage>,
    cursor_y: f32,
    page_numbering: bool,
}

impl PageFlow {
    pub fn new(builder: PdfBuilder, dims: &Dimensions) -> Self {
        let (left, right, top, bottom) = dims.interior_margins_pt();
        let width = dims.width_with_bleed_pt as f32;
        let height = dims.height_with_bleed_pt as f32;
        let frame = Frame {
            left: left as f32,
            right: width - right as f32,
            top: height - top as f32,
            bottom: bottom as f32,
        };
        let bleed = dims.bleed_pt as f32;

        Self {
            builder,
            boxes: PageBoxes::new(width, height, bleed),
            frame,
            number_y: bleed + (frame.bottom - bleed) / 2.0 - PAGE_NUMBER_FONT_SIZE / 3.0,
            current: None,
            cursor_y: frame.top,
            page_numbering: false,
        }
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Pages finished so far
    pub fn page_count(&self) -> usize {
        self.builder.page_count()
    }

    /// Number pages opened from now on
    pub fn set_page_numbering(&mut self, on: bool) {
        self.page_numbering = on;
    }

    pub fn add_image(&mut self, img: &RgbImage) -> Result<ImageHandle> {
        self.builder.add_image(img)
    }

    fn canvas(&mut self) -> &mut Canvas {
        let numbered = self.page_numbering;
        let boxes = self.boxes;
        if self.current.is_none() {
            self.cursor_y = self.frame.top;
        }
        &mut self
            .current
            .get_or_insert_with(|| OpenPage {
                canvas: Canvas::new(boxes.width, boxes.height),
                numbered,
            })
            .canvas
    }

    fn has_open_page(&self) -> bool {
        self.current.is_some()
    }

    fn remaining(&self) -> f32 {
        if self.has_open_page() {
            self.cursor_y - self.frame.bottom
        } else {
            self.frame.height()
        }
    }

    fn at_top(&self) -> bool {
        !self.has_open_page() || self.cursor_y >= self.frame.top
    }

    /// Close the current page, if any content was placed on it
    pub fn page_break(&mut self) -> Result<()> {
        if let Some(page) = self.current.take() {
            let mut canvas = page.canvas;
            if page.numbered {
                let number = (self.builder.page_count() + 1).to_string();
                canvas.text_centered(
                    self.frame.center_x(),
                    self.number_y,
                    StandardFont::Helvetica,
                    PAGE_NUMBER_FONT_SIZE,
                    Color::DARK_GRAY,
                    &number,
                );
            }
            self.builder.add_page(canvas, self.boxes)?;
        }
        self.cursor_y = self.frame.top;
        Ok(())
    }

    /// Emit an empty page
    pub fn blank_page(&mut self) -> Result<()> {
        self.page_break()?;
        self.builder.add_page(
            Canvas::new(self.boxes.width, self.boxes.height),
            self.boxes,
        )?;
        Ok(())
    }

    pub fn spacer(&mut self, height: f32) {
        if !self.at_top() {
            self.cursor_y -= height;
        }
    }

    /// Wrap and place a paragraph, continuing on new pages as needed.
    ///
    /// Single newlines in `text` are hard line breaks.
    pub fn paragraph(&mut self, text: &str, style: &TextStyle) -> Result<()> {
        for source_line in text.split('\n') {
            let lines = wrap_text(source_line, style.font, style.size, self.frame.width());
            let last = lines.len().saturating_sub(1);

            for (i, line) in lines.iter().enumerate() {
                if self.remaining() < style.leading && !self.at_top() {
                    self.page_break()?;
                }
                let frame = self.frame;
                let baseline = self.cursor_y_for_line(style);
                let justify = style.alignment == Alignment::Justified && i != last;
                draw_line(self.canvas(), &frame, baseline, line, style, justify);
                self.cursor_y -= style.leading;
            }
        }

        self.cursor_y -= style.space_after;
        Ok(())
    }

    fn cursor_y_for_line(&mut self, style: &TextStyle) -> f32 {
        // Open the page first so the cursor is reset for a fresh page
        self.canvas();
        self.cursor_y - style.size
    }

    /// Place an image `width` points wide, centered, keeping its aspect ratio.
    ///
    /// Images taller than the frame are scaled down. When the image does not
    /// fit the space left it is shrunk if most of it fits, otherwise it moves
    /// to a fresh page. Returns the rectangle used as (x, y, w, h).
    pub fn image(&mut self, image: ImageHandle, width: f32) -> Result<(f32, f32, f32, f32)> {
        let aspect = image.aspect();
        let mut w = width.min(self.frame.width());
        let mut h = w / aspect;

        if h > self.frame.height() {
            h = self.frame.height();
            w = h * aspect;
        }

        let remaining = self.remaining();
        if h > remaining {
            if remaining >= h * MIN_ILLUSTRATION_SCALE {
                h = remaining;
                w = h * aspect;
            } else {
                self.page_break()?;
            }
        }

        self.canvas();
        let x = self.frame.center_x() - w / 2.0;
        let y = self.cursor_y - h;
        self.canvas().draw_image(image, x, y, w, h);
        self.cursor_y = y;
        Ok((x, y, w, h))
    }

    /// Place an image centered both ways in the frame on a page of its own,
    /// leaving `reserve` points below it for a caption
    pub fn full_page_image(
        &mut self,
        image: ImageHandle,
        width: f32,
        reserve: f32,
    ) -> Result<(f32, f32, f32, f32)> {
        self.page_break()?;
        let aspect = image.aspect();
        let available = (self.frame.height() - reserve).max(1.0);
        let mut w = width.min(self.frame.width());
        let mut h = w / aspect;
        if h > available {
            h = available;
            w = h * aspect;
        }

        let x = self.frame.center_x() - w / 2.0;
        let y = self.frame.bottom + reserve + (available - h) / 2.0;
        self.canvas().draw_image(image, x, y, w, h);
        self.cursor_y = y;
        Ok((x, y, w, h))
    }

    /// Direct access to the open page for decorations
    pub fn decorate(&mut self) -> &mut Canvas {
        self.canvas()
    }

    /// Close the last page and hand back the builder
    pub fn finish(mut self) -> Result<PdfBuilder> {
        self.page_break()?;
        Ok(self.builder)
    }
}

fn draw_line(
    canvas: &mut Canvas,
    frame: &Frame,
    baseline: f32,
    line: &str,
    style: &TextStyle,
    justify: bool,
) {
    let width = style.font.text_width(line, style.size);
    match style.alignment {
        Alignment::Left => {
            canvas.text(frame.left, baseline, style.font, style.size, style.color, line)
        }
        Alignment::Center => canvas.text(
            frame.center_x() - width / 2.0,
            baseline,
            style.font,
            style.size,
            style.color,
            line,
        ),
        Alignment::Right => canvas.text(
            frame.right - width,
            baseline,
            style.font,
            style.size,
            style.color,
            line,
        ),
        Alignment::Justified => {
            let gaps = line.matches(' ').count();
            if justify && gaps > 0 {
                let spacing = (frame.width() - width) / gaps as f32;
                canvas.text_word_spaced(
                    frame.left,
                    baseline,
                    style.font,
                    style.size,
                    style.color,
                    spacing.max(0.0),
                    line,
                );
            } else {
                canvas.text(frame.left, baseline, style.font, style.size, style.color, line);
            }
        }
    }
}
