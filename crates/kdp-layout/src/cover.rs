//! Wraparound cover generation
//!
//! One page holds the back cover, the spine and the front cover side by
//! side, with bleed on the outer edges. Section backgrounds run into the
//! bleed so nothing white is left after trimming.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::*;
use crate::dimensions::{CoverDimensions, DimensionCalculator, RectPt};
use crate::image_fit::try_fit_image;
use crate::options::LayoutOptions;
use crate::render::{Canvas, Color, PageBoxes, PdfBuilder, StandardFont};
use crate::types::*;

/// Primary and secondary cover colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
}

type PaletteSpec = (&'static str, &'static str);

const CHILDREN_PALETTES: [PaletteSpec; 5] = [
    ("#FF9900", "#FFCC00"),
    ("#66CCFF", "#3399FF"),
    ("#FF6699", "#FF99CC"),
    ("#99CC33", "#CCFF66"),
    ("#9966CC", "#CC99FF"),
];

const FANTASY_PALETTES: [PaletteSpec; 5] = [
    ("#4B0082", "#9370DB"),
    ("#191970", "#4169E1"),
    ("#006400", "#32CD32"),
    ("#8B0000", "#DC143C"),
    ("#4B0082", "#800080"),
];

const EDUCATIONAL_PALETTES: [PaletteSpec; 5] = [
    ("#1E90FF", "#ADD8E6"),
    ("#2E8B57", "#90EE90"),
    ("#FF8C00", "#FFDAB9"),
    ("#4682B4", "#B0C4DE"),
    ("#CD853F", "#F5DEB3"),
];

/// 64-bit FNV-1a; stable across runs and platforms
fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

fn to_palette((primary, secondary): PaletteSpec) -> Palette {
    Palette {
        primary: Color::from_hex_or(primary, Color::BLACK),
        secondary: Color::from_hex_or(secondary, Color::WHITE),
    }
}

/// Palette for a book theme.
///
/// Themes naming a palette family pick one of its entries by a stable hash
/// of the theme; anything else gets the first children's palette.
pub fn palette_for_theme(theme: &str) -> Palette {
    let key = theme.trim().to_lowercase();
    let family = match key.as_str() {
        "children" => &CHILDREN_PALETTES,
        "fantasy" => &FANTASY_PALETTES,
        "educational" => &EDUCATIONAL_PALETTES,
        _ => return to_palette(CHILDREN_PALETTES[0]),
    };
    let index = (fnv1a(&key) % family.len() as u64) as usize;
    to_palette(family[index])
}

#[derive(Clone)]
pub struct CoverComposer {
    calculator: Arc<DimensionCalculator>,
    options: LayoutOptions,
}

fn f(v: f64) -> f32 {
    v as f32
}

impl CoverComposer {
    pub fn new(calculator: Arc<DimensionCalculator>, options: LayoutOptions) -> Self {
        Self {
            calculator,
            options,
        }
    }

    pub fn cover_dimensions(&self, metadata: &BookMetadata) -> CoverDimensions {
        self.calculator.cover_dimensions(
            metadata.trim_size,
            metadata.page_count,
            self.options.paper_type,
        )
    }

    /// Render the cover in `style` and write it to `output_path`.
    ///
    /// A photo cover without a usable image, or any failure while drawing a
    /// non-simple style, falls back to the simple style.
    pub fn generate_cover(
        &self,
        metadata: &BookMetadata,
        cover_image: Option<&Path>,
        style: CoverStyle,
        output_path: &Path,
    ) -> Result<PathBuf> {
        log::info!("Generating {} cover for book: {}", style, metadata.title);
        let dims = self.cover_dimensions(metadata);

        let mut effective = style;
        if style == CoverStyle::Photo && !cover_image.is_some_and(Path::is_file) {
            log::warn!("No cover image provided for photo cover style. Using simple style instead.");
            effective = CoverStyle::Simple;
        }

        let builder = match self.render(effective, metadata, &dims, cover_image) {
            Ok(builder) => builder,
            Err(e) if effective != CoverStyle::Simple => {
                log::error!("Error creating {} cover: {}; using simple style", effective, e);
                self.render(CoverStyle::Simple, metadata, &dims, cover_image)?
            }
            Err(e) => return Err(e),
        };

        builder.save(&self.options.temp_dir(), output_path)?;
        log::info!("Cover generated successfully: {}", output_path.display());
        Ok(output_path.to_path_buf())
    }

    fn render(
        &self,
        style: CoverStyle,
        metadata: &BookMetadata,
        dims: &CoverDimensions,
        cover_image: Option<&Path>,
    ) -> Result<PdfBuilder> {
        let mut builder = PdfBuilder::new(self.options.jpeg_quality);
        builder.set_info(&metadata.title, &metadata.author);
        let mut canvas = Canvas::new(f(dims.full_width_pt), f(dims.full_height_pt));
        let palette = palette_for_theme(&metadata.theme);

        match style {
            CoverStyle::Simple => {
                self.draw_simple(&mut canvas, &mut builder, metadata, dims, palette, cover_image)?
            }
            CoverStyle::Gradient => self.draw_gradient(&mut canvas, metadata, dims, palette),
            CoverStyle::Photo => {
                let path = cover_image.ok_or_else(|| {
                    LayoutError::Composition("photo cover needs an image".to_string())
                })?;
                self.draw_photo(&mut canvas, &mut builder, metadata, dims, path)?
            }
        }

        if self.options.debug_guides {
            draw_guides(&mut canvas, dims);
        }

        builder.add_page(
            canvas,
            PageBoxes::new(
                f(dims.full_width_pt),
                f(dims.full_height_pt),
                f(dims.page.bleed_pt),
            ),
        )?;
        Ok(builder)
    }

    fn draw_simple(
        &self,
        canvas: &mut Canvas,
        builder: &mut PdfBuilder,
        metadata: &BookMetadata,
        dims: &CoverDimensions,
        palette: Palette,
        cover_image: Option<&Path>,
    ) -> Result<()> {
        fill(canvas, dims.back_with_bleed(), palette.secondary);
        fill(canvas, dims.spine_with_bleed(), palette.primary);

        let front = dims.front_with_bleed();
        let front_image = cover_image.and_then(|path| {
            let (w, h) = self.rect_px(front);
            try_fit_image(path, w, h)
                .map_err(|e| log::error!("Error using cover image {}: {}", path.display(), e))
                .ok()
        });
        match front_image {
            Some(img) => {
                let handle = builder.add_image(&img)?;
                canvas.draw_image(handle, f(front.x), f(front.y), f(front.width), f(front.height));
            }
            None => fill(canvas, front, palette.primary),
        }

        self.front_text(canvas, metadata, dims, false);
        self.spine_text(canvas, metadata, dims);
        draw_barcode(canvas, dims);
        Ok(())
    }

    /// Vertical bands from primary (bottom) to secondary (top) across the
    /// whole wraparound
    fn draw_gradient(
        &self,
        canvas: &mut Canvas,
        metadata: &BookMetadata,
        dims: &CoverDimensions,
        palette: Palette,
    ) {
        let steps = self.options.gradient_steps.max(1);
        let width = f(dims.full_width_pt);
        let height = f(dims.full_height_pt);
        let band = height / steps as f32;

        for i in 0..steps {
            let ratio = if steps > 1 {
                i as f32 / (steps - 1) as f32
            } else {
                0.0
            };
            let color = palette.primary.lerp(palette.secondary, ratio);
            // Slight overlap hides seams between bands
            let overlap = if i + 1 < steps { 0.5 } else { 0.0 };
            canvas.fill_rect(0.0, i as f32 * band, width, band + overlap, color);
        }

        self.front_text(canvas, metadata, dims, false);
        self.spine_text(canvas, metadata, dims);
        draw_barcode(canvas, dims);
    }

    fn draw_photo(
        &self,
        canvas: &mut Canvas,
        builder: &mut PdfBuilder,
        metadata: &BookMetadata,
        dims: &CoverDimensions,
        cover_image: &Path,
    ) -> Result<()> {
        let full = RectPt::new(0.0, 0.0, dims.full_width_pt, dims.full_height_pt);
        let (w, h) = self.rect_px(full);
        let img = try_fit_image(cover_image, w, h)?;
        let handle = builder.add_image(&img)?;
        canvas.draw_image(handle, 0.0, 0.0, f(full.width), f(full.height));

        self.front_text(canvas, metadata, dims, true);

        let spine = dims.spine;
        canvas.save_state();
        canvas.set_fill_alpha(0.5);
        canvas.fill_rect(
            f(spine.x),
            f(spine.y),
            f(spine.width),
            f(spine.height),
            Color::BLACK,
        );
        canvas.restore_state();
        self.spine_text(canvas, metadata, dims);
        Ok(())
    }

    fn rect_px(&self, rect: RectPt) -> (u32, u32) {
        let dpi = self.calculator.dpi();
        (
            pt_to_px(rect.width, dpi).max(1),
            pt_to_px(rect.height, dpi).max(1),
        )
    }

    /// Title and "By author" centered on the front cover
    fn front_text(
        &self,
        canvas: &mut Canvas,
        metadata: &BookMetadata,
        dims: &CoverDimensions,
        shadow: bool,
    ) {
        let (cx, cy) = dims.front.center();
        let (cx, title_y) = (f(cx), f(cy));
        let author_y = title_y - COVER_AUTHOR_OFFSET_PT;
        let author = format!("By {}", metadata.author);

        let lines = [
            (&metadata.title, StandardFont::HelveticaBold, COVER_TITLE_FONT_SIZE, title_y),
            (&author, StandardFont::Helvetica, COVER_AUTHOR_FONT_SIZE, author_y),
        ];
        for (text, font, size, y) in lines {
            if shadow {
                canvas.text_centered(
                    cx + SHADOW_OFFSET_PT,
                    y - SHADOW_OFFSET_PT,
                    font,
                    size,
                    Color::BLACK,
                    text,
                );
            }
            canvas.text_centered(cx, y, font, size, Color::WHITE, text);
        }
    }

    fn spine_text(&self, canvas: &mut Canvas, metadata: &BookMetadata, dims: &CoverDimensions) {
        let size = if dims.spine_width_pt > self.options.spine_text_threshold_pt {
            SPINE_FONT_SIZE_LARGE
        } else {
            SPINE_FONT_SIZE_SMALL
        };
        let (cx, cy) = dims.spine.center();
        canvas.text_rotated_centered(
            f(cx),
            f(cy),
            StandardFont::HelveticaBold,
            size,
            Color::WHITE,
            &metadata.title,
        );
    }
}

fn fill(canvas: &mut Canvas, rect: RectPt, color: Color) {
    canvas.fill_rect(f(rect.x), f(rect.y), f(rect.width), f(rect.height), color);
}

/// Barcode area: a white box measured from the back cover's trim corner
fn draw_barcode(canvas: &mut Canvas, dims: &CoverDimensions) {
    let x = f(dims.back.x) + BARCODE_INSET_PT;
    let y = f(dims.back.y) + BARCODE_INSET_PT;
    canvas.fill_stroke_rect(
        x,
        y,
        BARCODE_WIDTH_PT,
        BARCODE_HEIGHT_PT,
        Color::WHITE,
        Color::BLACK,
        1.0,
    );
    canvas.text_centered(
        x + BARCODE_WIDTH_PT / 2.0,
        y + BARCODE_HEIGHT_PT / 2.0,
        StandardFont::Helvetica,
        BARCODE_LABEL_FONT_SIZE,
        Color::BLACK,
        "Barcode Placeholder",
    );
}

/// Dashed red outlines of the media edge and the trim line
fn draw_guides(canvas: &mut Canvas, dims: &CoverDimensions) {
    let dash = Some((1.0, 2.0));
    canvas.stroke_rect(
        0.0,
        0.0,
        f(dims.full_width_pt),
        f(dims.full_height_pt),
        Color::RED,
        0.5,
        dash,
    );
    let trim = dims.trim_rect();
    canvas.stroke_rect(
        f(trim.x),
        f(trim.y),
        f(trim.width),
        f(trim.height),
        Color::RED,
        0.5,
        dash,
    );
}
