//! Shared constants for KDP print layout
//!
//! Physical measurements are in inches unless the name says otherwise.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Print resolution for rasterized artwork
pub const PRINT_DPI: u32 = 300;

/// Convert inches to points
#[inline]
pub fn in_to_pt(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

/// Convert inches to whole pixels at the given resolution
#[inline]
pub fn in_to_px(inches: f64, dpi: u32) -> u32 {
    (inches * dpi as f64).round() as u32
}

/// Convert points to whole pixels at the given resolution
#[inline]
pub fn pt_to_px(points: f64, dpi: u32) -> u32 {
    in_to_px(points / POINTS_PER_INCH, dpi)
}

// =============================================================================
// KDP Page Geometry
// =============================================================================

/// Bleed beyond the trim line on every outer edge
pub const BLEED_IN: f64 = 0.125;

pub const MARGIN_TOP_IN: f64 = 0.25;
pub const MARGIN_BOTTOM_IN: f64 = 0.25;

/// Gutter side
pub const MARGIN_INSIDE_IN: f64 = 0.375;
pub const MARGIN_OUTSIDE_IN: f64 = 0.25;

/// Inset from the trim line for critical content
pub const SAFE_ZONE_IN: f64 = 0.25;

// =============================================================================
// Page Count & Spine
// =============================================================================

pub const KDP_MIN_PAGES: u32 = 24;
pub const KDP_MAX_PAGES: u32 = 800;

/// Perfect binding needs page counts in multiples of 4
pub const PAGE_MULTIPLE: u32 = 4;

/// Paper thickness per page, white stock
pub const WHITE_PAPER_THICKNESS_IN: f64 = 0.002252;

/// Paper thickness per page, cream stock
pub const CREAM_PAPER_THICKNESS_IN: f64 = 0.0025;

// =============================================================================
// Cover
// =============================================================================

/// Spines wider than this get the large spine font (points)
pub const SPINE_TEXT_THRESHOLD_PT: f64 = 72.0;

pub const SPINE_FONT_SIZE_LARGE: f32 = 12.0;
pub const SPINE_FONT_SIZE_SMALL: f32 = 9.0;

pub const COVER_TITLE_FONT_SIZE: f32 = 24.0;
pub const COVER_AUTHOR_FONT_SIZE: f32 = 16.0;

/// Vertical distance from the title baseline to the author line
pub const COVER_AUTHOR_OFFSET_PT: f32 = 36.0;

pub const BARCODE_WIDTH_PT: f32 = 144.0;
pub const BARCODE_HEIGHT_PT: f32 = 72.0;

/// Distance of the barcode box from the back cover trim corner
pub const BARCODE_INSET_PT: f32 = 72.0;

pub const BARCODE_LABEL_FONT_SIZE: f32 = 8.0;

/// Offset of the drop shadow behind photo cover text
pub const SHADOW_OFFSET_PT: f32 = 2.0;

pub const DEFAULT_GRADIENT_STEPS: u32 = 20;

// =============================================================================
// Interior
// =============================================================================

/// Illustration width as a fraction of content width, story books
pub const STORY_IMAGE_RATIO: f64 = 0.8;

/// Coloring image width as a fraction of content width
pub const COLORING_IMAGE_RATIO: f64 = 0.9;

/// Line height as a multiple of font size
pub const LEADING_FACTOR: f32 = 1.2;

/// Longer captions are cut and end in "..."
pub const CAPTION_MAX_LEN: usize = 100;

pub const PAGE_NUMBER_FONT_SIZE: f32 = 9.0;

pub const COLORING_BORDER_WIDTH: f32 = 1.0;

/// An illustration shrinks to fit the page when at least this share of it fits;
/// otherwise it moves to a fresh page
pub const MIN_ILLUSTRATION_SCALE: f32 = 0.75;

/// Gap between chapter text and its illustration
pub const ILLUSTRATION_SPACING_PT: f32 = 12.0;

// =============================================================================
// Storage Layout
// =============================================================================

pub const BOOKS_DIR: &str = "books";
pub const COVERS_DIR: &str = "covers";
pub const TEMP_DIR: &str = "temp";
pub const TEMPLATES_DIR: &str = "templates";

pub const DEFAULT_JPEG_QUALITY: u8 = 90;
