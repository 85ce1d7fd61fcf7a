//! Physical page geometry for KDP trim sizes
//!
//! Every length is carried in inches, points and print pixels so callers
//! never convert between units themselves.

use crate::constants::*;
use crate::types::{PaperType, TrimSize, round_up_to_page_multiple};
use serde::Serialize;

/// Page margins in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarginsPt {
    pub top: f64,
    pub bottom: f64,
    pub inside: f64,
    pub outside: f64,
}

/// Geometry of one interior page for a trim size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub trim_size: TrimSize,
    pub dpi: u32,

    pub width_in: f64,
    pub height_in: f64,
    pub width_pt: f64,
    pub height_pt: f64,
    pub width_px: u32,
    pub height_px: u32,

    pub bleed_in: f64,
    pub bleed_pt: f64,
    pub bleed_px: u32,

    pub width_with_bleed_in: f64,
    pub height_with_bleed_in: f64,
    pub width_with_bleed_pt: f64,
    pub height_with_bleed_pt: f64,
    pub width_with_bleed_px: u32,
    pub height_with_bleed_px: u32,

    pub margins: MarginsPt,

    pub safe_zone_in: f64,
    pub safe_zone_pt: f64,
}

impl Dimensions {
    pub fn new(trim_size: TrimSize, dpi: u32) -> Self {
        let (width_in, height_in) = trim_size.dimensions_in();
        let width_with_bleed_in = width_in + 2.0 * BLEED_IN;
        let height_with_bleed_in = height_in + 2.0 * BLEED_IN;

        Self {
            trim_size,
            dpi,
            width_in,
            height_in,
            width_pt: in_to_pt(width_in),
            height_pt: in_to_pt(height_in),
            width_px: in_to_px(width_in, dpi),
            height_px: in_to_px(height_in, dpi),
            bleed_in: BLEED_IN,
            bleed_pt: in_to_pt(BLEED_IN),
            bleed_px: in_to_px(BLEED_IN, dpi),
            width_with_bleed_in,
            height_with_bleed_in,
            width_with_bleed_pt: in_to_pt(width_with_bleed_in),
            height_with_bleed_pt: in_to_pt(height_with_bleed_in),
            width_with_bleed_px: in_to_px(width_with_bleed_in, dpi),
            height_with_bleed_px: in_to_px(height_with_bleed_in, dpi),
            margins: MarginsPt {
                top: in_to_pt(MARGIN_TOP_IN),
                bottom: in_to_pt(MARGIN_BOTTOM_IN),
                inside: in_to_pt(MARGIN_INSIDE_IN),
                outside: in_to_pt(MARGIN_OUTSIDE_IN),
            },
            safe_zone_in: SAFE_ZONE_IN,
            safe_zone_pt: in_to_pt(SAFE_ZONE_IN),
        }
    }

    /// Interior text margins measured from the bleed edge: (left, right, top, bottom)
    pub fn interior_margins_pt(&self) -> (f64, f64, f64, f64) {
        (
            self.margins.inside + self.bleed_pt,
            self.margins.outside + self.bleed_pt,
            self.margins.top + self.bleed_pt,
            self.margins.bottom + self.bleed_pt,
        )
    }
}

/// Axis-aligned rectangle in PDF user space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectPt {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectPt {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Wraparound cover geometry: back, spine and front side by side
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverDimensions {
    pub page: Dimensions,
    pub page_count: u32,
    pub spine_width_in: f64,
    pub spine_width_pt: f64,
    /// Back + spine + front, without bleed
    pub width_with_spine_pt: f64,
    pub full_width_pt: f64,
    pub full_height_pt: f64,
    pub back: RectPt,
    pub spine: RectPt,
    pub front: RectPt,
}

impl CoverDimensions {
    pub fn new(page: Dimensions, page_count: u32, paper: PaperType) -> Self {
        let spine_width_in = spine_width_in(page_count, paper);
        let spine_width_pt = in_to_pt(spine_width_in);
        let width_with_spine_pt = 2.0 * page.width_pt + spine_width_pt;
        let bleed = page.bleed_pt;

        let back = RectPt::new(bleed, bleed, page.width_pt, page.height_pt);
        let spine = RectPt::new(back.right(), bleed, spine_width_pt, page.height_pt);
        let front = RectPt::new(spine.right(), bleed, page.width_pt, page.height_pt);

        Self {
            page,
            page_count,
            spine_width_in,
            spine_width_pt,
            width_with_spine_pt,
            full_width_pt: width_with_spine_pt + 2.0 * bleed,
            full_height_pt: page.height_with_bleed_pt,
            back,
            spine,
            front,
        }
    }

    /// Back rect extended into the left, top and bottom bleed
    pub fn back_with_bleed(&self) -> RectPt {
        let b = self.page.bleed_pt;
        RectPt::new(0.0, 0.0, self.back.width + b, self.full_height_pt)
    }

    /// Spine rect extended into the top and bottom bleed
    pub fn spine_with_bleed(&self) -> RectPt {
        RectPt::new(self.spine.x, 0.0, self.spine.width, self.full_height_pt)
    }

    /// Front rect extended into the right, top and bottom bleed
    pub fn front_with_bleed(&self) -> RectPt {
        let b = self.page.bleed_pt;
        RectPt::new(self.front.x, 0.0, self.front.width + b, self.full_height_pt)
    }

    /// Trim area of the whole wraparound
    pub fn trim_rect(&self) -> RectPt {
        let b = self.page.bleed_pt;
        RectPt::new(b, b, self.width_with_spine_pt, self.page.height_pt)
    }
}

/// Spine thickness in inches for a page count on the given paper.
///
/// The page count is always rounded up to the binding multiple first.
pub fn spine_width_in(page_count: u32, paper: PaperType) -> f64 {
    let thickness = match paper {
        PaperType::White => WHITE_PAPER_THICKNESS_IN,
        PaperType::Cream => CREAM_PAPER_THICKNESS_IN,
    };
    round_up_to_page_multiple(page_count) as f64 * thickness
}

/// Spine width by paper name; unknown names fall back to white
pub fn spine_width_for_paper_name(page_count: u32, paper_name: &str) -> f64 {
    spine_width_in(page_count, PaperType::from_name(paper_name))
}

/// Precomputed geometry table for every supported trim size
#[derive(Debug, Clone)]
pub struct DimensionCalculator {
    dpi: u32,
    table: [Dimensions; 2],
}

impl Default for DimensionCalculator {
    fn default() -> Self {
        Self::new(PRINT_DPI)
    }
}

impl DimensionCalculator {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            table: TrimSize::ALL.map(|trim| Dimensions::new(trim, dpi)),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn dimensions(&self, trim_size: TrimSize) -> Dimensions {
        match trim_size {
            TrimSize::Standard => self.table[0],
            TrimSize::Square => self.table[1],
        }
    }

    pub fn cover_dimensions(
        &self,
        trim_size: TrimSize,
        page_count: u32,
        paper: PaperType,
    ) -> CoverDimensions {
        CoverDimensions::new(self.dimensions(trim_size), page_count, paper)
    }
}
