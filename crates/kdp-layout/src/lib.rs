pub mod assemble;
pub mod constants;
pub mod cover;
pub mod dimensions;
mod formatter;
pub mod image_fit;
pub mod interior;
mod options;
pub mod render;
pub mod templates;
mod types;

pub use assemble::{Assembly, combine, combine_or_interior};
pub use cover::{CoverComposer, Palette, palette_for_theme};
pub use dimensions::{
    CoverDimensions, DimensionCalculator, Dimensions, MarginsPt, RectPt, spine_width_for_paper_name,
    spine_width_in,
};
pub use formatter::{BookFormatter, FormatRequest, FormattedBook, safe_filename};
pub use image_fit::{fit_image, try_fit_image};
pub use interior::{Interior, InteriorComposer};
pub use options::*;
pub use templates::{BookTemplate, NewTemplate, TemplateStore, TemplateUpdate};
pub use types::*;
