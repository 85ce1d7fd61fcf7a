//! PDF drawing primitives shared by the cover and interior composers
//!
//! - `canvas`: per-page content stream recording
//! - `document`: page tree, shared resources, atomic save
//! - `fonts`: standard Type1 fonts and text metrics
//! - `color`: hex parsing and interpolation

mod canvas;
mod color;
mod document;
mod fonts;

pub use canvas::{Canvas, ImageHandle};
pub use color::Color;
pub use document::{PageBoxes, PdfBuilder, save_document};
pub(crate) use document::write_atomic;
pub use fonts::{StandardFont, encode_win_ansi};
