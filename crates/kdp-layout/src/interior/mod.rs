//! Interior pages: title page followed by story chapters or coloring pages
//!
//! Pages are trim size plus bleed on every edge; text stays inside the
//! KDP margins measured from the trim line.

mod flow;
mod typography;

pub use flow::{Frame, PageFlow};
pub use typography::{StyleSet, TextStyle, font_sizes, truncate_caption, wrap_text};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{COLORING_BORDER_WIDTH, ILLUSTRATION_SPACING_PT, PAGE_MULTIPLE, pt_to_px};
use crate::dimensions::{DimensionCalculator, Dimensions};
use crate::image_fit::fit_decoded;
use crate::options::LayoutOptions;
use crate::render::{Color, PdfBuilder, StandardFont};
use crate::types::*;

/// Result of composing an interior
#[derive(Debug, Clone, PartialEq)]
pub struct Interior {
    pub path: PathBuf,
    pub page_count: usize,
}

#[derive(Clone)]
pub struct InteriorComposer {
    calculator: Arc<DimensionCalculator>,
    options: LayoutOptions,
}

impl InteriorComposer {
    pub fn new(calculator: Arc<DimensionCalculator>, options: LayoutOptions) -> Self {
        Self {
            calculator,
            options,
        }
    }

    /// Lay out the interior and write it to `output_path`
    pub fn create_interior(
        &self,
        metadata: &BookMetadata,
        content: &Content,
        images: &[PathBuf],
        output_path: &Path,
    ) -> Result<Interior> {
        let dims = self.calculator.dimensions(metadata.trim_size);
        let mut builder = PdfBuilder::new(self.options.jpeg_quality);
        builder.set_info(&metadata.title, &metadata.author);
        let mut flow = PageFlow::new(builder, &dims);

        match content {
            Content::Story(story) => {
                log::info!("Creating story book interior: {}", metadata.title);
                self.title_page(&mut flow, metadata, &StyleSet::for_age(metadata.age_group))?;
                self.story_pages(&mut flow, metadata, &dims, story, images)?;
            }
            Content::Coloring(coloring) => {
                log::info!("Creating coloring book interior: {}", metadata.title);
                let mut styles = StyleSet::for_age(metadata.age_group);
                if let Some(formatting) = &coloring.formatting {
                    styles.title.font =
                        StandardFont::resolve(&formatting.title_font, styles.title.font);
                }
                self.title_page(&mut flow, metadata, &styles)?;
                self.coloring_pages(&mut flow, metadata, &dims, coloring, images)?;
            }
        }

        if self.options.pad_interior_to_multiple_of_four {
            while flow.page_count() % PAGE_MULTIPLE as usize != 0 {
                flow.blank_page()?;
            }
        }

        let page_count = flow.page_count();
        flow.finish()?
            .save(&self.options.temp_dir(), output_path)?;
        log::info!(
            "Interior written to {} ({} pages)",
            output_path.display(),
            page_count
        );

        Ok(Interior {
            path: output_path.to_path_buf(),
            page_count,
        })
    }

    fn title_page(
        &self,
        flow: &mut PageFlow,
        metadata: &BookMetadata,
        styles: &StyleSet,
    ) -> Result<()> {
        flow.set_page_numbering(false);
        flow.paragraph(&metadata.title, &styles.title)?;
        flow.paragraph(&format!("By {}", metadata.author), &styles.caption)?;
        flow.page_break()
    }

    fn story_pages(
        &self,
        flow: &mut PageFlow,
        metadata: &BookMetadata,
        dims: &Dimensions,
        story: &StoryContent,
        images: &[PathBuf],
    ) -> Result<()> {
        let base = StyleSet::for_age(metadata.age_group);
        let image_width = flow.frame().width() * self.options.story_image_ratio as f32;

        for (i, chapter) in story.chapters.iter().enumerate() {
            let styles = match &chapter.formatting {
                Some(formatting) => base.with_formatting(formatting),
                None => base,
            };
            let placement = chapter
                .formatting
                .as_ref()
                .map(|f| f.image_placement)
                .unwrap_or_default();
            flow.set_page_numbering(
                chapter
                    .formatting
                    .as_ref()
                    .is_some_and(|f| f.page_numbering),
            );

            let title = if chapter.title.trim().is_empty() {
                format!("Chapter {}", i + 1)
            } else {
                chapter.title.clone()
            };
            flow.paragraph(&title, &styles.title)?;

            let image_above = match placement {
                ImagePlacement::AboveText => true,
                ImagePlacement::Alternating => i % 2 == 0,
                _ => false,
            };

            let illustration = images.get(i);
            if image_above {
                if let Some(path) = illustration {
                    self.illustration(flow, dims, path, chapter, &styles, image_width, placement)?;
                    flow.spacer(ILLUSTRATION_SPACING_PT);
                }
            }

            for para in chapter.content.split("\n\n") {
                if !para.trim().is_empty() {
                    flow.paragraph(para.trim_matches('\n'), &styles.body)?;
                }
            }

            if !image_above {
                if let Some(path) = illustration {
                    flow.spacer(ILLUSTRATION_SPACING_PT);
                    self.illustration(flow, dims, path, chapter, &styles, image_width, placement)?;
                }
            }

            flow.page_break()?;
        }
        Ok(())
    }

    /// Place one chapter illustration and its caption.
    /// An unreadable image is logged and left out.
    #[allow(clippy::too_many_arguments)]
    fn illustration(
        &self,
        flow: &mut PageFlow,
        dims: &Dimensions,
        path: &Path,
        chapter: &Chapter,
        styles: &StyleSet,
        width: f32,
        placement: ImagePlacement,
    ) -> Result<()> {
        let decoded = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                log::error!("Error adding image {}: {}", path.display(), e);
                return Ok(());
            }
        };

        let aspect = decoded.width() as f32 / decoded.height().max(1) as f32;
        let width_px = pt_to_px(width as f64, dims.dpi).max(1);
        let height_px = ((width_px as f32 / aspect).round() as u32).max(1);
        let handle = flow.add_image(&fit_decoded(&decoded, width_px, height_px))?;

        let caption = chapter
            .illustration_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| truncate_caption(p.trim(), self.options.caption_max_len));

        if placement == ImagePlacement::FullPage {
            let reserve = if caption.is_some() {
                caption_reserve(&styles.caption)
            } else {
                0.0
            };
            flow.full_page_image(handle, width, reserve)?;
        } else {
            flow.image(handle, width)?;
        }

        if let Some(caption) = caption {
            flow.spacer(styles.caption.size / 2.0);
            flow.paragraph(&caption, &styles.caption)?;
        }

        if placement == ImagePlacement::FullPage {
            flow.page_break()?;
        }
        Ok(())
    }

    fn coloring_pages(
        &self,
        flow: &mut PageFlow,
        metadata: &BookMetadata,
        dims: &Dimensions,
        coloring: &ColoringContent,
        images: &[PathBuf],
    ) -> Result<()> {
        let formatting = coloring.formatting.as_ref();
        let mut styles = StyleSet::for_age(metadata.age_group);
        if let Some(f) = formatting {
            styles.caption.font = StandardFont::resolve(&f.caption_font, StandardFont::Helvetica);
        }
        flow.set_page_numbering(formatting.is_some_and(|f| f.page_numbering));

        let width = flow.frame().width() * self.options.coloring_image_ratio as f32;

        for (i, path) in images.iter().enumerate() {
            let decoded = match image::open(path) {
                Ok(img) => img,
                Err(e) => {
                    log::error!("Error adding coloring page {}: {}", path.display(), e);
                    flow.paragraph(
                        &format!("Coloring page {} could not be loaded", i + 1),
                        &styles.body,
                    )?;
                    flow.page_break()?;
                    continue;
                }
            };

            let caption = formatting
                .filter(|f| f.captions)
                .and_then(|_| coloring.pages.get(i))
                .and_then(|page| page.caption.as_deref())
                .filter(|c| !c.trim().is_empty())
                .map(|c| truncate_caption(c.trim(), self.options.caption_max_len));
            let reserve = if caption.is_some() {
                caption_reserve(&styles.caption)
            } else {
                0.0
            };

            let aspect = decoded.width() as f32 / decoded.height().max(1) as f32;
            let width_px = pt_to_px(width as f64, dims.dpi).max(1);
            let height_px = ((width_px as f32 / aspect).round() as u32).max(1);
            let handle = flow.add_image(&fit_decoded(&decoded, width_px, height_px))?;
            let (x, y, w, h) = flow.full_page_image(handle, width, reserve)?;

            if formatting.is_some_and(|f| f.image_border) {
                let pad = COLORING_BORDER_WIDTH * 4.0;
                flow.decorate().stroke_rect(
                    x - pad,
                    y - pad,
                    w + 2.0 * pad,
                    h + 2.0 * pad,
                    Color::BLACK,
                    COLORING_BORDER_WIDTH,
                    None,
                );
            }

            if let Some(caption) = caption {
                flow.spacer(styles.caption.size / 2.0);
                flow.paragraph(&caption, &styles.caption)?;
            }

            flow.page_break()?;
        }
        Ok(())
    }
}

/// Room below a full-page image for a caption of up to two lines
fn caption_reserve(style: &TextStyle) -> f32 {
    style.leading * 2.0 + style.size
}
