//! Book formatting pipeline: template, cover, interior, assembly
//!
//! `format_book` is synchronous internally; the async entry points move the
//! work onto tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assemble::combine_or_interior;
use crate::cover::CoverComposer;
use crate::dimensions::DimensionCalculator;
use crate::interior::InteriorComposer;
use crate::options::LayoutOptions;
use crate::templates::{TemplateStore, apply_template_properties};
use crate::types::*;

/// File-name stem for a title: lower case, alphanumerics plus `_` and `-`,
/// every other character replaced by `_`
pub fn safe_filename(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Everything `format_book` needs for one book
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRequest {
    pub metadata: BookMetadata,
    pub content: Content,
    pub images: Vec<PathBuf>,
    pub template_id: Option<String>,
    pub cover_image: Option<PathBuf>,
    pub cover_style: CoverStyle,
}

impl FormatRequest {
    pub fn new(metadata: BookMetadata, content: Content) -> Self {
        Self {
            metadata,
            content,
            images: Vec::new(),
            template_id: None,
            cover_image: None,
            cover_style: CoverStyle::Simple,
        }
    }

    pub fn with_images(mut self, images: Vec<PathBuf>) -> Self {
        self.images = images;
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_cover_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover_image = Some(path.into());
        self
    }

    pub fn with_cover_style(mut self, style: CoverStyle) -> Self {
        self.cover_style = style;
        self
    }
}

/// Result of a `format_book` run
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedBook {
    /// The deliverable: print-ready PDF, or the interior alone when degraded
    pub path: PathBuf,
    pub interior_path: PathBuf,
    pub cover_path: Option<PathBuf>,
    pub interior_pages: usize,
    pub template: Option<AppliedTemplate>,
    pub stage: FormatStage,
    pub history: Vec<FormatStage>,
}

impl FormattedBook {
    pub fn is_degraded(&self) -> bool {
        self.stage == FormatStage::Degraded
    }
}

struct StageTracker {
    history: Vec<FormatStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            history: vec![FormatStage::Pending],
        }
    }

    fn current(&self) -> FormatStage {
        self.history
            .last()
            .copied()
            .unwrap_or(FormatStage::Pending)
    }

    fn advance(&mut self, next: FormatStage) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            current,
            next
        );
        log::debug!("Format stage {:?} -> {:?}", current, next);
        self.history.push(next);
    }
}

#[derive(Clone)]
pub struct BookFormatter {
    options: LayoutOptions,
    calculator: Arc<DimensionCalculator>,
    templates: Arc<TemplateStore>,
    cover: CoverComposer,
    interior: InteriorComposer,
}

impl BookFormatter {
    /// Validate options and create the storage layout
    pub fn new(options: LayoutOptions, templates: Arc<TemplateStore>) -> Result<Self> {
        options.validate()?;
        options.ensure_storage_dirs()?;
        let calculator = Arc::new(DimensionCalculator::new(options.dpi));

        Ok(Self {
            cover: CoverComposer::new(calculator.clone(), options.clone()),
            interior: InteriorComposer::new(calculator.clone(), options.clone()),
            options,
            calculator,
            templates,
        })
    }

    /// Formatter with a template store in `<storage_root>/templates`
    pub fn with_default_store(options: LayoutOptions) -> Result<Self> {
        let store = TemplateStore::open(options.templates_dir())?;
        Self::new(options, Arc::new(store))
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn calculator(&self) -> &DimensionCalculator {
        &self.calculator
    }

    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }

    pub fn interior_path(&self, metadata: &BookMetadata) -> PathBuf {
        self.options
            .books_dir()
            .join(format!("{}.pdf", safe_filename(&metadata.title)))
    }

    pub fn cover_path(&self, metadata: &BookMetadata) -> PathBuf {
        self.options
            .covers_dir()
            .join(format!("{}_cover.pdf", safe_filename(&metadata.title)))
    }

    pub fn print_ready_path(&self, metadata: &BookMetadata) -> PathBuf {
        self.options
            .books_dir()
            .join(format!("{}_print_ready.pdf", safe_filename(&metadata.title)))
    }

    /// Format a complete book on the blocking pool
    pub async fn format_book(&self, request: FormatRequest) -> Result<FormattedBook> {
        let formatter = self.clone();
        tokio::task::spawn_blocking(move || formatter.format_book_blocking(request)).await?
    }

    /// Generate only the cover, on the blocking pool
    pub async fn generate_cover(
        &self,
        metadata: BookMetadata,
        cover_image: Option<PathBuf>,
        style: Option<CoverStyle>,
    ) -> Result<PathBuf> {
        let formatter = self.clone();
        tokio::task::spawn_blocking(move || {
            formatter.generate_cover_blocking(&metadata, cover_image.as_deref(), style)
        })
        .await?
    }

    pub fn generate_cover_blocking(
        &self,
        metadata: &BookMetadata,
        cover_image: Option<&Path>,
        style: Option<CoverStyle>,
    ) -> Result<PathBuf> {
        metadata.validate()?;
        self.cover.generate_cover(
            metadata,
            cover_image,
            style.unwrap_or_default(),
            &self.cover_path(metadata),
        )
    }

    /// Apply the requested template, or the default coloring template for
    /// coloring content that carries no formatting yet
    fn resolve_content(&self, request: &FormatRequest) -> Content {
        if let Some(id) = &request.template_id {
            match self.templates.get_template(id) {
                Some(template) => return apply_template_properties(&request.content, &template),
                None => log::warn!("Template {} not found, using default formatting", id),
            }
        }

        if let Content::Coloring(coloring) = &request.content {
            if coloring.formatting.is_none() {
                let metadata = &request.metadata;
                match self.templates.get_default_template(
                    BookType::Coloring,
                    Some(metadata.age_group),
                    Some(metadata.trim_size),
                ) {
                    Ok(template) => {
                        log::info!("Applied default coloring book template: {}", template.name);
                        return apply_template_properties(&request.content, &template);
                    }
                    Err(e) => log::warn!("No default coloring template: {}", e),
                }
            }
        }

        request.content.clone()
    }

    pub fn format_book_blocking(&self, request: FormatRequest) -> Result<FormattedBook> {
        let metadata = &request.metadata;
        metadata.validate()?;
        log::info!("Formatting book: {}", metadata.title);

        if request.content.book_type() != metadata.book_type {
            log::warn!(
                "Metadata says {} but content is {}; laying out as {}",
                metadata.book_type,
                request.content.book_type(),
                request.content.book_type()
            );
        }

        let mut stages = StageTracker::new();
        let content = self.resolve_content(&request);

        stages.advance(FormatStage::GeneratingCover);
        let cover_path = match self.cover.generate_cover(
            metadata,
            request.cover_image.as_deref(),
            request.cover_style,
            &self.cover_path(metadata),
        ) {
            Ok(path) => {
                stages.advance(FormatStage::CoverDone);
                Some(path)
            }
            Err(e) => {
                log::error!("Cover generation failed: {}", e);
                None
            }
        };

        stages.advance(FormatStage::GeneratingInterior);
        let interior_path = self.interior_path(metadata);
        let interior =
            self.interior
                .create_interior(metadata, &content, &request.images, &interior_path)?;
        stages.advance(FormatStage::InteriorDone);

        let path = match &cover_path {
            Some(cover) => {
                stages.advance(FormatStage::Assembling);
                let assembly = combine_or_interior(
                    cover,
                    &interior.path,
                    &self.print_ready_path(metadata),
                    &self.options.temp_dir(),
                );
                stages.advance(if assembly.degraded {
                    FormatStage::Degraded
                } else {
                    FormatStage::Done
                });
                assembly.path
            }
            None => {
                stages.advance(FormatStage::Degraded);
                interior.path.clone()
            }
        };

        log::info!("Book formatted: {}", path.display());
        Ok(FormattedBook {
            path,
            interior_path: interior.path,
            cover_path,
            interior_pages: interior.page_count,
            template: content.template().cloned(),
            stage: stages.current(),
            history: stages.history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("Test Book"), "test_book");
        assert_eq!(safe_filename("Tom's Big Day!"), "tom_s_big_day_");
        assert_eq!(safe_filename("my-book_2"), "my-book_2");
    }

    #[test]
    fn test_stage_tracker_happy_path() {
        let mut stages = StageTracker::new();
        for stage in [
            FormatStage::GeneratingCover,
            FormatStage::CoverDone,
            FormatStage::GeneratingInterior,
            FormatStage::InteriorDone,
            FormatStage::Assembling,
            FormatStage::Done,
        ] {
            stages.advance(stage);
        }
        assert_eq!(stages.current(), FormatStage::Done);
        assert!(stages.current().is_terminal());
        assert_eq!(stages.history.len(), 7);
    }
}
