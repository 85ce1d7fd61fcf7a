use crate::constants::*;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration shared by every formatting call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    // Storage
    pub storage_root: PathBuf,

    // Print resolution
    pub dpi: u32,
    pub jpeg_quality: u8,

    // Binding
    pub paper_type: PaperType,
    pub pad_interior_to_multiple_of_four: bool,

    // Cover
    pub spine_text_threshold_pt: f64,
    pub gradient_steps: u32,
    pub debug_guides: bool,

    // Interior
    pub story_image_ratio: f64,
    pub coloring_image_ratio: f64,
    pub caption_max_len: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            dpi: PRINT_DPI,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            paper_type: PaperType::White,
            pad_interior_to_multiple_of_four: false,
            spine_text_threshold_pt: SPINE_TEXT_THRESHOLD_PT,
            gradient_steps: DEFAULT_GRADIENT_STEPS,
            debug_guides: false,
            story_image_ratio: STORY_IMAGE_RATIO,
            coloring_image_ratio: COLORING_IMAGE_RATIO,
            caption_max_len: CAPTION_MAX_LEN,
        }
    }
}

impl LayoutOptions {
    /// Defaults rooted at the given storage directory
    pub fn with_storage_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: root.into(),
            ..Default::default()
        }
    }

    /// Load options from JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| LayoutError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LayoutError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(LayoutError::Config("DPI must be positive".to_string()));
        }

        for (name, ratio) in [
            ("story_image_ratio", self.story_image_ratio),
            ("coloring_image_ratio", self.coloring_image_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(LayoutError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }

        if self.gradient_steps == 0 {
            return Err(LayoutError::Config(
                "Gradient needs at least one band".to_string(),
            ));
        }

        if !self.spine_text_threshold_pt.is_finite() || self.spine_text_threshold_pt < 0.0 {
            return Err(LayoutError::Config(
                "Spine text threshold must be a non-negative number".to_string(),
            ));
        }

        if self.caption_max_len <= 3 {
            return Err(LayoutError::Config(
                "Caption length must leave room for an ellipsis".to_string(),
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(LayoutError::Config(format!(
                "JPEG quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }

        Ok(())
    }

    pub fn books_dir(&self) -> PathBuf {
        self.storage_root.join(BOOKS_DIR)
    }

    pub fn covers_dir(&self) -> PathBuf {
        self.storage_root.join(COVERS_DIR)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.storage_root.join(TEMP_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.storage_root.join(TEMPLATES_DIR)
    }

    /// Create the storage subdirectories if missing
    pub fn ensure_storage_dirs(&self) -> Result<()> {
        for dir in [
            self.books_dir(),
            self.covers_dir(),
            self.temp_dir(),
            self.templates_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
