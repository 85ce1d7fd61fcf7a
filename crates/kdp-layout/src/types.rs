use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{KDP_MAX_PAGES, KDP_MIN_PAGES, PAGE_MULTIPLE};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Template error: {0}")]
    Template(String),
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Composition failed: {0}")]
    Composition(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// KDP trim sizes supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TrimSize {
    /// 8.5" × 11"
    #[default]
    #[serde(rename = "8.5x11")]
    Standard,
    /// 8.5" × 8.5"
    #[serde(rename = "8.5x8.5")]
    Square,
}

impl TrimSize {
    pub const ALL: [TrimSize; 2] = [TrimSize::Standard, TrimSize::Square];

    /// Trim dimensions in inches (width, height)
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            TrimSize::Standard => (8.5, 11.0),
            TrimSize::Square => (8.5, 8.5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrimSize::Standard => "8.5x11",
            TrimSize::Square => "8.5x8.5",
        }
    }

    /// Form usable inside identifiers and file names
    pub fn slug(self) -> &'static str {
        match self {
            TrimSize::Standard => "8_5x11",
            TrimSize::Square => "8_5x8_5",
        }
    }
}

impl FromStr for TrimSize {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "8.5x11" | "standard" => Ok(TrimSize::Standard),
            "8.5x8.5" | "square" => Ok(TrimSize::Square),
            other => Err(LayoutError::InvalidInput(format!(
                "unknown trim size '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TrimSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target reader age group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "0-3")]
    Toddler,
    #[serde(rename = "3-5")]
    Preschool,
    #[serde(rename = "5-7")]
    EarlyReader,
    #[serde(rename = "7-12")]
    MiddleGrade,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Toddler,
        AgeGroup::Preschool,
        AgeGroup::EarlyReader,
        AgeGroup::MiddleGrade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Toddler => "0-3",
            AgeGroup::Preschool => "3-5",
            AgeGroup::EarlyReader => "5-7",
            AgeGroup::MiddleGrade => "7-12",
        }
    }
}

impl FromStr for AgeGroup {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0-3" | "toddler" => Ok(AgeGroup::Toddler),
            "3-5" | "preschool" => Ok(AgeGroup::Preschool),
            "5-7" | "early_reader" | "early-reader" => Ok(AgeGroup::EarlyReader),
            "7-12" | "middle_grade" | "middle-grade" => Ok(AgeGroup::MiddleGrade),
            other => Err(LayoutError::InvalidInput(format!(
                "unknown age group '{other}'"
            ))),
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookType {
    Story,
    Coloring,
}

impl BookType {
    pub fn as_str(self) -> &'static str {
        match self {
            BookType::Story => "story",
            BookType::Coloring => "coloring",
        }
    }
}

impl FromStr for BookType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "story" => Ok(BookType::Story),
            "coloring" => Ok(BookType::Coloring),
            other => Err(LayoutError::InvalidInput(format!(
                "unknown book type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interior paper stock, which sets the per-page thickness used for the spine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    #[default]
    White,
    Cream,
}

impl PaperType {
    /// Lenient lookup: anything unrecognized is treated as white paper.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "white" => PaperType::White,
            "cream" => PaperType::Cream,
            other => {
                log::warn!("Unknown paper type '{}', using white", other);
                PaperType::White
            }
        }
    }
}

/// Visual strategy for the wraparound cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverStyle {
    #[default]
    Simple,
    Gradient,
    Photo,
}

impl CoverStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverStyle::Simple => "simple",
            CoverStyle::Gradient => "gradient",
            CoverStyle::Photo => "photo",
        }
    }
}

impl FromStr for CoverStyle {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(CoverStyle::Simple),
            "gradient" => Ok(CoverStyle::Gradient),
            "photo" => Ok(CoverStyle::Photo),
            other => Err(LayoutError::InvalidInput(format!(
                "unknown cover style '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CoverStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_author() -> String {
    "AI Book Generator".to_string()
}

fn default_page_count() -> u32 {
    KDP_MIN_PAGES
}

/// Book metadata, owned by the caller and read-only to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    #[serde(default = "default_author")]
    pub author: String,
    pub age_group: AgeGroup,
    pub book_type: BookType,
    pub theme: String,
    #[serde(default)]
    pub educational_focus: Option<String>,
    #[serde(default)]
    pub trim_size: TrimSize,
    #[serde(default = "default_page_count")]
    pub page_count: u32,
}

impl BookMetadata {
    pub fn new(
        title: impl Into<String>,
        age_group: AgeGroup,
        book_type: BookType,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: default_author(),
            age_group,
            book_type,
            theme: theme.into(),
            educational_focus: None,
            trim_size: TrimSize::default(),
            page_count: default_page_count(),
        }
    }

    /// Reject metadata that no layout can be produced for
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LayoutError::InvalidInput("title is empty".to_string()));
        }
        if !(KDP_MIN_PAGES..=KDP_MAX_PAGES).contains(&self.page_count) {
            return Err(LayoutError::InvalidInput(format!(
                "page count {} outside {}..={}",
                self.page_count, KDP_MIN_PAGES, KDP_MAX_PAGES
            )));
        }
        Ok(())
    }

    /// Page count rounded up to the binding multiple
    pub fn binding_page_count(&self) -> u32 {
        round_up_to_page_multiple(self.page_count)
    }
}

/// Round a page count up to the next multiple of 4 (KDP binding requirement)
pub fn round_up_to_page_multiple(page_count: u32) -> u32 {
    page_count.div_ceil(PAGE_MULTIPLE) * PAGE_MULTIPLE
}

/// Text alignment used by templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

/// Where an illustration goes relative to the chapter text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePlacement {
    #[default]
    BelowText,
    AboveText,
    /// Above the text on even chapters, below on odd ones
    Alternating,
    Centered,
    FullPage,
}

/// Primary, secondary and text colors as hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub primary: String,
    pub secondary: String,
    pub text: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            primary: "#000000".to_string(),
            secondary: "#FFFFFF".to_string(),
            text: "#333333".to_string(),
        }
    }
}

/// Formatting attached to each story chapter by a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterFormatting {
    pub title_font: String,
    pub body_font: String,
    pub caption_font: String,
    pub title_alignment: Alignment,
    pub body_alignment: Alignment,
    pub image_placement: ImagePlacement,
    pub color_scheme: ColorScheme,
    pub page_numbering: bool,
}

/// Formatting attached once to coloring content by a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoringFormatting {
    pub title_font: String,
    pub caption_font: String,
    pub image_border: bool,
    pub image_placement: ImagePlacement,
    pub captions: bool,
    pub page_numbering: bool,
}

/// Summary of the template a piece of content was formatted with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub illustration_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<ChapterFormatting>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_illustration_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.illustration_prompt = Some(prompt.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoryContent {
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<AppliedTemplate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColoringPage {
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColoringContent {
    #[serde(default)]
    pub pages: Vec<ColoringPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatting: Option<ColoringFormatting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<AppliedTemplate>,
}

/// Book body handed over by the generation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Story(StoryContent),
    Coloring(ColoringContent),
}

impl Content {
    pub fn story(chapters: Vec<Chapter>) -> Self {
        Content::Story(StoryContent {
            chapters,
            template: None,
        })
    }

    pub fn coloring(pages: Vec<ColoringPage>) -> Self {
        Content::Coloring(ColoringContent {
            pages,
            ..Default::default()
        })
    }

    pub fn book_type(&self) -> BookType {
        match self {
            Content::Story(_) => BookType::Story,
            Content::Coloring(_) => BookType::Coloring,
        }
    }

    pub fn template(&self) -> Option<&AppliedTemplate> {
        match self {
            Content::Story(story) => story.template.as_ref(),
            Content::Coloring(coloring) => coloring.template.as_ref(),
        }
    }
}

/// Progress of a `format_book` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStage {
    Pending,
    GeneratingCover,
    CoverDone,
    GeneratingInterior,
    InteriorDone,
    Assembling,
    Done,
    /// Usable output without the cover attached
    Degraded,
}

impl FormatStage {
    /// Whether `next` is a legal successor of `self`
    pub fn can_advance_to(self, next: FormatStage) -> bool {
        use FormatStage::*;
        matches!(
            (self, next),
            (Pending, GeneratingCover)
                | (GeneratingCover, CoverDone)
                | (GeneratingCover, GeneratingInterior)
                | (CoverDone, GeneratingInterior)
                | (GeneratingInterior, InteriorDone)
                | (InteriorDone, Assembling)
                | (InteriorDone, Degraded)
                | (Assembling, Done)
                | (Assembling, Degraded)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FormatStage::Done | FormatStage::Degraded)
    }
}
