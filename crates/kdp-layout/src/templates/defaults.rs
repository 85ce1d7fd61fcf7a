//! Built-in template set, written to the store on first use

use chrono::{DateTime, Utc};

use super::model::{BookTemplate, TemplateProperties};
use crate::types::{AgeGroup, Alignment, BookType, ColorScheme, ImagePlacement};

/// Built-in template ids in their preferred order
pub const BUILTIN_TEMPLATE_IDS: [&str; 5] = [
    "story_standard_simple",
    "story_fantasy",
    "story_educational",
    "coloring_simple",
    "coloring_educational",
];

/// Position of a built-in id in the preferred order
pub fn builtin_rank(id: &str) -> Option<usize> {
    BUILTIN_TEMPLATE_IDS.iter().position(|&builtin| builtin == id)
}

fn scheme(primary: &str, secondary: &str, text: &str) -> ColorScheme {
    ColorScheme {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        text: text.to_string(),
    }
}

fn story_properties(layout: &str) -> TemplateProperties {
    TemplateProperties {
        layout: Some(layout.to_string()),
        font_family: Some("Helvetica".to_string()),
        title_font: Some("Helvetica-Bold".to_string()),
        body_font: Some("Helvetica".to_string()),
        caption_font: Some("Helvetica-Oblique".to_string()),
        title_alignment: Some(Alignment::Center),
        body_alignment: Some(Alignment::Left),
        page_numbering: Some(true),
        ..Default::default()
    }
}

fn coloring_properties(layout: &str) -> TemplateProperties {
    TemplateProperties {
        layout: Some(layout.to_string()),
        font_family: Some("Helvetica".to_string()),
        title_font: Some("Helvetica-Bold".to_string()),
        image_placement: Some(ImagePlacement::Centered),
        page_numbering: Some(true),
        ..Default::default()
    }
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    book_type: BookType,
    age_groups: &[AgeGroup],
    properties: TemplateProperties,
    now: DateTime<Utc>,
) -> BookTemplate {
    BookTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        book_type,
        age_groups: age_groups.to_vec(),
        trim_sizes: Vec::new(),
        properties,
        preview_image: None,
        created_at: now,
        updated_at: now,
    }
}

/// The five built-in templates, in `BUILTIN_TEMPLATE_IDS` order
pub fn builtin_templates(now: DateTime<Utc>) -> Vec<BookTemplate> {
    use AgeGroup::*;

    let mut simple = story_properties("standard");
    simple.color_scheme = Some(scheme("#4B9CD3", "#FFFFFF", "#333333"));
    simple.image_placement = Some(ImagePlacement::BelowText);

    let mut fantasy = story_properties("fantasy");
    fantasy.color_scheme = Some(scheme("#7B2CBF", "#9D4EDD", "#333333"));
    fantasy.page_borders = Some("decorative".to_string());
    fantasy.body_alignment = Some(Alignment::Justified);
    fantasy.image_placement = Some(ImagePlacement::Alternating);

    let mut educational = story_properties("educational");
    educational.color_scheme = Some(scheme("#2A9D8F", "#E9C46A", "#264653"));
    educational.image_placement = Some(ImagePlacement::Alternating);
    educational.extra.insert("info_boxes".into(), true.into());
    educational.extra.insert("educational_notes".into(), true.into());

    let mut coloring_simple = coloring_properties("standard");
    coloring_simple.image_border = Some(false);
    coloring_simple.captions = Some(false);

    let mut coloring_educational = coloring_properties("educational");
    coloring_educational.caption_font = Some("Helvetica".to_string());
    coloring_educational.image_border = Some(true);
    coloring_educational.captions = Some(true);
    coloring_educational.extra.insert("fun_facts".into(), true.into());

    vec![
        template(
            "story_standard_simple",
            "Simple Story Book",
            "A clean, simple layout for story books with illustrations.",
            BookType::Story,
            &AgeGroup::ALL,
            simple,
            now,
        ),
        template(
            "story_fantasy",
            "Fantasy Adventure",
            "A magical template for fantasy and adventure stories.",
            BookType::Story,
            &[EarlyReader, MiddleGrade],
            fantasy,
            now,
        ),
        template(
            "story_educational",
            "Educational Journey",
            "A template designed for educational content with clear structure.",
            BookType::Story,
            &[Preschool, EarlyReader, MiddleGrade],
            educational,
            now,
        ),
        template(
            "coloring_simple",
            "Simple Coloring Book",
            "A basic coloring book with one image per page.",
            BookType::Coloring,
            &AgeGroup::ALL,
            coloring_simple,
            now,
        ),
        template(
            "coloring_educational",
            "Educational Coloring Book",
            "A coloring book with educational captions for each image.",
            BookType::Coloring,
            &[Preschool, EarlyReader, MiddleGrade],
            coloring_educational,
            now,
        ),
    ]
}
