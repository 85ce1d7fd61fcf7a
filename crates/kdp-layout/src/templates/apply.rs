use super::model::{BookTemplate, TemplateProperties};
use crate::types::*;

/// Chapter formatting from template properties, with defaults for missing keys
pub fn chapter_formatting(props: &TemplateProperties) -> ChapterFormatting {
    ChapterFormatting {
        title_font: props
            .title_font
            .clone()
            .unwrap_or_else(|| "Helvetica-Bold".to_string()),
        body_font: props
            .body_font
            .clone()
            .unwrap_or_else(|| "Helvetica".to_string()),
        caption_font: props
            .caption_font
            .clone()
            .unwrap_or_else(|| "Helvetica-Oblique".to_string()),
        title_alignment: props.title_alignment.unwrap_or(Alignment::Center),
        body_alignment: props.body_alignment.unwrap_or(Alignment::Left),
        image_placement: props.image_placement.unwrap_or(ImagePlacement::BelowText),
        color_scheme: props.color_scheme.clone().unwrap_or_default(),
        page_numbering: props.page_numbering.unwrap_or(true),
    }
}

/// Content-level coloring formatting, with defaults for missing keys
pub fn coloring_formatting(props: &TemplateProperties) -> ColoringFormatting {
    ColoringFormatting {
        title_font: props
            .title_font
            .clone()
            .unwrap_or_else(|| "Helvetica-Bold".to_string()),
        caption_font: props
            .caption_font
            .clone()
            .unwrap_or_else(|| "Helvetica".to_string()),
        image_border: props.image_border.unwrap_or(false),
        image_placement: props.image_placement.unwrap_or(ImagePlacement::Centered),
        captions: props.captions.unwrap_or(false),
        page_numbering: props.page_numbering.unwrap_or(true),
    }
}

/// Return a copy of `content` annotated with the template's formatting.
///
/// Story content gets formatting on every chapter, coloring content gets it
/// once. The input is left untouched.
pub fn apply_template_properties(content: &Content, template: &BookTemplate) -> Content {
    if content.book_type() != template.book_type {
        log::warn!(
            "Applying {} template '{}' to {} content",
            template.book_type,
            template.id,
            content.book_type()
        );
    }

    let applied = AppliedTemplate {
        id: template.id.clone(),
        name: template.name.clone(),
        description: template.description.clone(),
    };

    match content {
        Content::Story(story) => {
            let formatting = chapter_formatting(&template.properties);
            let chapters = story
                .chapters
                .iter()
                .map(|chapter| Chapter {
                    formatting: Some(formatting.clone()),
                    ..chapter.clone()
                })
                .collect();
            Content::Story(StoryContent {
                chapters,
                template: Some(applied),
            })
        }
        Content::Coloring(coloring) => Content::Coloring(ColoringContent {
            pages: coloring.pages.clone(),
            formatting: Some(coloring_formatting(&template.properties)),
            template: Some(applied),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let fmt = chapter_formatting(&TemplateProperties::default());
        assert_eq!(fmt.title_font, "Helvetica-Bold");
        assert_eq!(fmt.caption_font, "Helvetica-Oblique");
        assert_eq!(fmt.title_alignment, Alignment::Center);
        assert_eq!(fmt.image_placement, ImagePlacement::BelowText);
        assert_eq!(fmt.color_scheme.text, "#333333");

        let coloring = coloring_formatting(&TemplateProperties::default());
        assert_eq!(coloring.caption_font, "Helvetica");
        assert!(!coloring.image_border);
        assert!(coloring.page_numbering);
    }
}
