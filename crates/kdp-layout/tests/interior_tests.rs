use image::{Rgb, RgbImage};
use kdp_layout::templates::{TemplateProperties, apply_template_properties};
use kdp_layout::*;
use lopdf::content::Content as PageContent;
use lopdf::{Document, Object};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn options(storage: &Path) -> LayoutOptions {
    LayoutOptions {
        dpi: 72,
        ..LayoutOptions::with_storage_root(storage)
    }
}

fn composer(options: LayoutOptions) -> InteriorComposer {
    InteriorComposer::new(Arc::new(DimensionCalculator::new(options.dpi)), options)
}

fn write_png(path: &Path, width: u32, height: u32) -> PathBuf {
    RgbImage::from_fn(width, height, |x, _| {
        if x % 10 < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
    })
    .save(path)
    .unwrap();
    path.to_path_buf()
}

fn page_text(doc: &Document) -> Vec<Vec<String>> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let bytes = doc.get_page_content(page_id).unwrap();
            PageContent::decode(&bytes)
                .unwrap()
                .operations
                .into_iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(b, _)) => Some(String::from_utf8_lossy(b).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

fn story_template(properties: TemplateProperties) -> BookTemplate {
    let now = chrono::Utc::now();
    BookTemplate {
        id: "test_story".to_string(),
        name: "Test".to_string(),
        description: String::new(),
        book_type: BookType::Story,
        age_groups: AgeGroup::ALL.to_vec(),
        trim_sizes: Vec::new(),
        properties,
        preview_image: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_story_pages_and_boxes() {
    let dir = TempDir::new().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Two Chapters", AgeGroup::Preschool, BookType::Story, "animals");
    let content = Content::story(vec![
        Chapter::new("The Start", "A fox woke up."),
        Chapter::new("", "The fox went home."),
    ]);
    let out = dir.path().join("interior.pdf");

    let interior = composer.create_interior(&meta, &content, &[], &out).unwrap();
    assert_eq!(interior.page_count, 3);

    let doc = Document::load(&out).unwrap();
    assert_eq!(doc.get_pages().len(), 3);

    let text = page_text(&doc);
    assert_eq!(text[0], vec!["Two Chapters", "By AI Book Generator"]);
    assert!(text[1].contains(&"The Start".to_string()));
    // Untitled chapters are numbered
    assert!(text[2].contains(&"Chapter 2".to_string()));

    let first = doc.get_pages()[&1];
    let page = doc.get_dictionary(first).unwrap();
    let media: Vec<f32> = page
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_float().unwrap())
        .collect();
    assert_eq!(media, vec![0.0, 0.0, 630.0, 810.0]);
    let trim: Vec<f32> = page
        .get(b"TrimBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_float().unwrap())
        .collect();
    assert_eq!(trim, vec![9.0, 9.0, 621.0, 801.0]);
}

#[test]
fn test_long_chapter_flows_across_pages() {
    let dir = TempDir::new().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Long", AgeGroup::Toddler, BookType::Story, "sea");
    let body = vec!["The little boat sailed on and on across the sea."; 120].join("\n\n");
    let content = Content::story(vec![Chapter::new("Voyage", body)]);
    let out = dir.path().join("long.pdf");

    let interior = composer.create_interior(&meta, &content, &[], &out).unwrap();
    assert!(interior.page_count > 3, "got {}", interior.page_count);
}

#[test]
fn test_illustration_with_caption_and_page_numbers() {
    let dir = TempDir::new().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Pictures", AgeGroup::EarlyReader, BookType::Story, "forest");
    let image = write_png(&dir.path().join("tree.png"), 200, 100);

    let prompt = "x".repeat(150);
    let content = Content::story(vec![
        Chapter::new("Trees", "Tall trees grow here.").with_illustration_prompt(prompt),
    ]);
    let content = apply_template_properties(
        &content,
        &story_template(TemplateProperties {
            page_numbering: Some(true),
            ..Default::default()
        }),
    );
    let out = dir.path().join("pictures.pdf");

    let interior = composer
        .create_interior(&meta, &content, &[image], &out)
        .unwrap();
    assert_eq!(interior.page_count, 2);

    let doc = Document::load(&out).unwrap();
    let text = page_text(&doc);
    // Title page is never numbered
    assert!(!text[0].contains(&"1".to_string()));
    assert!(text[1].contains(&"2".to_string()));

    let caption = text[1].iter().find(|t| t.starts_with("xxx")).unwrap();
    assert_eq!(caption.len(), 100);
    assert!(caption.ends_with("..."));
}

#[test]
fn test_unreadable_illustration_is_skipped() {
    let dir = TempDir::new().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Broken", AgeGroup::EarlyReader, BookType::Story, "forest");
    let content = Content::story(vec![
        Chapter::new("One", "Words.").with_illustration_prompt("A tree"),
    ]);
    let out = dir.path().join("broken.pdf");

    let interior = composer
        .create_interior(&meta, &content, &[dir.path().join("missing.png")], &out)
        .unwrap();
    assert_eq!(interior.page_count, 2);
    let text = page_text(&Document::load(&out).unwrap());
    assert!(!text[1].contains(&"A tree".to_string()));
}

#[test]
fn test_full_page_illustration_gets_its_own_page() {
    let dir = TempDir::new().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Full", AgeGroup::EarlyReader, BookType::Story, "forest");
    let image = write_png(&dir.path().join("big.png"), 100, 100);
    let content = apply_template_properties(
        &Content::story(vec![Chapter::new("Big", "Look at this.")]),
        &story_template(TemplateProperties {
            image_placement: Some(ImagePlacement::FullPage),
            page_numbering: Some(false),
            ..Default::default()
        }),
    );
    let out = dir.path().join("full.pdf");

    let interior = composer
        .create_interior(&meta, &content, &[image], &out)
        .unwrap();
    // Title, chapter text, illustration page
    assert_eq!(interior.page_count, 3);
}

#[test]
fn test_coloring_pages_with_missing_image() {
    let dir = TempDir::new().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Color Me", AgeGroup::Preschool, BookType::Coloring, "farm");
    let images = vec![
        write_png(&dir.path().join("cow.png"), 300, 400),
        dir.path().join("pig.png"),
        write_png(&dir.path().join("hen.png"), 400, 300),
    ];
    let content = Content::coloring(vec![ColoringPage::default(); 3]);
    let out = dir.path().join("coloring.pdf");

    let interior = composer
        .create_interior(&meta, &content, &images, &out)
        .unwrap();
    assert_eq!(interior.page_count, 4);

    let text = page_text(&Document::load(&out).unwrap());
    assert!(text[2].contains(&"Coloring page 2 could not be loaded".to_string()));
}

#[test]
fn test_coloring_captions_follow_template() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path().join("templates")).unwrap();
    store.ensure_builtin_templates().unwrap();
    let composer = composer(options(dir.path()));
    let meta = BookMetadata::new("Facts", AgeGroup::EarlyReader, BookType::Coloring, "space");
    let images = vec![write_png(&dir.path().join("moon.png"), 100, 100)];
    let pages = vec![ColoringPage {
        caption: Some("The moon has no air".to_string()),
    }];

    let plain = apply_template_properties(
        &Content::coloring(pages.clone()),
        &store.get_template("coloring_simple").unwrap(),
    );
    let out = dir.path().join("plain.pdf");
    composer.create_interior(&meta, &plain, &images, &out).unwrap();
    let text = page_text(&Document::load(&out).unwrap());
    assert!(!text[1].contains(&"The moon has no air".to_string()));

    let educational = apply_template_properties(
        &Content::coloring(pages),
        &store.get_template("coloring_educational").unwrap(),
    );
    let out = dir.path().join("educational.pdf");
    composer
        .create_interior(&meta, &educational, &images, &out)
        .unwrap();
    let text = page_text(&Document::load(&out).unwrap());
    assert!(text[1].contains(&"The moon has no air".to_string()));
    assert!(text[1].contains(&"2".to_string()));
}

#[test]
fn test_padding_to_multiple_of_four() {
    let dir = TempDir::new().unwrap();
    let composer = composer(LayoutOptions {
        pad_interior_to_multiple_of_four: true,
        ..options(dir.path())
    });
    let meta = BookMetadata::new("Padded", AgeGroup::MiddleGrade, BookType::Story, "city");
    let content = Content::story(vec![Chapter::new("Only", "Short.")]);
    let out = dir.path().join("padded.pdf");

    let interior = composer.create_interior(&meta, &content, &[], &out).unwrap();
    assert_eq!(interior.page_count, 4);
    assert_eq!(Document::load(&out).unwrap().get_pages().len(), 4);
}
