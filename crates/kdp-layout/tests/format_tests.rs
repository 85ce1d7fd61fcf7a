use image::{Rgb, RgbImage};
use kdp_layout::*;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn formatter(storage: &Path) -> BookFormatter {
    let options = LayoutOptions {
        dpi: 72,
        ..LayoutOptions::with_storage_root(storage)
    };
    BookFormatter::with_default_store(options).unwrap()
}

fn write_png(path: &Path) -> PathBuf {
    RgbImage::from_fn(160, 120, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 90]))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

fn story_request(dir: &Path) -> FormatRequest {
    let metadata = BookMetadata::new("Test Book", AgeGroup::Preschool, BookType::Story, "adventure");
    let content = Content::story(vec![
        Chapter::new("The Hill", "Mia climbed the hill.\n\nShe saw the whole town.")
            .with_illustration_prompt("A girl on a green hill"),
    ]);
    FormatRequest::new(metadata, content).with_images(vec![write_png(&dir.join("hill.png"))])
}

#[tokio::test]
async fn test_story_book_end_to_end() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());

    let book = formatter.format_book(story_request(dir.path())).await.unwrap();

    assert!(book.path.to_string_lossy().ends_with("_print_ready.pdf"));
    assert_eq!(book.path, dir.path().join("books/test_book_print_ready.pdf"));
    assert!(book.path.is_file());
    assert_eq!(book.stage, FormatStage::Done);
    assert!(!book.is_degraded());

    let interior = Document::load(&book.interior_path).unwrap();
    let combined = Document::load(&book.path).unwrap();
    assert_eq!(combined.get_pages().len(), interior.get_pages().len() + 1);
    assert_eq!(interior.get_pages().len(), book.interior_pages);

    let cover = book.cover_path.unwrap();
    assert_eq!(cover, dir.path().join("covers/test_book_cover.pdf"));
}

#[tokio::test]
async fn test_stage_history_is_a_legal_path() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());

    let book = formatter.format_book(story_request(dir.path())).await.unwrap();
    assert_eq!(
        book.history,
        vec![
            FormatStage::Pending,
            FormatStage::GeneratingCover,
            FormatStage::CoverDone,
            FormatStage::GeneratingInterior,
            FormatStage::InteriorDone,
            FormatStage::Assembling,
            FormatStage::Done,
        ]
    );
    for pair in book.history.windows(2) {
        assert!(pair[0].can_advance_to(pair[1]));
    }
}

#[tokio::test]
async fn test_photo_style_without_image_still_produces_cover() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());

    let request = story_request(dir.path()).with_cover_style(CoverStyle::Photo);
    let book = formatter.format_book(request).await.unwrap();

    let cover = book.cover_path.clone().unwrap();
    assert!(cover.is_file());
    assert_eq!(book.stage, FormatStage::Done);
}

#[tokio::test]
async fn test_coloring_book_with_missing_image() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());

    let metadata = BookMetadata::new("Farm Friends", AgeGroup::Toddler, BookType::Coloring, "farm");
    let images = vec![
        write_png(&dir.path().join("a.png")),
        dir.path().join("gone.png"),
        write_png(&dir.path().join("c.png")),
    ];
    let request = FormatRequest::new(metadata, Content::coloring(vec![ColoringPage::default(); 3]))
        .with_images(images);

    let book = formatter.format_book(request).await.unwrap();
    // Title page plus one page per image
    assert_eq!(book.interior_pages, 4);
    // Default coloring template is applied when none is requested
    assert_eq!(book.template.unwrap().id, "coloring_simple");
    assert_eq!(Document::load(&book.path).unwrap().get_pages().len(), 5);
}

#[tokio::test]
async fn test_requested_template_is_recorded() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());
    formatter.templates().ensure_builtin_templates().unwrap();

    let request = story_request(dir.path()).with_template("story_educational");
    let book = formatter.format_book(request).await.unwrap();
    assert_eq!(book.template.unwrap().name, "Educational Journey");

    // Unknown template ids are not fatal
    let request = story_request(dir.path()).with_template("no_such_template");
    let book = formatter.format_book(request).await.unwrap();
    assert!(book.template.is_none());
}

#[tokio::test]
async fn test_output_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());
    formatter.templates().ensure_builtin_templates().unwrap();

    let request = story_request(dir.path()).with_template("story_fantasy");
    let first = formatter.format_book(request.clone()).await.unwrap();
    let first_bytes = std::fs::read(&first.path).unwrap();
    let first_interior = std::fs::read(&first.interior_path).unwrap();

    let second = formatter.format_book(request).await.unwrap();
    assert_eq!(std::fs::read(&second.path).unwrap(), first_bytes);
    assert_eq!(std::fs::read(&second.interior_path).unwrap(), first_interior);
}

#[tokio::test]
async fn test_invalid_metadata_is_rejected() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());

    let mut request = story_request(dir.path());
    request.metadata.page_count = 2;
    assert!(matches!(
        formatter.format_book(request).await,
        Err(LayoutError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_generate_cover_only() {
    let dir = TempDir::new().unwrap();
    let formatter = formatter(dir.path());
    let metadata = BookMetadata::new("Just A Cover", AgeGroup::MiddleGrade, BookType::Story, "fantasy");

    let path = formatter
        .generate_cover(metadata, None, Some(CoverStyle::Gradient))
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("covers/just_a_cover_cover.pdf"));
    assert_eq!(Document::load(&path).unwrap().get_pages().len(), 1);
}

#[tokio::test]
async fn test_concurrent_books_share_one_store() {
    let dir = TempDir::new().unwrap();
    let options = LayoutOptions {
        dpi: 72,
        ..LayoutOptions::with_storage_root(dir.path())
    };
    let store = Arc::new(TemplateStore::open(options.templates_dir()).unwrap());
    let formatter = BookFormatter::new(options, store).unwrap();

    let mut handles = Vec::new();
    for i in 0..3 {
        let formatter = formatter.clone();
        let mut request = story_request(dir.path());
        request.metadata.title = format!("Book {}", i);
        handles.push(tokio::spawn(async move { formatter.format_book(request).await }));
    }
    for handle in handles {
        let book = handle.await.unwrap().unwrap();
        assert!(book.path.is_file());
    }
}
