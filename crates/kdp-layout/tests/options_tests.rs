use kdp_layout::*;
use tempfile::TempDir;

#[test]
fn test_default_options_are_valid() {
    let options = LayoutOptions::default();
    assert!(options.validate().is_ok());
    assert_eq!(options.dpi, 300);
    assert_eq!(options.spine_text_threshold_pt, 72.0);
    assert_eq!(options.story_image_ratio, 0.8);
    assert_eq!(options.coloring_image_ratio, 0.9);
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut options = LayoutOptions {
        dpi: 0,
        ..Default::default()
    };
    match options.validate() {
        Err(LayoutError::Config(msg)) => assert!(msg.contains("DPI")),
        _ => panic!("Expected Config error"),
    }

    options.dpi = 300;
    options.story_image_ratio = 1.5;
    assert!(options.validate().is_err());

    options.story_image_ratio = 0.8;
    options.gradient_steps = 0;
    assert!(options.validate().is_err());

    options.gradient_steps = 20;
    options.caption_max_len = 3;
    assert!(options.validate().is_err());

    options.caption_max_len = 100;
    options.jpeg_quality = 0;
    assert!(options.validate().is_err());

    options.jpeg_quality = 90;
    assert!(options.validate().is_ok());
}

#[test]
fn test_storage_layout() {
    let dir = TempDir::new().unwrap();
    let options = LayoutOptions::with_storage_root(dir.path());
    options.ensure_storage_dirs().unwrap();

    for sub in ["books", "covers", "temp", "templates"] {
        assert!(dir.path().join(sub).is_dir(), "{} missing", sub);
    }
    assert_eq!(options.books_dir(), dir.path().join("books"));
}

#[tokio::test]
async fn test_options_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("layout.json");

    let mut options = LayoutOptions::with_storage_root(dir.path().join("storage"));
    options.paper_type = PaperType::Cream;
    options.gradient_steps = 8;
    options.debug_guides = true;

    options.save(&path).await.unwrap();
    let loaded = LayoutOptions::load(&path).await.unwrap();
    assert_eq!(loaded, options);
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.json");
    std::fs::write(&path, r#"{ "dpi": 150 }"#).unwrap();

    let loaded = LayoutOptions::load(&path).await.unwrap();
    assert_eq!(loaded.dpi, 150);
    assert_eq!(loaded.gradient_steps, LayoutOptions::default().gradient_steps);
}

#[tokio::test]
async fn test_malformed_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        LayoutOptions::load(&path).await,
        Err(LayoutError::Config(_))
    ));
}
