use kdp_layout::templates::{BUILTIN_TEMPLATE_IDS, TemplateProperties, apply_template_properties};
use kdp_layout::*;
use tempfile::TempDir;

fn new_story_template(name: &str) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        description: "Big friendly letters".to_string(),
        book_type: BookType::Story,
        age_groups: vec![AgeGroup::Toddler, AgeGroup::Preschool],
        trim_sizes: vec![TrimSize::Square],
        properties: TemplateProperties {
            title_font: Some("Times-Bold".to_string()),
            body_font: Some("Times-Roman".to_string()),
            page_numbering: Some(false),
            ..Default::default()
        },
        preview_image: None,
    }
}

#[test]
fn test_builtins_created_once() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();

    assert_eq!(store.ensure_builtin_templates().unwrap(), 5);
    assert_eq!(store.ensure_builtin_templates().unwrap(), 0);

    let ids: Vec<String> = store.list().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, BUILTIN_TEMPLATE_IDS);
    for id in BUILTIN_TEMPLATE_IDS {
        assert!(dir.path().join(format!("{id}.json")).is_file());
    }
}

#[test]
fn test_create_get_and_persist() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();

    let created = store.create_template(new_story_template("Bedtime")).unwrap();
    assert!(created.id.starts_with("template_story_8_5x8_5_"));
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(store.get_template(&created.id), Some(created.clone()));

    // A fresh store sees the same record
    let reopened = TemplateStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get_template(&created.id), Some(created));
}

#[test]
fn test_record_uses_template_id_key() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    let created = store.create_template(new_story_template("Keys")).unwrap();

    let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", created.id))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["template_id"], created.id.as_str());
    assert_eq!(value["properties"]["title_font"], "Times-Bold");
}

#[test]
fn test_unknown_property_keys_survive() {
    let dir = TempDir::new().unwrap();
    let record = r##"{
        "template_id": "custom_one",
        "name": "Custom",
        "book_type": "story",
        "age_groups": ["5-7"],
        "properties": { "title_font": "Courier", "sparkles": 3 },
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    }"##;
    std::fs::write(dir.path().join("custom_one.json"), record).unwrap();
    std::fs::write(dir.path().join("garbage.json"), "{").unwrap();

    let store = TemplateStore::open(dir.path()).unwrap();
    assert_eq!(store.list().len(), 1);

    let updated = store
        .update_template(
            "custom_one",
            TemplateUpdate {
                description: Some("Now described".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.properties.extra["sparkles"], 3);
    assert_eq!(updated.properties.title_font.as_deref(), Some("Courier"));
}

#[test]
fn test_partial_update_merges() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    let created = store.create_template(new_story_template("Original")).unwrap();

    let updated = store
        .update_template(
            &created.id,
            TemplateUpdate {
                name: Some("Renamed".to_string()),
                properties: Some(TemplateProperties {
                    body_font: Some("Helvetica".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.age_groups, created.age_groups);
    assert_eq!(updated.properties.body_font.as_deref(), Some("Helvetica"));
    assert_eq!(updated.properties.title_font.as_deref(), Some("Times-Bold"));
    assert_eq!(updated.properties.page_numbering, Some(false));
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
fn test_update_missing_template_fails() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.update_template("nope", TemplateUpdate::default()),
        Err(LayoutError::TemplateNotFound(_))
    ));
}

#[test]
fn test_delete_removes_record_and_preview() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path().join("templates")).unwrap();

    let preview = dir.path().join("preview.png");
    image::RgbImage::new(4, 4).save(&preview).unwrap();
    let mut new = new_story_template("With preview");
    new.preview_image = Some(preview);

    let created = store.create_template(new).unwrap();
    let stored_preview = created.preview_image.clone().unwrap();
    assert!(stored_preview.is_file());
    assert!(stored_preview.ends_with(format!("{}_preview.png", created.id)));

    assert!(store.delete_template(&created.id).unwrap());
    assert!(!stored_preview.exists());
    assert!(store.get_template(&created.id).is_none());
    assert!(!store.delete_template(&created.id).unwrap());
}

#[test]
fn test_delete_disk_only_record_removes_preview() {
    let dir = TempDir::new().unwrap();
    let templates_dir = dir.path().join("templates");
    let store = TemplateStore::open(&templates_dir).unwrap();

    // Written by another store after this one loaded its cache
    let preview = dir.path().join("preview.png");
    image::RgbImage::new(4, 4).save(&preview).unwrap();
    let mut new = new_story_template("Disk only");
    new.preview_image = Some(preview);
    let created = TemplateStore::open(&templates_dir)
        .unwrap()
        .create_template(new)
        .unwrap();
    let stored_preview = created.preview_image.clone().unwrap();
    assert!(store.list().is_empty());

    assert!(store.delete_template(&created.id).unwrap());
    assert!(!templates_dir.join(format!("{}.json", created.id)).exists());
    assert!(!stored_preview.exists());
}

#[test]
fn test_naive_timestamps_load_and_keep_user_edits() {
    let dir = TempDir::new().unwrap();
    let record = serde_json::json!({
        "template_id": "story_standard_simple",
        "name": "My Custom Story",
        "book_type": "story",
        "age_groups": ["0-3"],
        "created_at": "2024-05-01T10:20:30.123456",
        "updated_at": "2024-05-02T08:00:00.000001"
    });
    let path = dir.path().join("story_standard_simple.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&record).unwrap()).unwrap();

    let store = TemplateStore::open(dir.path()).unwrap();
    let default = store
        .get_default_template(BookType::Story, None, None)
        .unwrap();
    assert_eq!(default.name, "My Custom Story");
    assert_eq!(default.created_at.to_rfc3339(), "2024-05-01T10:20:30.123456+00:00");

    let on_disk: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["name"], "My Custom Story");
}

#[test]
fn test_unreadable_builtin_record_is_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("story_standard_simple.json");
    std::fs::write(&path, b"{ \"template_id\": \"story_standard_simple\", broken").unwrap();

    let store = TemplateStore::open(dir.path()).unwrap();
    assert_eq!(store.ensure_builtin_templates().unwrap(), 4);
    assert!(store.get_template("story_standard_simple").is_none());

    let raw = std::fs::read(&path).unwrap();
    assert!(raw.ends_with(b"broken"));
}

#[test]
fn test_find_and_default_ordering() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    let custom = store.create_template(new_story_template("Custom")).unwrap();
    store.ensure_builtin_templates().unwrap();

    let toddler: Vec<String> = store
        .find_templates(BookType::Story, Some(AgeGroup::Toddler), None)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(toddler, vec!["story_standard_simple".to_string(), custom.id.clone()]);

    // Custom template is square-only
    let standard = store.find_templates(BookType::Story, Some(AgeGroup::Toddler), Some(TrimSize::Standard));
    assert!(standard.iter().all(|t| t.id != custom.id));

    let fantasy_age = store
        .get_default_template(BookType::Story, Some(AgeGroup::MiddleGrade), None)
        .unwrap();
    assert_eq!(fantasy_age.id, "story_standard_simple");

    let coloring = store
        .get_default_template(BookType::Coloring, Some(AgeGroup::Toddler), None)
        .unwrap();
    assert_eq!(coloring.id, "coloring_simple");
}

#[test]
fn test_default_template_recreates_builtins() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    assert!(store.list().is_empty());

    let template = store
        .get_default_template(BookType::Coloring, None, None)
        .unwrap();
    assert_eq!(template.id, "coloring_simple");
    assert_eq!(store.list().len(), 5);
}

#[test]
fn test_apply_template_does_not_touch_input() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    store.ensure_builtin_templates().unwrap();
    let template = store.get_template("story_fantasy").unwrap();

    let content = Content::story(vec![
        Chapter::new("One", "Once upon a time."),
        Chapter::new("Two", "The end."),
    ]);
    let before = content.clone();
    let applied = apply_template_properties(&content, &template);

    assert_eq!(content, before);
    let Content::Story(story) = applied else {
        panic!("expected story content");
    };
    assert_eq!(story.template.unwrap().id, "story_fantasy");
    for chapter in &story.chapters {
        let fmt = chapter.formatting.as_ref().unwrap();
        assert_eq!(fmt.body_alignment, Alignment::Justified);
        assert_eq!(fmt.image_placement, ImagePlacement::Alternating);
        assert_eq!(fmt.color_scheme.primary, "#7B2CBF");
    }
}

#[test]
fn test_apply_coloring_template() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    store.ensure_builtin_templates().unwrap();
    let template = store.get_template("coloring_educational").unwrap();

    let content = Content::coloring(vec![ColoringPage {
        caption: Some("A cat".to_string()),
    }]);
    let Content::Coloring(coloring) = apply_template_properties(&content, &template) else {
        panic!("expected coloring content");
    };
    let fmt = coloring.formatting.unwrap();
    assert!(fmt.captions);
    assert!(fmt.image_border);
    assert_eq!(coloring.pages.len(), 1);
}
