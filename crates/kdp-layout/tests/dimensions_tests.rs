use kdp_layout::*;

#[test]
fn test_bleed_identities_hold_for_every_trim_size() {
    let calc = DimensionCalculator::default();
    for trim in TrimSize::ALL {
        let d = calc.dimensions(trim);
        assert_eq!(d.width_with_bleed_pt, d.width_pt + 2.0 * d.bleed_pt);
        assert_eq!(d.height_with_bleed_pt, d.height_pt + 2.0 * d.bleed_pt);
        assert_eq!(d.width_pt, d.width_in * 72.0);
        assert_eq!(d.height_pt, d.height_in * 72.0);
    }
}

#[test]
fn test_standard_trim_at_print_resolution() {
    let d = DimensionCalculator::new(300).dimensions(TrimSize::Standard);
    assert_eq!((d.width_px, d.height_px), (2550, 3300));
    assert_eq!((d.width_pt, d.height_pt), (612.0, 792.0));
    assert_eq!(d.bleed_pt, 9.0);
    assert_eq!(d.width_with_bleed_pt, 630.0);
}

#[test]
fn test_square_trim_is_square() {
    let d = DimensionCalculator::default().dimensions(TrimSize::Square);
    assert_eq!(d.width_pt, d.height_pt);
    assert_eq!(d.width_px, 2550);
}

#[test]
fn test_spine_width_is_monotonic() {
    for paper in [PaperType::White, PaperType::Cream] {
        let mut previous = 0.0;
        for pages in 1..=800 {
            let spine = spine_width_in(pages, paper);
            assert!(spine >= previous, "{} pages on {:?}", pages, paper);
            previous = spine;
        }
    }
}

#[test]
fn test_spine_uses_rounded_page_count() {
    for n in 1..=800u32 {
        let rounded = round_up_to_page_multiple(n);
        assert_eq!(
            spine_width_in(n, PaperType::White),
            spine_width_in(rounded, PaperType::White)
        );
    }
    assert_eq!(round_up_to_page_multiple(25), 28);
    assert_eq!(round_up_to_page_multiple(24), 24);
}

#[test]
fn test_cream_paper_is_thicker() {
    assert!(spine_width_in(100, PaperType::Cream) > spine_width_in(100, PaperType::White));
    assert_eq!(
        spine_width_for_paper_name(100, "cream"),
        spine_width_in(100, PaperType::Cream)
    );
    // Unknown paper falls back to white
    assert_eq!(
        spine_width_for_paper_name(100, "glossy"),
        spine_width_in(100, PaperType::White)
    );
}

#[test]
fn test_cover_layout_rectangles() {
    let cover = DimensionCalculator::new(72).cover_dimensions(TrimSize::Standard, 24, PaperType::White);
    let bleed = cover.page.bleed_pt;

    assert_eq!(cover.back.x, bleed);
    assert_eq!(cover.spine.x, cover.back.right());
    assert_eq!(cover.front.x, cover.spine.right());
    assert!((cover.front.right() + bleed - cover.full_width_pt).abs() < 1e-9);
    assert_eq!(cover.full_height_pt, 810.0);
    assert!((cover.spine_width_pt - 24.0 * 0.002252 * 72.0).abs() < 1e-9);

    let trim = cover.trim_rect();
    assert_eq!(trim.width, cover.width_with_spine_pt);
    assert_eq!(cover.back_with_bleed().x, 0.0);
    assert!((cover.front_with_bleed().right() - cover.full_width_pt).abs() < 1e-9);
}

#[test]
fn test_metadata_validation() {
    let mut metadata = BookMetadata::new("Test Book", AgeGroup::Preschool, BookType::Story, "animals");
    assert!(metadata.validate().is_ok());

    metadata.page_count = 12;
    assert!(matches!(metadata.validate(), Err(LayoutError::InvalidInput(_))));

    metadata.page_count = 801;
    assert!(metadata.validate().is_err());

    metadata.page_count = 30;
    metadata.title = "   ".to_string();
    assert!(metadata.validate().is_err());
}

#[test]
fn test_parse_enums() {
    assert_eq!("8.5x8.5".parse::<TrimSize>().unwrap(), TrimSize::Square);
    assert_eq!("3-5".parse::<AgeGroup>().unwrap(), AgeGroup::Preschool);
    assert_eq!("coloring".parse::<BookType>().unwrap(), BookType::Coloring);
    assert_eq!("gradient".parse::<CoverStyle>().unwrap(), CoverStyle::Gradient);
    assert!("6x9".parse::<TrimSize>().is_err());
    assert!("teen".parse::<AgeGroup>().is_err());
}
