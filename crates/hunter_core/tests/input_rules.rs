use hunter_core::{
    can_start, update, AppState, CrawlInput, MaxResults, Mode, Msg, Query, StagedImage,
    ValidationError, MAX_RESULTS, MIN_RESULTS,
};
use pretty_assertions::assert_eq;

fn image() -> StagedImage {
    StagedImage::new("cat.png", vec![0x89, b'P', b'N', b'G'])
}

#[test]
fn clamping_is_total() {
    for raw in [i64::MIN, -10, 0, 1, 2, 50, 499, 500, 501, 10_000, i64::MAX] {
        let clamped = MaxResults::clamped(raw).get();
        assert!(
            (MIN_RESULTS..=MAX_RESULTS).contains(&clamped),
            "{raw} clamped to {clamped}"
        );
    }
    assert_eq!(MaxResults::clamped(0).get(), 1);
    assert_eq!(MaxResults::clamped(-3).get(), 1);
    assert_eq!(MaxResults::clamped(501).get(), 500);
    assert_eq!(MaxResults::clamped(120).get(), 120);
    assert_eq!(MaxResults::from(u32::MAX).get(), 500);
    assert_eq!(MaxResults::default().get(), 50);
}

#[test]
fn max_results_message_clamps_form_value() {
    let (state, _) = update(AppState::new(), Msg::MaxResultsChanged(9_999));
    assert_eq!(state.view().max_results.get(), 500);

    let (state, _) = update(state, Msg::MaxResultsChanged(-1));
    assert_eq!(state.view().max_results.get(), 1);
}

#[test]
fn blank_keyword_cannot_start() {
    let state = AppState::new();
    for keyword in ["", " ", "\t\n  "] {
        let input = CrawlInput::keyword(keyword, MaxResults::default());
        assert!(!can_start(&state, &input), "{keyword:?}");
        assert_eq!(input.validate(), Err(ValidationError::EmptyKeyword));
    }
}

#[test]
fn upload_without_image_cannot_start_even_with_keyword() {
    let state = AppState::new();
    let input = CrawlInput {
        mode: Mode::Upload,
        keyword: "cats".to_string(),
        image: None,
        max_results: MaxResults::default(),
    };
    assert!(!can_start(&state, &input));
    assert_eq!(input.validate(), Err(ValidationError::MissingImage));
}

#[test]
fn valid_inputs_can_start_and_keyword_is_trimmed() {
    let state = AppState::new();
    let text = CrawlInput::keyword("  cats ", MaxResults::default());
    assert!(can_start(&state, &text));
    assert_eq!(text.validate(), Ok(Query::Keyword("cats".to_string())));

    let upload = CrawlInput::upload(image(), MaxResults::default());
    assert!(can_start(&state, &upload));
    assert_eq!(upload.validate(), Ok(Query::Image(image())));
}

#[test]
fn pending_submission_blocks_start() {
    let input = CrawlInput::keyword("cats", MaxResults::default());
    let (state, _) = update(AppState::new(), Msg::StartRequested(input.clone()));

    assert!(state.submission_pending());
    assert!(!can_start(&state, &input));
    assert!(!state.view().can_start);
}

#[test]
fn view_reports_can_start_from_form() {
    let (state, _) = update(AppState::new(), Msg::KeywordChanged("dogs".to_string()));
    assert!(state.view().can_start);

    let (state, _) = update(state, Msg::ModeSwitched(Mode::Upload));
    assert!(!state.view().can_start);

    let (state, _) = update(state, Msg::ImageStaged(image()));
    let view = state.view();
    assert!(view.can_start);
    assert_eq!(view.staged_image.as_deref(), Some("cat.png"));

    let (state, _) = update(state, Msg::ImageCleared);
    assert!(!state.view().can_start);
}
