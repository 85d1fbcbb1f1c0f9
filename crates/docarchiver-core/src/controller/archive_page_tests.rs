use std::sync::Arc;
use std::time::Duration;

use docarchiver_config::{AutomationSettings, TimingConfig};
use tokio::time::Instant;

use super::*;
use crate::fixtures::{ARCHIVE_URL, ArchivePageFixture, LIST_URL};
use crate::memory::{Element, MemoryDocument, Reaction, RecordedAction};

fn controller() -> ArchivePageController {
    ArchivePageController::new("確定存檔", TimingConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_fills_and_confirms() {
    let form = ArchivePageFixture::standard();
    let settings = AutomationSettings::default();
    let start = Instant::now();

    let outcome = controller().run(form.doc.as_ref(), &settings).await;

    assert!(matches!(outcome, ControllerOutcome::Archived));
    assert_eq!(
        form.doc.actions(),
        vec![
            RecordedAction::ValueSet(form.file_code, "03010101".to_string()),
            RecordedAction::Dispatched(form.file_code, DomEvent::Change),
            RecordedAction::ValueSet(form.case_sequence, "1".to_string()),
            RecordedAction::Dispatched(form.case_sequence, DomEvent::Change),
            RecordedAction::Clicked(form.confirm),
        ]
    );
    assert_eq!(form.doc.url(), LIST_URL);
    assert_eq!(start.elapsed(), Duration::from_millis(7000));
}

#[tokio::test(start_paused = true)]
async fn test_uses_configured_codes() {
    let form = ArchivePageFixture::standard();
    let settings = AutomationSettings::default().with_codes("03010102", "3");

    let outcome = controller().run(form.doc.as_ref(), &settings).await;

    assert!(matches!(outcome, ControllerOutcome::Archived));
    assert_eq!(form.doc.value_of(form.file_code), "03010102");
    assert_eq!(form.doc.value_of(form.case_sequence), "3");
}

#[tokio::test(start_paused = true)]
async fn test_unknown_file_code() {
    let form = ArchivePageFixture::standard();
    let settings = AutomationSettings::default().with_codes("09999999", "1");

    let outcome = controller().run(form.doc.as_ref(), &settings).await;

    match outcome {
        ControllerOutcome::Aborted(AutomationError::OptionUnavailable { control, value }) => {
            assert_eq!(control, "檔號選單");
            assert_eq!(value, "09999999");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(
        !form
            .doc
            .actions()
            .contains(&RecordedAction::Dispatched(form.file_code, DomEvent::Change))
    );
}

#[tokio::test(start_paused = true)]
async fn test_case_options_never_load() {
    let form = ArchivePageFixture::build(&["03010101"], &[]);
    let start = Instant::now();

    let outcome = controller()
        .run(form.doc.as_ref(), &AutomationSettings::default())
        .await;

    match outcome {
        ControllerOutcome::Aborted(AutomationError::TransientNotFound { control, waited_ms }) => {
            assert_eq!(control, "案次號選項");
            assert_eq!(waited_ms, 4000);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(start.elapsed(), Duration::from_millis(5000));
    assert!(
        !form
            .doc
            .actions()
            .iter()
            .any(|a| matches!(a, RecordedAction::Clicked(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_case_options_arrive_during_backoff() {
    let doc = Arc::new(MemoryDocument::new(ARCHIVE_URL));
    doc.append(
        None,
        Element::new("select").attr("name", "q_fsKindno").options(&["", "03010101"]),
    );
    let caseno = doc.append(
        None,
        Element::new("select").attr("name", "q_caseno").options(&[""]),
    );
    doc.append(
        None,
        Element::new("input").attr("name", "updateSubmit").attr("value", "確定存檔"),
    );
    let loader = doc.append(None, Element::new("script"));
    doc.on(
        loader,
        DomEvent::Change,
        Reaction::SetOptions {
            select: caseno,
            options: vec!["".to_string(), "1".to_string()],
        },
    );

    let late = doc.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4000)).await;
        let _ = late.dispatch_event(loader, DomEvent::Change).await;
    });

    let outcome = controller()
        .run(doc.as_ref(), &AutomationSettings::default())
        .await;

    assert!(matches!(outcome, ControllerOutcome::Archived));
    assert_eq!(doc.value_of(caseno), "1");
}

#[tokio::test(start_paused = true)]
async fn test_missing_file_code_select() {
    let doc = MemoryDocument::new(ARCHIVE_URL);
    let start = Instant::now();

    let outcome = controller()
        .run(&doc, &AutomationSettings::default())
        .await;

    assert!(matches!(
        outcome,
        ControllerOutcome::Aborted(AutomationError::TransientNotFound { ref control, .. })
            if control == "檔號選單"
    ));
    assert_eq!(start.elapsed(), Duration::from_millis(6000));
}

#[tokio::test(start_paused = true)]
async fn test_missing_confirm_control() {
    let form = ArchivePageFixture::build(&["03010101"], &["1"]);
    let controller = ArchivePageController::new("存檔", TimingConfig::default());

    let outcome = controller
        .run(form.doc.as_ref(), &AutomationSettings::default())
        .await;

    assert!(matches!(
        outcome,
        ControllerOutcome::Aborted(AutomationError::TransientNotFound { ref control, .. })
            if control == "確定存檔按鈕"
    ));
    assert_eq!(form.doc.url(), ARCHIVE_URL);
}

#[tokio::test(start_paused = true)]
async fn test_frame_lost_mid_form() {
    let form = ArchivePageFixture::standard();
    let doc = form.doc.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        doc.set_unavailable(Some(DomError::FrameAbsent("dTreeContent".to_string())));
    });

    let outcome = controller()
        .run(form.doc.as_ref(), &AutomationSettings::default())
        .await;

    assert!(matches!(outcome, ControllerOutcome::Aborted(_)));
}
