mod common;

use base64::Engine;
use common::{RecordingEditor, Reply, CAR_PNG};
use std::sync::Arc;
use vehicle_swap::form::NO_RESULT_MESSAGE;
use vehicle_swap::image::prompt::VEHICLE_SWAP_DIRECTIVE;
use vehicle_swap::{
    DiskFile, EditForm, InlineImage, MemoryFile, RequestStatus, ResultPanel, VehicleSwapError,
};

async fn form_with_car() -> EditForm {
    let mut form = EditForm::new();
    form.select_image(Arc::new(MemoryFile::new("car.png", "image/png", CAR_PNG.to_vec())))
        .await
        .unwrap();
    form.set_prompt("a vintage steam train");
    form
}

#[tokio::test]
async fn steam_train_end_to_end() {
    let editor = RecordingEditor::new(Reply::Image(InlineImage::new("c3RlYW0tdHJhaW4=", "image/png")));
    let mut form = form_with_car().await;

    form.submit(&editor).await.unwrap();

    let requests = editor.requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(
        sent.image.data,
        base64::engine::general_purpose::STANDARD.encode(CAR_PNG)
    );
    assert_eq!(sent.image.mime_type, "image/png");
    let instruction = sent.instruction();
    assert!(instruction.contains(VEHICLE_SWAP_DIRECTIVE));
    assert!(instruction.contains("a vintage steam train"));

    assert_eq!(
        form.panel(),
        ResultPanel::Result {
            image_url: "data:image/png;base64,c3RlYW0tdHJhaW4=".into()
        }
    );
    assert!(!form.is_loading());
}

#[tokio::test]
async fn empty_result_shows_retry_suggestion() {
    let editor = RecordingEditor::new(Reply::Nothing);
    let mut form = form_with_car().await;

    form.submit(&editor).await.unwrap();

    assert_eq!(form.error(), Some(NO_RESULT_MESSAGE));
    assert!(form.generated().is_none());
}

#[tokio::test]
async fn service_error_message_reaches_panel() {
    let editor = RecordingEditor::new(Reply::Fail("model overloaded".into()));
    let mut form = form_with_car().await;

    form.submit(&editor).await.unwrap();

    match form.status() {
        RequestStatus::Error(message) => assert!(message.contains("model overloaded")),
        other => panic!("expected error, got {other:?}"),
    }
    assert!(!form.is_loading());
}

#[tokio::test]
async fn file_removed_before_submit_is_file_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("car.png");
    std::fs::write(&path, CAR_PNG).unwrap();

    let mut form = EditForm::new();
    form.select_image(Arc::new(DiskFile::open(&path).unwrap()))
        .await
        .unwrap();
    form.set_prompt("a hovercraft");
    assert!(form.original().unwrap().preview_url().is_some());

    std::fs::remove_file(&path).unwrap();

    let editor = RecordingEditor::new(Reply::Nothing);
    form.submit(&editor).await.unwrap();

    assert!(editor.requests().is_empty());
    assert!(form.error().unwrap().contains("Failed to read the image file"));
    assert!(!form.is_loading());
    assert!(form.can_submit());
}

#[tokio::test]
async fn submit_without_prompt_is_rejected() {
    let editor = RecordingEditor::new(Reply::Nothing);
    let mut form = form_with_car().await;
    form.set_prompt("");

    let err = form.submit(&editor).await.unwrap_err();
    assert!(matches!(err, VehicleSwapError::MissingInput));
    assert!(editor.requests().is_empty());
}

#[tokio::test]
async fn resubmitting_cycles_through_loading() {
    let editor = RecordingEditor::new(Reply::Image(InlineImage::new("AAAA", "image/webp")));
    let mut form = form_with_car().await;

    form.submit(&editor).await.unwrap();
    assert!(form.generated().is_some());

    let ticket = form.begin_submit().unwrap();
    assert_eq!(form.panel(), ResultPanel::Loading);
    assert!(form.generated().is_none());

    let outcome = ticket.run(&editor).await;
    assert!(form.finish_submit(ticket, outcome));
    assert_eq!(editor.requests().len(), 2);
    assert_eq!(
        form.generated().unwrap().to_data_url(),
        "data:image/webp;base64,AAAA"
    );
}
