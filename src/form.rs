//! Form state for one vehicle swap session.
//!
//! [`EditForm`] owns everything the page shows: the chosen image and its
//! preview, the prompt, and a single [`RequestStatus`] from which the result
//! panel is derived. Submission is split into [`EditForm::begin_submit`] and
//! [`EditForm::finish_submit`] so a shared form never has to stay locked
//! while the image service is working.

use crate::error::{Result, VehicleSwapError};
use crate::image::{ensure_accepted, EditRequest, EditedImage, ImageEditor, ImageFile, InlineImage};
use serde::Serialize;
use std::sync::Arc;

/// Shown when the service answered without an image.
pub const NO_RESULT_MESSAGE: &str =
    "Could not generate an image. Please try again with a different image or description.";

/// Outcome of one edit exchange.
pub type SubmitOutcome = Result<Option<EditedImage>>;

/// Where the current submission stands.
#[derive(Debug, Clone, Default)]
pub enum RequestStatus {
    /// Nothing submitted since the last image change.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The service returned an image.
    Success(EditedImage),
    /// The last action failed; holds the message shown to the user.
    Error(String),
}

/// The image the user picked.
pub struct OriginalImage {
    file: Arc<dyn ImageFile>,
    preview_url: Option<String>,
}

impl OriginalImage {
    /// File name as uploaded.
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Declared MIME type.
    pub fn mime_type(&self) -> &str {
        self.file.mime_type()
    }

    /// Data URL for the preview, once the file has been read.
    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }
}

impl std::fmt::Debug for OriginalImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginalImage")
            .field("name", &self.name())
            .field("mime_type", &self.mime_type())
            .field("has_preview", &self.preview_url.is_some())
            .finish()
    }
}

/// Claim on the single request slot, handed out by [`EditForm::begin_submit`].
pub struct SubmitTicket {
    id: u64,
    file: Arc<dyn ImageFile>,
    vehicle: String,
}

impl SubmitTicket {
    /// Identifier of this submission.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The vehicle description captured at submit time.
    pub fn vehicle(&self) -> &str {
        &self.vehicle
    }

    /// Re-reads the selected file and performs the edit.
    pub async fn run(&self, editor: &dyn ImageEditor) -> SubmitOutcome {
        let bytes = self.file.read().await?;
        let image = InlineImage::from_bytes(&bytes, self.file.mime_type());
        let request = EditRequest::new(image, self.vehicle.clone());
        editor.edit(&request).await
    }
}

/// What the result panel shows. Exactly one state at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResultPanel {
    /// Spinner.
    Loading,
    /// Error message.
    Error {
        /// User-facing text.
        message: String,
    },
    /// The generated image.
    Result {
        /// `data:` URL of the generated image.
        image_url: String,
    },
    /// Placeholder.
    Empty,
}

/// Snapshot of the form for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    /// Name of the selected file.
    pub file_name: Option<String>,
    /// Preview of the selected file.
    pub preview_url: Option<String>,
    /// Current prompt text.
    pub prompt: String,
    /// Whether every submit precondition holds right now.
    pub can_submit: bool,
    /// Whether the page offers the submit button. The prompt is typed in
    /// the browser, so only the image and the slot are checked here.
    pub submit_enabled: bool,
    /// Whether a request is still outstanding.
    pub busy: bool,
    /// Result panel state.
    pub panel: ResultPanel,
}

/// Form state for a vehicle swap session.
#[derive(Debug, Default)]
pub struct EditForm {
    original: Option<OriginalImage>,
    prompt: String,
    status: RequestStatus,
    /// Request currently holding the slot.
    in_flight: Option<u64>,
    /// Request whose outcome will be displayed.
    displayed: Option<u64>,
    next_ticket: u64,
}

impl EditForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a new image, dropping any previous result or error.
    ///
    /// The file is read once for the preview. A read failure keeps the
    /// selection but shows the error.
    pub async fn select_image(&mut self, file: Arc<dyn ImageFile>) -> Result<()> {
        self.displayed = None;

        if let Err(e) = ensure_accepted(file.mime_type()) {
            self.status = RequestStatus::Error(e.user_message());
            return Err(e);
        }

        self.status = RequestStatus::Idle;
        self.original = Some(OriginalImage {
            file: Arc::clone(&file),
            preview_url: None,
        });

        match file.read().await {
            Ok(bytes) => {
                let preview = InlineImage::from_bytes(&bytes, file.mime_type()).to_data_url();
                tracing::debug!(name = file.name(), size = bytes.len(), "image selected");
                if let Some(original) = self.original.as_mut() {
                    original.preview_url = Some(preview);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(name = file.name(), "failed to read selected image: {e}");
                self.report_file_error(&e);
                Err(e)
            }
        }
    }

    /// Records a failure to obtain the uploaded file.
    pub fn report_file_error(&mut self, error: &VehicleSwapError) {
        self.displayed = None;
        self.status = RequestStatus::Error(error.user_message());
    }

    /// Removes the image, the result and any error. The prompt is kept.
    pub fn clear_image(&mut self) {
        self.original = None;
        self.displayed = None;
        self.status = RequestStatus::Idle;
    }

    /// Replaces the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The selected image, if any.
    pub fn original(&self) -> Option<&OriginalImage> {
        self.original.as_ref()
    }

    /// Current request status.
    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    /// The generated image, if the last submission succeeded.
    pub fn generated(&self) -> Option<&EditedImage> {
        match &self.status {
            RequestStatus::Success(image) => Some(image),
            _ => None,
        }
    }

    /// The message on display, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            RequestStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// True while the result panel shows the spinner.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, RequestStatus::Loading)
    }

    /// True while a request holds the slot, even if its result will be discarded.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        self.submit_enabled() && !self.prompt.trim().is_empty()
    }

    /// An image is selected and no request holds the slot.
    pub fn submit_enabled(&self) -> bool {
        self.original.is_some() && !self.is_busy()
    }

    /// Claims the request slot and switches to loading.
    ///
    /// Rejected with [`VehicleSwapError::RequestInFlight`] while another
    /// request is pending (state untouched), or with
    /// [`VehicleSwapError::MissingInput`] when the image or prompt is missing
    /// (shown as a validation message).
    pub fn begin_submit(&mut self) -> Result<SubmitTicket> {
        if self.is_busy() {
            return Err(VehicleSwapError::RequestInFlight);
        }

        let file = match &self.original {
            Some(original) if !self.prompt.trim().is_empty() => Arc::clone(&original.file),
            _ => {
                let err = VehicleSwapError::MissingInput;
                self.status = RequestStatus::Error(err.user_message());
                return Err(err);
            }
        };

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);
        self.displayed = Some(id);
        self.status = RequestStatus::Loading;

        tracing::info!(ticket = id, name = file.name(), "submitting vehicle swap");

        Ok(SubmitTicket {
            id,
            file,
            vehicle: self.prompt.trim().to_string(),
        })
    }

    /// Releases the slot and shows the outcome.
    ///
    /// Returns false when the image was cleared or replaced in the meantime;
    /// the outcome is then dropped.
    pub fn finish_submit(&mut self, ticket: SubmitTicket, outcome: SubmitOutcome) -> bool {
        self.settle(ticket.id, outcome)
    }

    /// Releases the slot of a request whose ticket was lost, e.g. because
    /// the task running it panicked.
    pub fn abandon_submit(&mut self, id: u64, error: VehicleSwapError) -> bool {
        self.settle(id, Err(error))
    }

    fn settle(&mut self, id: u64, outcome: SubmitOutcome) -> bool {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }

        if self.displayed != Some(id) {
            tracing::debug!(ticket = id, "discarding result of superseded request");
            return false;
        }
        self.displayed = None;

        self.status = match outcome {
            Ok(Some(image)) => {
                tracing::info!(ticket = id, mime_type = %image.image.mime_type, "vehicle swap succeeded");
                RequestStatus::Success(image)
            }
            Ok(None) => RequestStatus::Error(NO_RESULT_MESSAGE.to_string()),
            Err(e) => {
                tracing::warn!(ticket = id, "vehicle swap failed: {e}");
                RequestStatus::Error(e.user_message())
            }
        };
        true
    }

    /// Runs a whole submission against `editor`.
    ///
    /// `Err` only when the submission was rejected up front; the outcome of
    /// the edit itself lands in [`EditForm::status`].
    pub async fn submit(&mut self, editor: &dyn ImageEditor) -> Result<()> {
        let ticket = self.begin_submit()?;
        let outcome = ticket.run(editor).await;
        self.finish_submit(ticket, outcome);
        Ok(())
    }

    /// Result panel state derived from the status.
    pub fn panel(&self) -> ResultPanel {
        match &self.status {
            RequestStatus::Loading => ResultPanel::Loading,
            RequestStatus::Error(message) => ResultPanel::Error {
                message: message.clone(),
            },
            RequestStatus::Success(image) => ResultPanel::Result {
                image_url: image.to_data_url(),
            },
            RequestStatus::Idle => ResultPanel::Empty,
        }
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> FormView {
        FormView {
            file_name: self.original.as_ref().map(|o| o.name().to_string()),
            preview_url: self
                .original
                .as_ref()
                .and_then(|o| o.preview_url().map(str::to_string)),
            prompt: self.prompt.clone(),
            can_submit: self.can_submit(),
            submit_enabled: self.submit_enabled(),
            busy: self.is_busy(),
            panel: self.panel(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{EditMetadata, MemoryFile};
    use async_trait::async_trait;

    struct UnreadableFile;

    #[async_trait]
    impl ImageFile for UnreadableFile {
        fn name(&self) -> &str {
            "broken.png"
        }

        fn mime_type(&self) -> &str {
            "image/png"
        }

        async fn read(&self) -> Result<Vec<u8>> {
            Err(VehicleSwapError::FileRead("device not ready".into()))
        }
    }

    fn png_file() -> Arc<dyn ImageFile> {
        Arc::new(MemoryFile::new("car.png", "image/png", b"png-bytes".to_vec()))
    }

    fn edited(data: &str) -> EditedImage {
        EditedImage::new(InlineImage::new(data, "image/png"), EditMetadata::default())
    }

    async fn ready_form() -> EditForm {
        let mut form = EditForm::new();
        form.select_image(png_file()).await.unwrap();
        form.set_prompt("a fire truck");
        form
    }

    #[tokio::test]
    async fn test_select_image_builds_preview() {
        let form = ready_form().await;
        let original = form.original().unwrap();
        assert_eq!(original.name(), "car.png");
        assert_eq!(
            original.preview_url(),
            Some("data:image/png;base64,cG5nLWJ5dGVz")
        );
        assert_eq!(form.panel(), ResultPanel::Empty);
    }

    #[tokio::test]
    async fn test_select_rejects_unsupported_type() {
        let mut form = EditForm::new();
        let gif = Arc::new(MemoryFile::new("anim.gif", "image/gif", vec![0; 16]));
        let err = form.select_image(gif).await.unwrap_err();
        assert!(matches!(err, VehicleSwapError::UnsupportedImageType(_)));
        assert!(form.original().is_none());
        assert!(form.error().unwrap().contains("image/gif"));
    }

    #[tokio::test]
    async fn test_select_read_failure_shows_error_without_loading() {
        let mut form = EditForm::new();
        assert!(form.select_image(Arc::new(UnreadableFile)).await.is_err());
        assert!(!form.is_loading());
        assert!(form.error().unwrap().contains("device not ready"));
    }

    #[tokio::test]
    async fn test_select_resets_previous_result() {
        let mut form = ready_form().await;
        let ticket = form.begin_submit().unwrap();
        form.finish_submit(ticket, Ok(Some(edited("abc"))));
        assert!(form.generated().is_some());

        form.select_image(png_file()).await.unwrap();
        assert!(form.generated().is_none());
        assert!(form.error().is_none());
        assert_eq!(form.prompt(), "a fire truck");
    }

    #[tokio::test]
    async fn test_clear_image_resets_everything_but_prompt() {
        let mut form = ready_form().await;
        let ticket = form.begin_submit().unwrap();
        form.finish_submit(ticket, Err(VehicleSwapError::Auth("nope".into())));
        assert!(form.error().is_some());

        form.clear_image();
        assert!(form.original().is_none());
        assert!(form.error().is_none());
        assert!(form.generated().is_none());
        assert_eq!(form.panel(), ResultPanel::Empty);
        assert_eq!(form.prompt(), "a fire truck");
    }

    #[tokio::test]
    async fn test_can_submit_requires_image_prompt_and_free_slot() {
        let mut form = EditForm::new();
        assert!(!form.can_submit());

        form.set_prompt("a bus");
        assert!(!form.can_submit());

        form.select_image(png_file()).await.unwrap();
        assert!(form.can_submit());

        form.set_prompt("   ");
        assert!(!form.can_submit());

        form.set_prompt("a bus");
        let ticket = form.begin_submit().unwrap();
        assert!(!form.can_submit());
        form.finish_submit(ticket, Ok(None));
        assert!(form.can_submit());
    }

    #[test]
    fn test_begin_submit_without_inputs_is_validation_error() {
        let mut form = EditForm::new();
        form.set_prompt("a bus");
        let err = form.begin_submit().err().unwrap();
        assert!(matches!(err, VehicleSwapError::MissingInput));
        assert!(!form.is_loading());
        assert_eq!(form.error(), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_pending() {
        let mut form = ready_form().await;
        let first = form.begin_submit().unwrap();
        assert!(form.is_loading());

        let err = form.begin_submit().err().unwrap();
        assert!(matches!(err, VehicleSwapError::RequestInFlight));
        assert!(form.is_loading());

        assert!(form.finish_submit(first, Ok(Some(edited("xyz")))));
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn test_outcomes_map_to_exactly_one_panel() {
        let mut form = ready_form().await;

        let ticket = form.begin_submit().unwrap();
        assert_eq!(form.panel(), ResultPanel::Loading);
        form.finish_submit(ticket, Ok(Some(edited("R0lG"))));
        assert_eq!(
            form.panel(),
            ResultPanel::Result {
                image_url: "data:image/png;base64,R0lG".into()
            }
        );

        let ticket = form.begin_submit().unwrap();
        assert!(form.generated().is_none());
        form.finish_submit(ticket, Ok(None));
        assert_eq!(
            form.panel(),
            ResultPanel::Error {
                message: NO_RESULT_MESSAGE.into()
            }
        );

        let ticket = form.begin_submit().unwrap();
        assert!(form.error().is_none());
        form.finish_submit(
            ticket,
            Err(VehicleSwapError::Api {
                status: 503,
                message: "overloaded".into(),
            }),
        );
        assert!(form.error().unwrap().contains("overloaded"));
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn test_result_after_clear_is_discarded() {
        let mut form = ready_form().await;
        let ticket = form.begin_submit().unwrap();

        form.clear_image();
        assert!(!form.is_loading());
        assert!(form.is_busy());

        assert!(!form.finish_submit(ticket, Ok(Some(edited("late")))));
        assert!(form.generated().is_none());
        assert!(!form.is_busy());
        assert_eq!(form.panel(), ResultPanel::Empty);
    }

    #[tokio::test]
    async fn test_abandoned_request_releases_slot() {
        let mut form = ready_form().await;
        let ticket = form.begin_submit().unwrap();
        let id = ticket.id();
        drop(ticket);

        assert!(form.abandon_submit(id, VehicleSwapError::Internal("task panicked".into())));
        assert!(!form.is_busy());
        assert!(form.error().unwrap().contains("task panicked"));
        assert!(form.can_submit());
    }

    #[tokio::test]
    async fn test_submit_enabled_ignores_server_side_prompt() {
        let mut form = EditForm::new();
        assert!(!form.view().submit_enabled);

        form.select_image(png_file()).await.unwrap();
        let view = form.view();
        assert!(view.submit_enabled);
        assert!(!view.can_submit);

        form.set_prompt("a tram");
        let _ticket = form.begin_submit().unwrap();
        assert!(!form.view().submit_enabled);
    }

    #[tokio::test]
    async fn test_view_snapshot() {
        let form = ready_form().await;
        let view = form.view();
        assert_eq!(view.file_name.as_deref(), Some("car.png"));
        assert!(view.can_submit);
        assert!(!view.busy);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["panel"]["state"], "empty");
    }
}
