#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use vehicle_swap::image::EditMetadata;
use vehicle_swap::{EditRequest, EditedImage, ImageEditor, InlineImage, Result, VehicleSwapError};

/// Bytes standing in for `car.png`.
pub const CAR_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'c', b'a', b'r',
];

/// Canned behaviour for [`RecordingEditor`].
pub enum Reply {
    Image(InlineImage),
    Nothing,
    Fail(String),
    Panic,
}

/// Editor that records requests and answers with a canned reply.
pub struct RecordingEditor {
    reply: Reply,
    requests: Mutex<Vec<EditRequest>>,
    gate: Option<Arc<Notify>>,
}

impl RecordingEditor {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Holds every call until the gate is notified.
    pub fn gated(reply: Reply, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(reply)
        }
    }

    pub fn requests(&self) -> Vec<EditRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEditor for RecordingEditor {
    async fn edit(&self, request: &EditRequest) -> Result<Option<EditedImage>> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.reply {
            Reply::Image(image) => Ok(Some(EditedImage::new(
                image.clone(),
                EditMetadata::default(),
            ))),
            Reply::Nothing => Ok(None),
            Reply::Fail(message) => Err(VehicleSwapError::Api {
                status: 500,
                message: message.clone(),
            }),
            Reply::Panic => panic!("editor crashed"),
        }
    }

    fn model(&self) -> &str {
        "recording"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
