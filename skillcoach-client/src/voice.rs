//! Voice turn upload
//!
//! A spoken turn is posted as `multipart/form-data`: the normalized audio
//! in the `file` field and, for simulations, the conversation so far as a
//! JSON array in the `messages` field.

use crate::api::ApiClient;
use crate::audio::UploadAudio;
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use skillcoach_common::api::{SimulationMessage, VoiceReply};
use skillcoach_common::events::ClientEvent;
use tracing::{debug, info};

/// Multipart body of a voice turn
#[derive(Debug, Clone)]
pub struct VoiceUpload {
    audio: UploadAudio,
    history: Option<Vec<SimulationMessage>>,
}

impl VoiceUpload {
    pub fn new(audio: UploadAudio) -> Self {
        Self {
            audio,
            history: None,
        }
    }

    /// Attach the conversation so far; an empty history is omitted
    pub fn with_history(mut self, history: Vec<SimulationMessage>) -> Self {
        self.history = if history.is_empty() { None } else { Some(history) };
        self
    }

    pub fn audio(&self) -> &UploadAudio {
        &self.audio
    }

    pub fn history(&self) -> Option<&[SimulationMessage]> {
        self.history.as_deref()
    }

    fn into_form(self) -> Result<Form> {
        let file = Part::bytes(self.audio.bytes)
            .file_name(self.audio.file_name)
            .mime_str(&self.audio.mime)
            .map_err(|e| Error::BadRequest(format!("Invalid audio MIME type: {}", e)))?;

        let mut form = Form::new().part("file", file);
        if let Some(history) = self.history {
            form = form.text("messages", serde_json::to_string(&history)?);
        }
        Ok(form)
    }
}

impl ApiClient {
    /// Post a voice turn to `path` and return the recognized text and reply
    pub(crate) async fn upload_voice(&self, path: &str, upload: VoiceUpload) -> Result<VoiceReply> {
        if upload.audio.is_empty() {
            return Err(Error::BadRequest("Recording is empty".to_string()));
        }

        let bytes = upload.audio.len();
        debug!(
            path = %path,
            bytes,
            mime = %upload.audio.mime,
            history = upload.history.as_ref().map(Vec::len).unwrap_or(0),
            "Uploading voice turn"
        );

        let reply: VoiceReply = self.post_multipart(path, upload.into_form()?).await?;

        info!(
            path = %path,
            transcript = reply.recognized_text().is_some(),
            reply = reply.reply_text().is_some(),
            "Voice turn answered"
        );
        self.events().emit_lossy(ClientEvent::UploadCompleted {
            endpoint: path.to_string(),
            bytes,
            timestamp: Utc::now(),
        });

        Ok(reply)
    }
}
