//! `/chat` endpoints

use super::ApiClient;
use crate::audio::UploadAudio;
use crate::error::Result;
use crate::voice::VoiceUpload;
use skillcoach_common::api::{ChatHistoryEntry, ChatRequest, ChatResponse, VoiceReply};

impl ApiClient {
    /// Send a text message to the AI coach; scoring continues under `task_id`
    pub async fn send_message(&self, message: &str) -> Result<ChatResponse> {
        let request = ChatRequest {
            message: message.to_string(),
        };
        self.post_json("/chat/send", &request).await
    }

    /// Stored conversation, oldest first
    pub async fn chat_history(&self, limit: u32) -> Result<Vec<ChatHistoryEntry>> {
        self.get_json("/chat/me/messages", &[("limit", limit.to_string())])
            .await
    }

    /// Upload a spoken chat turn
    pub async fn send_voice(&self, audio: UploadAudio) -> Result<VoiceReply> {
        self.upload_voice("/chat/voice", VoiceUpload::new(audio)).await
    }

    /// Original recording of a voice message, with its content type
    pub async fn chat_audio(&self, message_id: i64) -> Result<(Vec<u8>, Option<String>)> {
        self.get_bytes(&format!("/chat/audio/{}", message_id)).await
    }
}
