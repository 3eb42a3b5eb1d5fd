//! `/tests/simulations` endpoints: role-play scenarios

use super::ApiClient;
use crate::audio::UploadAudio;
use crate::error::{Error, Result};
use crate::voice::VoiceUpload;
use skillcoach_common::api::{
    Scenario, SimulationMessage, SimulationReply, SimulationReplyRequest,
    SimulationSubmitRequest, SimulationSubmitResponse, VoiceReply,
};

impl ApiClient {
    /// Next line of the conversation partner
    pub async fn simulation_reply(
        &self,
        scenario: Scenario,
        messages: Vec<SimulationMessage>,
    ) -> Result<SimulationReply> {
        if messages.is_empty() {
            return Err(Error::BadRequest("simulation history is empty".to_string()));
        }
        let request = SimulationReplyRequest { messages };
        self.post_json(&format!("/tests/simulations/{}/reply", scenario.slug()), &request)
            .await
    }

    /// Submit the finished transcript for scoring
    pub async fn simulation_submit(
        &self,
        scenario: Scenario,
        conversation: &str,
    ) -> Result<SimulationSubmitResponse> {
        if conversation.trim().is_empty() {
            return Err(Error::BadRequest("simulation transcript is empty".to_string()));
        }
        let request = SimulationSubmitRequest {
            conversation: conversation.to_string(),
        };
        self.post_json(&format!("/tests/simulations/{}/submit", scenario.slug()), &request)
            .await
    }

    /// Upload a spoken simulation turn together with the history so far
    pub async fn simulation_voice_reply(
        &self,
        scenario: Scenario,
        audio: UploadAudio,
        history: Vec<SimulationMessage>,
    ) -> Result<VoiceReply> {
        let upload = VoiceUpload::new(audio).with_history(history);
        self.upload_voice(
            &format!("/tests/simulations/{}/voice-reply", scenario.slug()),
            upload,
        )
        .await
    }
}
