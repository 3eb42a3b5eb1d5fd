//! Voice turns end to end: normalization, multipart layout and replies

mod helpers;

use helpers::{ogg_clip, wav_clip, MockBackend, VALID_PASSWORD};
use skillcoach_client::audio::{prepare_upload, AudioClip};
use skillcoach_client::conversation::Conversation;
use skillcoach_client::Error;
use skillcoach_common::api::{Scenario, SimulationMessage};
use skillcoach_common::events::ClientEvent;

#[tokio::test]
async fn test_chat_voice_uploads_16k_mono_wav() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login("ada@example.com", VALID_PASSWORD).await.unwrap();

    let upload = prepare_upload(wav_clip(44_100, 2, 0.5)).await.unwrap();
    let reply = client.send_voice(upload).await.unwrap();

    assert_eq!(reply.recognized_text(), Some("how do I run a meeting"));
    assert_eq!(reply.reply_text(), Some("Start with an agenda."));
    assert_eq!(reply.task_id.as_deref(), Some("task-ok"));

    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 1);
    let sent = &uploads[0];
    assert_eq!(sent.path, "/api/v1/chat/voice");
    assert_eq!(sent.file_name.as_deref(), Some("voice.wav"));
    assert_eq!(sent.content_type.as_deref(), Some("audio/wav"));
    assert!(sent.messages.is_none());

    let reader = hound::WavReader::new(std::io::Cursor::new(sent.bytes.clone())).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);
    let frames = reader.duration() as i64;
    assert!((frames - 8_000).abs() <= 16, "got {} frames", frames);
}

#[tokio::test]
async fn test_ogg_recording_sent_unchanged() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login("ada@example.com", VALID_PASSWORD).await.unwrap();

    let original = match ogg_clip() {
        AudioClip::Encoded { bytes, .. } => bytes,
        AudioClip::Pcm(_) => unreachable!(),
    };
    let upload = prepare_upload(ogg_clip()).await.unwrap();
    client.send_voice(upload).await.unwrap();

    let sent = &backend.uploads()[0];
    assert_eq!(sent.bytes, original);
    assert_eq!(sent.file_name.as_deref(), Some("voice.ogg"));
    assert!(sent.content_type.as_deref().unwrap_or_default().starts_with("audio/ogg"));
}

#[tokio::test]
async fn test_simulation_voice_carries_history() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login("ada@example.com", VALID_PASSWORD).await.unwrap();

    let mut conversation = Conversation::default();
    conversation.push_assistant("We need to cut the budget by a third.");
    conversation.push_user("That seems steep.");
    let history = conversation.history();
    let pending = conversation.push_pending_voice();

    let upload = prepare_upload(ogg_clip()).await.unwrap();
    let reply = client
        .simulation_voice_reply(Scenario::Negotiation, upload, history.clone())
        .await
        .unwrap();
    conversation.apply_voice_reply(pending, &reply);

    let sent = &backend.uploads()[0];
    assert_eq!(sent.path, "/api/v1/tests/simulations/negotiation/voice-reply");
    let messages: Vec<SimulationMessage> =
        serde_json::from_str(sent.messages.as_deref().unwrap()).unwrap();
    assert_eq!(messages, history);
    assert_eq!(messages.len(), 2);

    let texts: Vec<&str> = conversation.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "We need to cut the budget by a third.",
            "That seems steep.",
            "I would start with the budget",
            "Why the budget?",
        ]
    );
}

#[tokio::test]
async fn test_upload_publishes_event() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login("ada@example.com", VALID_PASSWORD).await.unwrap();
    let mut events = client.events().subscribe();

    let upload = prepare_upload(ogg_clip()).await.unwrap();
    let bytes = upload.len();
    client.send_voice(upload).await.unwrap();

    match events.recv().await.unwrap() {
        ClientEvent::UploadCompleted { endpoint, bytes: sent, .. } => {
            assert_eq!(endpoint, "/chat/voice");
            assert_eq!(sent, bytes);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_audio_fails_before_upload() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    client.login("ada@example.com", VALID_PASSWORD).await.unwrap();

    let clip = AudioClip::encoded(vec![0x13; 512], Some("audio/webm".to_string()));
    let err = prepare_upload(clip).await.unwrap_err();

    assert!(matches!(err, Error::Decode(_)));
    assert!(backend.uploads().is_empty());
}
