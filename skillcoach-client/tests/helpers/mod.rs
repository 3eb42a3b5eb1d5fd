//! Test helper modules for skillcoach-client integration tests
//!
//! - MockBackend: scripted `/api/v1` server on localhost
//! - Audio fixtures: in-memory WAV and Ogg clips

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::{ogg_clip, wav_clip};
pub use mock_backend::{MockBackend, RecordedBody, RecordedUpload, ACCESS_TOKEN, VALID_PASSWORD};
