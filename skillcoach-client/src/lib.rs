//! # SkillCoach client library (skillcoach-client)
//!
//! Typed access to the soft-skills coaching backend.
//!
//! **Purpose:** Authenticate, chat with the AI coach, take tests and
//! simulations (typed or spoken), follow analysis tasks to their scores, and
//! read the skill profile and development plan.
//!
//! **Architecture:** `reqwest` API client over a shared session, a
//! fixed-interval task poller, and a voice pipeline built on
//! symphonia + rubato (+ cpal for live capture).

pub mod api;
pub mod audio;
pub mod cli;
pub mod conversation;
pub mod error;
pub mod poller;
pub mod session;
pub mod voice;

pub use api::ApiClient;
pub use error::{Error, Result};
pub use poller::{PollSlot, TaskOutcome, TaskPoller};
pub use session::Session;
