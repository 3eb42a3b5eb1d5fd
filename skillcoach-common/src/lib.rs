//! # SkillCoach Common Library
//!
//! Shared code for the SkillCoach client crates including:
//! - Backend API request/response types
//! - Soft-skill model (the five scored skills)
//! - Client event types and the event bus
//! - Configuration loading

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod skills;

pub use error::{Error, Result};
pub use skills::{Skill, SkillScores};
