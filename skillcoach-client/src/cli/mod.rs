//! Command-line interface
//!
//! Argument definitions live here; [`commands`] executes them against an
//! [`ApiClient`](crate::ApiClient) and [`output`] renders the results.

pub mod commands;
pub mod output;

use clap::{Args, Parser, Subcommand};
use skillcoach_common::api::Scenario;
use skillcoach_common::config::ConfigOverrides;
use std::path::PathBuf;

/// SkillCoach command-line client
#[derive(Parser, Debug)]
#[command(name = "skillcoach")]
#[command(about = "Soft-skills coaching client: chat, tests, simulations, profile and plan")]
#[command(version)]
pub struct Cli {
    /// Backend API root (e.g. http://localhost:8000/api/v1)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Path to the TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Where the login token is kept between runs
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Log filter when RUST_LOG is not set (e.g. debug)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Interval between analysis status requests
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting for an analysis after this many seconds (0 = never)
    #[arg(long, global = true)]
    pub poll_timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            base_url: self.base_url.clone(),
            session_file: self.session_file.clone(),
            log_level: self.log_level.clone(),
            poll_interval_ms: self.poll_interval_ms,
            poll_timeout_secs: self.poll_timeout_secs,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and remember the token
    Login {
        /// Account e-mail
        email: String,

        #[arg(long, env = "SKILLCOACH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the saved token
    Logout,

    /// Create an account
    Register {
        email: String,

        #[arg(long, env = "SKILLCOACH_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,
    },

    /// Show the logged-in user
    Whoami,

    /// Change the password of the logged-in user
    Passwd {
        #[arg(long)]
        old_password: String,

        #[arg(long)]
        new_password: String,
    },

    /// Chat with the AI coach
    Chat {
        #[command(subcommand)]
        action: ChatCommands,
    },

    /// Quizzes and case studies
    Tests {
        #[command(subcommand)]
        action: TestCommands,
    },

    /// Role-play simulations
    Sim {
        #[command(subcommand)]
        action: SimCommands,
    },

    /// Analysis tasks and results
    Analysis {
        #[command(subcommand)]
        action: AnalysisCommands,
    },

    /// Skill profile
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    /// Development plan
    Plan {
        #[command(subcommand)]
        action: PlanCommands,
    },

    /// Administrative console (admin accounts only)
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },

    /// List audio input devices
    Devices,
}

/// Block on the analysis task started by a submission
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct WaitArgs {
    /// Poll the analysis task and print the scores
    #[arg(long)]
    pub wait: bool,
}

/// Where a spoken turn comes from
#[derive(Args, Debug, Clone, Default)]
pub struct AudioSource {
    /// Recorded audio file (ogg, webm, wav, mp3, flac, m4a)
    #[arg(long, required_unless_present = "record")]
    pub file: Option<PathBuf>,

    /// Record from the microphone instead of reading a file
    #[arg(long, conflicts_with = "file")]
    pub record: bool,

    /// Recording length in seconds (defaults to the configured value)
    #[arg(long, requires = "record")]
    pub seconds: Option<u64>,

    /// Input device name (defaults to the system default)
    #[arg(long, requires = "record")]
    pub device: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ChatCommands {
    /// Send a text message
    Send {
        message: String,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Send a spoken message
    Voice {
        #[command(flatten)]
        audio: AudioSource,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Show the stored conversation
    History {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },

    /// Download the recording of a voice message
    Audio {
        message_id: i64,

        /// Output file
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum TestCommands {
    /// List available tests
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Show a test with its questions
    Show { test_id: i64 },

    /// Submit quiz answers
    Submit {
        test_id: i64,

        /// Answer as QUESTION_ID=VALUE; repeat per question
        #[arg(long = "answer", short = 'a', value_parser = parse_answer, required = true)]
        answers: Vec<(String, String)>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Submit a written case solution
    Case {
        test_id: i64,

        /// Solution text
        #[arg(long, conflicts_with = "solution_file", required_unless_present = "solution_file")]
        solution: Option<String>,

        /// Read the solution from a file
        #[arg(long)]
        solution_file: Option<PathBuf>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Past quiz results and case solutions
    Results {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum SimCommands {
    /// Say a line and get the partner's reply
    Reply {
        #[arg(value_parser = parse_scenario)]
        scenario: Scenario,

        /// Conversation state file, created on first use
        #[arg(long)]
        conversation: PathBuf,

        /// Your line
        text: String,
    },

    /// Speak a line and get the partner's reply
    Voice {
        #[arg(value_parser = parse_scenario)]
        scenario: Scenario,

        #[arg(long)]
        conversation: PathBuf,

        #[command(flatten)]
        audio: AudioSource,
    },

    /// Submit the conversation for scoring
    Submit {
        #[arg(value_parser = parse_scenario)]
        scenario: Scenario,

        #[arg(long)]
        conversation: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Print the conversation so far
    Show {
        #[arg(long)]
        conversation: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnalysisCommands {
    /// Current status of a task
    Status { task_id: String },

    /// Poll a task until it finishes
    Watch { task_id: String },

    /// Recent analysis results
    Results {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Current skill scores
    Show,

    /// Scores with their history
    History {
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// Active plan with materials, tasks and progress
    Show,

    /// Mark a plan task as done
    Complete { task_id: String },

    /// Generate a new plan from the current profile
    Generate,
}

#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Users with activity counts
    Users {
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// One user with profile and recent activity
    User {
        user_id: i64,

        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Set a user's password
    SetPassword {
        user_id: i64,

        #[arg(long)]
        new_password: String,
    },

    /// Delete all quiz results of a user
    ClearResults { user_id: i64 },

    /// Test content
    Tests {
        #[command(subcommand)]
        action: AdminTestCommands,
    },

    /// Question content
    Questions {
        #[command(subcommand)]
        action: AdminQuestionCommands,
    },

    /// A user's development plan
    Plan {
        #[command(subcommand)]
        action: AdminPlanCommands,
    },

    /// Re-queue failed analysis tasks
    RetryFailed,

    /// Remove seeded demo tests
    DeleteSeedTests,
}

#[derive(Subcommand, Debug)]
pub enum AdminTestCommands {
    List {
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    Create {
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// quiz, case or simulation
        #[arg(long = "type", default_value = "quiz")]
        kind: String,
    },

    Update {
        test_id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,
    },

    Delete { test_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum AdminQuestionCommands {
    List { test_id: i64 },

    Create {
        test_id: i64,

        text: String,

        #[arg(long = "type", default_value = "text")]
        question_type: String,

        /// Answer option text; repeat per option
        #[arg(long = "option")]
        options: Vec<String>,
    },

    Update {
        question_id: i64,

        #[arg(long)]
        text: Option<String>,

        #[arg(long = "type")]
        question_type: Option<String>,
    },

    Delete { question_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum AdminPlanCommands {
    Show { user_id: i64 },

    AddMaterial {
        user_id: i64,

        title: String,

        url: String,

        #[arg(long, default_value = "article")]
        material_type: String,

        #[arg(long)]
        skill: String,

        #[arg(long, default_value = "beginner")]
        difficulty: String,
    },

    DeleteMaterial { user_id: i64, material_id: String },

    AddTask {
        user_id: i64,

        description: String,

        #[arg(long)]
        skill: String,
    },

    /// Change a task's status (pending or completed)
    SetTaskStatus {
        user_id: i64,

        task_id: String,

        status: String,
    },

    DeleteTask { user_id: i64, task_id: String },
}

fn parse_scenario(s: &str) -> Result<Scenario, String> {
    s.parse().map_err(|e: skillcoach_common::Error| e.to_string())
}

/// `QUESTION_ID=VALUE`
fn parse_answer(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => {
            Ok((id.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected QUESTION_ID=VALUE, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "skillcoach",
            "whoami",
            "--base-url",
            "http://example.test/api/v1",
        ])
        .unwrap();
        assert_eq!(cli.overrides().base_url.as_deref(), Some("http://example.test/api/v1"));
    }

    #[test]
    fn test_submit_answers() {
        let cli = Cli::try_parse_from([
            "skillcoach", "tests", "submit", "3", "-a", "1=a", "-a", "2=b=c", "--wait",
        ])
        .unwrap();
        match cli.command {
            Commands::Tests {
                action: TestCommands::Submit { test_id, answers, wait },
            } => {
                assert_eq!(test_id, 3);
                assert_eq!(answers[1], ("2".to_string(), "b=c".to_string()));
                assert!(wait.wait);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_answer_rejected() {
        assert!(Cli::try_parse_from(["skillcoach", "tests", "submit", "3", "-a", "nope"]).is_err());
    }

    #[test]
    fn test_voice_requires_source() {
        assert!(Cli::try_parse_from(["skillcoach", "chat", "voice"]).is_err());
        assert!(Cli::try_parse_from(["skillcoach", "chat", "voice", "--file", "a.ogg"]).is_ok());
        assert!(Cli::try_parse_from(["skillcoach", "chat", "voice", "--record"]).is_ok());
    }

    #[test]
    fn test_unknown_scenario_rejected() {
        assert!(Cli::try_parse_from([
            "skillcoach", "sim", "reply", "karaoke", "--conversation", "c.json", "hi",
        ])
        .is_err());
    }
}
