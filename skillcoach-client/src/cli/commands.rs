//! Command execution
//!
//! Library errors are wrapped with `anyhow` context here; results go to
//! stdout, progress and diagnostics to stderr through `tracing`.

use super::output;
use super::{
    AdminCommands, AdminPlanCommands, AdminQuestionCommands, AdminTestCommands, AnalysisCommands,
    AudioSource, ChatCommands, Cli, Commands, PlanCommands, ProfileCommands, SimCommands,
    TestCommands, WaitArgs,
};
use crate::api::ApiClient;
use crate::audio::{prepare_upload, AudioClip, UploadAudio};
use crate::conversation::Conversation;
use crate::poller::{TaskOutcome, TaskPoller};
use crate::session::Session;
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use skillcoach_common::api::{
    MaterialItem, QuestionCreate, QuestionUpdate, RegisterRequest, SubmittedTask, TaskItem,
    TaskUpdate, TestCreate, TestUpdate,
};
use skillcoach_common::config::ClientConfig;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Execute the parsed command line
pub async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let session = Session::restore(&config.session_file)
        .await
        .with_context(|| format!("Failed to load session from {}", config.session_file.display()))?;
    let client = Arc::new(
        ApiClient::new(config, Arc::new(session)).context("Failed to create API client")?,
    );

    match cli.command {
        Commands::Login { email, password } => {
            let user = client.login(&email, &password).await.context("Login failed")?;
            println!("Logged in as {}", output::user_line(&user));
        }
        Commands::Logout => {
            client.logout().await.context("Failed to remove session")?;
            println!("Logged out");
        }
        Commands::Register {
            email,
            password,
            full_name,
        } => {
            let request = RegisterRequest {
                email,
                password,
                full_name,
            };
            let user = client.register(&request).await.context("Registration failed")?;
            println!("Registered {}", output::user_line(&user));
        }
        Commands::Whoami => {
            let user = client.me().await.context("Failed to fetch current user")?;
            println!("{}", output::user_line(&user));
        }
        Commands::Passwd {
            old_password,
            new_password,
        } => {
            client
                .change_password(&old_password, &new_password)
                .await
                .context("Failed to change password")?;
            println!("Password changed");
        }
        Commands::Chat { action } => chat(&client, action).await?,
        Commands::Tests { action } => tests(&client, action).await?,
        Commands::Sim { action } => simulation(&client, action).await?,
        Commands::Analysis { action } => analysis(&client, action).await?,
        Commands::Profile { action } => profile(&client, action).await?,
        Commands::Plan { action } => plan(&client, action).await?,
        Commands::Admin { action } => admin(&client, action).await?,
        Commands::Devices => devices()?,
    }

    Ok(())
}

async fn chat(client: &Arc<ApiClient>, action: ChatCommands) -> Result<()> {
    match action {
        ChatCommands::Send { message, wait } => {
            let response = client.send_message(&message).await.context("Failed to send message")?;
            println!("Coach: {}", response.response);
            follow(client, &response, wait).await?;
        }
        ChatCommands::Voice { audio, wait } => {
            let upload = acquire_audio(client, &audio).await?;
            let reply = client.send_voice(upload).await.context("Voice message failed")?;
            if let Some(text) = reply.recognized_text() {
                println!("You: {}", text);
            }
            match reply.reply_text() {
                Some(text) => println!("Coach: {}", text),
                None => println!("(no reply)"),
            }
            follow(client, &reply, wait).await?;
        }
        ChatCommands::History { limit } => {
            let entries = client.chat_history(limit).await.context("Failed to load chat history")?;
            for entry in &entries {
                println!("{}", output::chat_entry(entry));
            }
        }
        ChatCommands::Audio { message_id, output } => {
            let (bytes, content_type) = client
                .chat_audio(message_id)
                .await
                .context("Failed to download recording")?;
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Saved {} bytes ({}) to {}",
                bytes.len(),
                content_type.as_deref().unwrap_or("unknown type"),
                output.display()
            );
        }
    }
    Ok(())
}

async fn tests(client: &Arc<ApiClient>, action: TestCommands) -> Result<()> {
    match action {
        TestCommands::List { skip, limit } => {
            let tests = client.list_tests(skip, limit).await.context("Failed to list tests")?;
            for test in &tests {
                println!("{}", output::test_summary(test));
            }
        }
        TestCommands::Show { test_id } => {
            let test = client.get_test(test_id).await.context("Failed to load test")?;
            print!("{}", output::test_detail(&test));
        }
        TestCommands::Submit {
            test_id,
            answers,
            wait,
        } => {
            let response = client
                .submit_test(test_id, answers_map(answers))
                .await
                .context("Failed to submit answers")?;
            println!("Submitted (result {})", response.result_id);
            follow(client, &response, wait).await?;
        }
        TestCommands::Case {
            test_id,
            solution,
            solution_file,
            wait,
        } => {
            let solution = match (solution, solution_file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => bail!("--solution or --solution-file is required"),
            };
            let response = client
                .submit_case(test_id, &solution)
                .await
                .context("Failed to submit case solution")?;
            println!("Submitted (solution {})", response.solution_id);
            follow(client, &response, wait).await?;
        }
        TestCommands::Results { limit } => {
            let results = client.my_test_results(limit).await.context("Failed to load test results")?;
            println!("Quiz results:");
            for result in &results {
                println!("  {}", output::test_result(result));
            }
            let cases = client
                .my_case_solutions(limit)
                .await
                .context("Failed to load case solutions")?;
            println!("Case solutions:");
            for case in &cases {
                println!(
                    "  [{}] test {} task {}",
                    case.id,
                    case.test_id,
                    case.analysis_task_id.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

/// `QUESTION_ID=VALUE` pairs as the backend's answer map.
///
/// Values that parse as JSON (numbers, lists) are sent as such, anything
/// else as a string.
fn answers_map(answers: Vec<(String, String)>) -> Map<String, Value> {
    answers
        .into_iter()
        .map(|(id, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            (id, value)
        })
        .collect()
}

async fn simulation(client: &Arc<ApiClient>, action: SimCommands) -> Result<()> {
    match action {
        SimCommands::Reply {
            scenario,
            conversation,
            text,
        } => {
            let mut conv = load_conversation(&conversation).await?;
            conv.push_user(text);
            let reply = client
                .simulation_reply(scenario, conv.history())
                .await
                .with_context(|| format!("{} partner did not answer", scenario.title()))?;
            conv.apply_text_reply(reply.reply.clone());
            save_conversation(&conversation, &conv).await?;
            println!("Partner: {}", reply.reply);
        }
        SimCommands::Voice {
            scenario,
            conversation,
            audio,
        } => {
            let mut conv = load_conversation(&conversation).await?;
            let upload = acquire_audio(client, &audio).await?;
            let history = conv.history();
            let origin = conv.push_pending_voice();
            let reply = client
                .simulation_voice_reply(scenario, upload, history)
                .await
                .with_context(|| format!("{} voice turn failed", scenario.title()))?;
            let reply_id = conv.apply_voice_reply(origin, &reply);
            save_conversation(&conversation, &conv).await?;
            print_turn(&conv, origin, reply_id);
        }
        SimCommands::Submit {
            scenario,
            conversation,
            wait,
        } => {
            let conv = load_conversation(&conversation).await?;
            let response = client
                .simulation_submit(scenario, &conv.transcript())
                .await
                .context("Failed to submit simulation")?;
            println!("Submitted {} (solution {})", scenario.title(), response.solution_id);
            follow(client, &response, wait).await?;
        }
        SimCommands::Show { conversation } => {
            let conv = load_conversation(&conversation).await?;
            println!("{}", conv.transcript());
        }
    }
    Ok(())
}

fn print_turn(conv: &Conversation, origin: Uuid, reply: Option<Uuid>) {
    if let Some(message) = conv.get(origin) {
        println!("You: {}", message.text);
    }
    match reply.and_then(|id| conv.get(id)) {
        Some(message) => println!("Partner: {}", message.text),
        None => println!("(no reply)"),
    }
}

async fn load_conversation(path: &Path) -> Result<Conversation> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("Invalid conversation file {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Starting new conversation");
            Ok(Conversation::new())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

async fn save_conversation(path: &Path, conv: &Conversation) -> Result<()> {
    let json = serde_json::to_vec_pretty(conv)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn analysis(client: &Arc<ApiClient>, action: AnalysisCommands) -> Result<()> {
    match action {
        AnalysisCommands::Status { task_id } => {
            let status = client
                .analysis_status(&task_id)
                .await
                .context("Failed to fetch task status")?;
            println!("{}: {}", status.task_id, status.status);
            if let Some(result) = &status.result {
                print!("{}", output::analysis_result(result));
            }
        }
        AnalysisCommands::Watch { task_id } => watch(client, &task_id).await?,
        AnalysisCommands::Results { limit } => {
            let results = client
                .my_analysis_results(limit)
                .await
                .context("Failed to load analysis results")?;
            for result in &results {
                println!("{}", output::analysis_result(result));
            }
        }
    }
    Ok(())
}

/// Print the task a submission started and, with `--wait`, block until
/// its analysis is done
async fn follow<T: SubmittedTask>(client: &Arc<ApiClient>, submitted: &T, wait: WaitArgs) -> Result<()> {
    let Some(task_id) = submitted.task_id() else {
        debug!("Submission started no analysis task");
        return Ok(());
    };
    println!("Analysis task: {}", task_id);
    if wait.wait {
        watch(client, task_id).await?;
    }
    Ok(())
}

async fn watch(client: &Arc<ApiClient>, task_id: &str) -> Result<()> {
    let poller = TaskPoller::for_client(Arc::clone(client));
    let cancel = cancel_on_ctrl_c();

    info!(task_id = %task_id, "Waiting for analysis");
    let outcome = poller.wait(task_id, &cancel).await;
    cancel.cancel();

    let outcome = outcome.with_context(|| format!("Analysis {} did not finish", task_id))?;
    print!("{}", output::outcome(&outcome));
    match outcome {
        TaskOutcome::Completed(_) => Ok(()),
        TaskOutcome::Failed { task_id } => Err(anyhow!("Analysis {} failed", task_id)),
    }
}

/// Token cancelled by Ctrl+C; cancelling it also ends the signal watcher
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("Received Ctrl+C, stopping");
                    watcher.cancel();
                }
            }
            _ = watcher.cancelled() => {}
        }
    });
    cancel
}

async fn profile(client: &Arc<ApiClient>, action: ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::Show => {
            let profile = client.my_profile().await.context("Failed to load profile")?;
            print!("{}", output::scores(&profile.scores));
        }
        ProfileCommands::History { months } => {
            let profile = client
                .my_profile_history(months)
                .await
                .context("Failed to load profile history")?;
            print!("{}", output::profile_history(&profile));
        }
    }
    Ok(())
}

async fn plan(client: &Arc<ApiClient>, action: PlanCommands) -> Result<()> {
    match action {
        PlanCommands::Show => match client.active_plan().await.context("Failed to load plan")? {
            Some(plan) => print!("{}", output::plan(&plan)),
            None => println!("No active plan. Run `skillcoach plan generate` to create one."),
        },
        PlanCommands::Complete { task_id } => {
            let done = client
                .complete_task(&task_id)
                .await
                .context("Failed to complete task")?;
            println!("Task {} {} (plan {:.0}% done)", done.task_id, done.status, done.plan_progress);
        }
        PlanCommands::Generate => {
            let response = client.generate_plan().await.context("Failed to generate plan")?;
            println!("{} ({})", response.message, response.status);
        }
    }
    Ok(())
}

async fn admin(client: &Arc<ApiClient>, action: AdminCommands) -> Result<()> {
    let me = client.me().await.context("Failed to fetch current user")?;
    if !me.is_admin() {
        bail!("{} is not an administrator", me.email);
    }

    match action {
        AdminCommands::Users { limit } => {
            for stats in client.list_users(limit).await.context("Failed to list users")? {
                println!(
                    "{}  analyses {}  tests {}  cases {}",
                    output::user_line(&stats.user),
                    stats.analysis_count,
                    stats.test_results_count,
                    stats.case_solutions_count
                );
            }
        }
        AdminCommands::User { user_id, limit } => {
            let user = client.get_user(user_id).await.context("Failed to load user")?;
            println!("{}", output::user_line(&user));
            if let Some(profile) = client.user_profile(user_id).await.context("Failed to load profile")? {
                print!("{}", output::scores(&profile.scores));
            }
            let analyses = client
                .user_analysis(user_id, limit)
                .await
                .context("Failed to load analyses")?;
            println!("Analyses: {}", analyses.len());
            for result in client.user_tests(user_id, limit).await.context("Failed to load results")? {
                println!("  {}", output::test_result(&result));
            }
            let cases = client.user_cases(user_id, limit).await.context("Failed to load cases")?;
            println!("Case solutions: {}", cases.len());
        }
        AdminCommands::SetPassword {
            user_id,
            new_password,
        } => {
            client
                .set_user_password(user_id, &new_password)
                .await
                .context("Failed to set password")?;
            println!("Password updated");
        }
        AdminCommands::ClearResults { user_id } => {
            let status = client
                .delete_user_test_results(user_id)
                .await
                .context("Failed to delete results")?;
            println!("{}", status.message.unwrap_or(status.status));
        }
        AdminCommands::Tests { action } => admin_tests(client, action).await?,
        AdminCommands::Questions { action } => admin_questions(client, action).await?,
        AdminCommands::Plan { action } => admin_plan(client, action).await?,
        AdminCommands::RetryFailed => {
            let status = client.retry_failed().await.context("Failed to retry tasks")?;
            println!("{}", status.message.unwrap_or(status.status));
        }
        AdminCommands::DeleteSeedTests => {
            let status = client.delete_seed_tests().await.context("Failed to delete seed tests")?;
            println!("{}", status.message.unwrap_or(status.status));
        }
    }
    Ok(())
}

async fn admin_tests(client: &Arc<ApiClient>, action: AdminTestCommands) -> Result<()> {
    match action {
        AdminTestCommands::List { limit } => {
            for test in client.admin_tests(limit).await.context("Failed to list tests")? {
                println!("{}", output::test_summary(&test));
            }
        }
        AdminTestCommands::Create {
            title,
            description,
            kind,
        } => {
            let test = client
                .create_test(&TestCreate {
                    title,
                    description,
                    kind,
                })
                .await
                .context("Failed to create test")?;
            println!("Created {}", output::test_summary(&test));
        }
        AdminTestCommands::Update {
            test_id,
            title,
            description,
            kind,
        } => {
            let update = TestUpdate {
                title,
                description,
                kind,
            };
            let test = client
                .update_test(test_id, &update)
                .await
                .context("Failed to update test")?;
            println!("Updated {}", output::test_summary(&test));
        }
        AdminTestCommands::Delete { test_id } => {
            client.delete_test(test_id).await.context("Failed to delete test")?;
            println!("Deleted test {}", test_id);
        }
    }
    Ok(())
}

async fn admin_questions(client: &Arc<ApiClient>, action: AdminQuestionCommands) -> Result<()> {
    match action {
        AdminQuestionCommands::List { test_id } => {
            for question in client.test_questions(test_id).await.context("Failed to list questions")? {
                println!("[{}] ({}) {}", question.id, question.question_type, question.text);
            }
        }
        AdminQuestionCommands::Create {
            test_id,
            text,
            question_type,
            options,
        } => {
            let options = (!options.is_empty()).then(|| {
                options
                    .into_iter()
                    .map(|text| {
                        let mut option = Map::new();
                        option.insert("text".to_string(), Value::String(text));
                        option
                    })
                    .collect::<Vec<_>>()
            });
            let question = client
                .create_question(
                    test_id,
                    &QuestionCreate {
                        text,
                        question_type,
                        options,
                        correct_answer: None,
                    },
                )
                .await
                .context("Failed to create question")?;
            println!("Created question {}", question.id);
        }
        AdminQuestionCommands::Update {
            question_id,
            text,
            question_type,
        } => {
            let update = QuestionUpdate {
                text,
                question_type,
                ..QuestionUpdate::default()
            };
            client
                .update_question(question_id, &update)
                .await
                .context("Failed to update question")?;
            println!("Updated question {}", question_id);
        }
        AdminQuestionCommands::Delete { question_id } => {
            client
                .delete_question(question_id)
                .await
                .context("Failed to delete question")?;
            println!("Deleted question {}", question_id);
        }
    }
    Ok(())
}

async fn admin_plan(client: &Arc<ApiClient>, action: AdminPlanCommands) -> Result<()> {
    match action {
        AdminPlanCommands::Show { user_id } => {
            let plan = client.user_plan(user_id).await.context("Failed to load plan")?;
            println!("Plan #{} for user {} generated {}", plan.id, plan.user_id, plan.generated_at);
            println!("{}", serde_json::to_string_pretty(&plan.content)?);
        }
        AdminPlanCommands::AddMaterial {
            user_id,
            title,
            url,
            material_type,
            skill,
            difficulty,
        } => {
            let material = MaterialItem {
                id: Uuid::new_v4().to_string(),
                title,
                url,
                material_type,
                skill,
                difficulty,
            };
            let created = client
                .add_material(user_id, &material)
                .await
                .context("Failed to add material")?;
            println!("Added material {}", created.id);
        }
        AdminPlanCommands::DeleteMaterial {
            user_id,
            material_id,
        } => {
            client
                .delete_material(user_id, &material_id)
                .await
                .context("Failed to delete material")?;
            println!("Deleted material {}", material_id);
        }
        AdminPlanCommands::AddTask {
            user_id,
            description,
            skill,
        } => {
            let task = TaskItem {
                id: Uuid::new_v4().to_string(),
                description,
                skill,
                status: "pending".to_string(),
                completed_at: None,
            };
            let created = client
                .add_plan_task(user_id, &task)
                .await
                .context("Failed to add task")?;
            println!("Added task {}", created.id);
        }
        AdminPlanCommands::SetTaskStatus {
            user_id,
            task_id,
            status,
        } => {
            let completed_at = (status == "completed").then(|| Utc::now().to_rfc3339());
            let update = TaskUpdate {
                status: Some(status),
                completed_at,
                ..TaskUpdate::default()
            };
            let task = client
                .update_plan_task(user_id, &task_id, &update)
                .await
                .context("Failed to update task")?;
            println!("Task {} is now {}", task.id, task.status);
        }
        AdminPlanCommands::DeleteTask { user_id, task_id } => {
            client
                .delete_plan_task(user_id, &task_id)
                .await
                .context("Failed to delete task")?;
            println!("Deleted task {}", task_id);
        }
    }
    Ok(())
}

/// Read or record the spoken turn and normalize it for upload
async fn acquire_audio(client: &ApiClient, source: &AudioSource) -> Result<UploadAudio> {
    let clip = if source.record {
        record(client, source).await?
    } else {
        let path = source
            .file
            .as_deref()
            .ok_or_else(|| anyhow!("--file or --record is required"))?;
        AudioClip::from_file(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    prepare_upload(clip).await.context("Failed to prepare recording")
}

#[cfg(feature = "microphone")]
async fn record(client: &ApiClient, source: &AudioSource) -> Result<AudioClip> {
    use std::time::Duration;

    let seconds = source.seconds.unwrap_or(client.config().recording_seconds);
    eprintln!("Recording for up to {}s, press Ctrl+C to stop early", seconds);

    let stop = cancel_on_ctrl_c();
    let clip = crate::audio::capture::record_clip(
        source.device.clone(),
        Duration::from_secs(seconds),
        stop.clone(),
        client.events().clone(),
    )
    .await;
    stop.cancel();
    clip.context("Recording failed")
}

#[cfg(not(feature = "microphone"))]
async fn record(_client: &ApiClient, _source: &AudioSource) -> Result<AudioClip> {
    bail!("This build has no microphone support; rebuild with `--features microphone` or pass --file")
}

#[cfg(feature = "microphone")]
fn devices() -> Result<()> {
    for name in crate::audio::capture::list_input_devices().context("Failed to list devices")? {
        println!("{}", name);
    }
    Ok(())
}

#[cfg(not(feature = "microphone"))]
fn devices() -> Result<()> {
    bail!("This build has no microphone support; rebuild with `--features microphone`")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_answers_map_parses_json_values() {
        let map = answers_map(vec![
            ("1".to_string(), "2".to_string()),
            ("2".to_string(), "free text".to_string()),
            ("3".to_string(), "[1, 2]".to_string()),
        ]);
        assert_eq!(map["1"], Value::from(2));
        assert_eq!(map["2"], Value::from("free text"));
        assert!(map["3"].is_array());
    }

    fn offline_client() -> Arc<ApiClient> {
        // Nothing listens on the discard port; any request would fail
        let config = ClientConfig::with_base_url("http://127.0.0.1:9/api/v1");
        Arc::new(ApiClient::new(config, Arc::new(Session::anonymous())).unwrap())
    }

    #[tokio::test]
    async fn test_follow_without_task_never_polls() {
        let reply = skillcoach_common::api::ChatResponse {
            response: "Noted.".to_string(),
            task_id: None,
            status: None,
        };
        follow(&offline_client(), &reply, WaitArgs { wait: true }).await.unwrap();
    }

    #[tokio::test]
    async fn test_follow_reads_task_from_any_submission() {
        let submitted = skillcoach_common::api::CaseSubmitResponse {
            solution_id: 4,
            task_id: "task-9".to_string(),
            status: "pending".to_string(),
        };
        assert_eq!(submitted.task_id(), Some("task-9"));
        follow(&offline_client(), &submitted, WaitArgs::default()).await.unwrap();

        // With --wait the poll is attempted and the transport failure surfaces
        let client = {
            let config = ClientConfig {
                poll_interval_ms: 10,
                poll_timeout_secs: 1,
                request_timeout_secs: 1,
                ..ClientConfig::with_base_url("http://127.0.0.1:9/api/v1")
            };
            Arc::new(ApiClient::new(config, Arc::new(Session::anonymous())).unwrap())
        };
        assert!(follow(&client, &submitted, WaitArgs { wait: true }).await.is_err());
    }

    #[tokio::test]
    async fn test_conversation_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conv.json");

        let mut conv = load_conversation(&path).await.unwrap();
        assert!(conv.is_empty());
        conv.push_user("Hello");
        conv.apply_text_reply("Hi there");
        save_conversation(&path, &conv).await.unwrap();

        let loaded = load_conversation(&path).await.unwrap();
        assert_eq!(loaded.transcript(), "User: Hello\nPartner: Hi there");
    }

    #[tokio::test]
    async fn test_corrupt_conversation_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conv.json");
        std::fs::write(&path, "{broken").unwrap();
        assert!(load_conversation(&path).await.is_err());
    }
}
