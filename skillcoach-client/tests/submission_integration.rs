//! Quiz, case and simulation submissions plus plan actions against the scripted backend

mod helpers;

use std::sync::Arc;

use helpers::{MockBackend, VALID_PASSWORD};
use serde_json::{json, Map, Value};
use skillcoach_client::conversation::Conversation;
use skillcoach_client::{Error, TaskPoller};
use skillcoach_common::api::{Scenario, SubmittedTask};
use tokio_util::sync::CancellationToken;

async fn logged_in(backend: &MockBackend) -> Arc<skillcoach_client::ApiClient> {
    let client = backend.client();
    client.login("ada@example.com", VALID_PASSWORD).await.unwrap();
    Arc::new(client)
}

#[tokio::test]
async fn test_submit_test_sends_answers_and_polls_its_task() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;

    let mut answers = Map::new();
    answers.insert("31".to_string(), json!("a"));
    answers.insert("32".to_string(), json!("I would ask first."));
    let response = client.submit_test(4, answers).await.unwrap();

    assert_eq!(response.result_id, 104);
    assert_eq!(response.message.as_deref(), Some("Answers submitted for analysis"));
    assert_eq!(
        backend.body("/tests/4/submit"),
        Some(json!({ "answers": { "31": "a", "32": "I would ask first." } }))
    );

    let task_id = response.task_id().unwrap();
    let outcome = TaskPoller::for_client(Arc::clone(&client))
        .wait(task_id, &CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.result().is_some());
    assert_eq!(backend.status_calls("task-ok"), 3);
}

#[tokio::test]
async fn test_submit_test_rejects_empty_answers_locally() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;
    let before = backend.requests().len();

    let err = client.submit_test(4, Map::new()).await.unwrap_err();

    assert!(matches!(err, Error::BadRequest(_)));
    assert_eq!(backend.requests().len(), before);
}

#[tokio::test]
async fn test_submit_case_posts_solution() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;

    let response = client
        .submit_case(2, "Split the backlog and agree on owners.")
        .await
        .unwrap();

    assert_eq!(response.solution_id, 202);
    assert_eq!(response.task_id(), Some("task-ok"));
    assert_eq!(
        backend.body("/tests/2/case/submit"),
        Some(json!({ "solution": "Split the backlog and agree on owners." }))
    );
    assert!(backend.calls().contains(&"POST /tests/2/case/submit".to_string()));
}

#[tokio::test]
async fn test_submit_case_blank_solution_never_sent() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;

    let err = client.submit_case(2, "  \n ").await.unwrap_err();

    assert!(matches!(err, Error::BadRequest(_)));
    assert!(backend.body("/tests/2/case/submit").is_none());
}

#[tokio::test]
async fn test_simulation_round_trip_submits_transcript() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;
    let mut conversation = Conversation::new();

    conversation.push_user("I deserve a raise");
    let reply = client
        .simulation_reply(Scenario::Negotiation, conversation.history())
        .await
        .unwrap();
    assert_eq!(reply.reply, "[negotiation] Why i deserve a raise?");
    conversation.apply_text_reply(reply.reply);

    conversation.push_user("I shipped three releases");
    let reply = client
        .simulation_reply(Scenario::Negotiation, conversation.history())
        .await
        .unwrap();
    conversation.apply_text_reply(reply.reply);

    let sent = backend.body("/tests/simulations/negotiation/reply").unwrap();
    let roles: Vec<&str> = sent["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["user", "assistant", "user"]);

    let response = client
        .simulation_submit(Scenario::Negotiation, &conversation.transcript())
        .await
        .unwrap();

    assert_eq!(response.solution_id, 300);
    assert_eq!(response.task_id(), Some("task-ok"));
    let submitted = backend.body("/tests/simulations/negotiation/submit").unwrap();
    assert_eq!(
        submitted["conversation"],
        Value::String(
            "User: I deserve a raise\n\
             Partner: [negotiation] Why i deserve a raise?\n\
             User: I shipped three releases\n\
             Partner: [negotiation] Why i shipped three releases?"
                .to_string()
        )
    );
}

#[tokio::test]
async fn test_simulation_reply_requires_history() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;

    let err = client
        .simulation_reply(Scenario::Interview, Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BadRequest(_)));
    assert!(backend.body("/tests/simulations/interview/reply").is_none());
}

#[tokio::test]
async fn test_complete_task_reports_progress() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;

    let completion = client.complete_task("t-2").await.unwrap();

    assert_eq!(completion.task_id, "t-2");
    assert_eq!(completion.status, "completed");
    assert_eq!(completion.plan_progress, 50.0);
    assert!(backend
        .calls()
        .contains(&"POST /plans/me/tasks/t-2/complete".to_string()));
}

#[tokio::test]
async fn test_generate_plan_starts_processing() {
    let backend = MockBackend::start().await;
    let client = logged_in(&backend).await;

    let response = client.generate_plan().await.unwrap();

    assert_eq!(response.status, "processing");
    assert_eq!(response.message, "Plan generation started");
    assert_eq!(backend.calls().last().map(String::as_str), Some("POST /plans/me/generate"));
}

#[tokio::test]
async fn test_plan_actions_need_a_session() {
    let backend = MockBackend::start().await;
    let client = backend.client();

    let err = client.generate_plan().await.unwrap_err();

    assert!(matches!(err, Error::Unauthorized(_)));
}
