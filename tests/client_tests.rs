use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, post, web};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use codejudge::error::JudgeError;
use codejudge::judge0::{BatchEntry, ExecutionService, Judge0Client, await_batch};

/// In-process stand-in for the execution service's HTTP surface. Every
/// submitted entry echoes its stdin back as stdout, reported as Processing
/// on the first status query and Accepted afterwards.
#[derive(Default)]
struct StubState {
    stdin_by_token: Mutex<HashMap<String, String>>,
    fetch_count: AtomicUsize,
}

#[post("/submissions/batch")]
async fn post_batch(
    state: web::Data<StubState>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let submissions = body["submissions"].as_array().cloned().unwrap_or_default();

    let mut tokens = Vec::with_capacity(submissions.len());
    let mut stdin_by_token = state.stdin_by_token.lock();
    for (i, submission) in submissions.iter().enumerate() {
        let token = format!("stub-token-{i}");
        stdin_by_token.insert(
            token.clone(),
            submission["stdin"].as_str().unwrap_or_default().to_string(),
        );
        tokens.push(json!({ "token": token }));
    }

    HttpResponse::Created().json(json!({ "submissions": tokens }))
}

#[get("/submissions/batch")]
async fn get_batch(
    state: web::Data<StubState>,
    query: web::Query<HashMap<String, String>>,
) -> impl Responder {
    let first_cycle = state.fetch_count.fetch_add(1, Ordering::SeqCst) == 0;
    let stdin_by_token = state.stdin_by_token.lock();

    let tokens: Vec<&str> = query
        .get("tokens")
        .map(|t| t.split(',').collect())
        .unwrap_or_default();

    let submissions: Vec<serde_json::Value> = tokens
        .iter()
        .map(|token| {
            if first_cycle {
                json!({
                    "token": token,
                    "status": { "id": 2, "description": "Processing" },
                    "stdout": null,
                    "stderr": null,
                    "compile_output": null,
                    "time": null,
                    "memory": null,
                })
            } else {
                json!({
                    "token": token,
                    "status": { "id": 3, "description": "Accepted" },
                    "stdout": stdin_by_token.get(*token),
                    "stderr": null,
                    "compile_output": null,
                    "time": "0.004",
                    "memory": 1536,
                })
            }
        })
        .collect();

    HttpResponse::Ok().json(json!({ "submissions": submissions }))
}

async fn spawn_stub() -> (String, web::Data<StubState>) {
    let state = web::Data::new(StubState::default());
    let app_state = state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .service(post_batch)
            .service(get_batch)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    (format!("http://{addr}"), state)
}

fn entries(stdins: &[&str]) -> Vec<BatchEntry> {
    stdins
        .iter()
        .map(|stdin| BatchEntry {
            source_code: "print(input())".to_string(),
            language_id: 71,
            stdin: stdin.to_string(),
        })
        .collect()
}

#[actix_web::test]
async fn test_dispatch_and_poll_over_http() {
    let (base_url, _state) = spawn_stub().await;
    let client = Judge0Client::new(reqwest::Client::new(), base_url);

    let tokens = client
        .submit_batch(&entries(&["2 3", "10 20", "7 7"]))
        .await
        .unwrap();
    assert_eq!(tokens.len(), 3);

    let results = await_batch(
        &client,
        &tokens,
        Duration::from_millis(10),
        Duration::from_secs(2),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    // One result per token, token order preserved, payload parsed.
    assert_eq!(results.len(), 3);
    for (result, token) in results.iter().zip(tokens.iter()) {
        assert_eq!(&result.token, token);
        assert!(result.is_terminal());
    }
    assert_eq!(results[0].stdout.as_deref(), Some("2 3"));
    assert_eq!(results[2].stdout.as_deref(), Some("7 7"));
    assert_eq!(results[1].time_secs(), 0.004);
    assert_eq!(results[1].memory_kb(), 1536.0);
}

#[actix_web::test]
async fn test_trailing_slash_in_base_url_is_tolerated() {
    let (base_url, _state) = spawn_stub().await;
    let client = Judge0Client::new(reqwest::Client::new(), format!("{base_url}/"));

    let tokens = client.submit_batch(&entries(&["1 2"])).await.unwrap();
    assert_eq!(tokens.len(), 1);
}

#[actix_web::test]
async fn test_unreachable_service_is_dispatch_failed() {
    // Nothing listens on this port.
    let client = Judge0Client::new(reqwest::Client::new(), "http://127.0.0.1:9");

    let err = client.submit_batch(&entries(&["1"])).await.unwrap_err();
    assert!(matches!(err, JudgeError::DispatchFailed(_)));
}

#[actix_web::test]
async fn test_error_status_is_dispatch_failed() {
    #[post("/submissions/batch")]
    async fn post_batch_overloaded() -> impl Responder {
        HttpResponse::ServiceUnavailable().body("queue full")
    }

    let server = HttpServer::new(|| App::new().service(post_batch_overloaded))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    let client = Judge0Client::new(reqwest::Client::new(), format!("http://{addr}"));
    let err = client.submit_batch(&entries(&["1"])).await.unwrap_err();

    match err {
        JudgeError::DispatchFailed(message) => {
            assert!(message.contains("503"), "unexpected message: {message}");
        }
        other => panic!("expected DispatchFailed, got {other:?}"),
    }
}
