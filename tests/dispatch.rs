//! End-to-end dispatch: validation short-circuits, completion strategies,
//! and result normalization.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use synclub_mcp::{Dispatcher, Gateway, GatewayConfig, PollPolicy, PollSettings};

const QUERY_TASK_PATH: &str = "/pulsar/mcp/inner/comic/query_task";

fn args(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn dispatcher_for(server: &ServerGuard) -> Dispatcher {
    let gateway = Arc::new(
        Gateway::new(GatewayConfig::new(Some("test-key".into()), server.url()))
            .expect("gateway construction"),
    );
    let fast = PollPolicy {
        max_attempts: 10,
        interval: Duration::from_millis(1),
    };
    Dispatcher::with_poll_settings(
        gateway,
        PollSettings {
            standard: fast,
            extended: fast,
        },
    )
}

#[tokio::test]
async fn unknown_tool_is_an_error_without_any_network_call() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher.dispatch("gbu_no_such_tool", &args(&[])).await;

    assert!(outcome.is_error);
    assert!(outcome.text.contains("invocation failed"));
    assert!(outcome.text.contains("Unknown tool"));
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_required_argument_is_an_error_without_any_network_call() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_edit_comic_story",
            &args(&[("input_story", json!("{\"title\":\"x\"}"))]),
        )
        .await;

    assert!(outcome.is_error);
    assert!(outcome.text.contains("missing required argument: edit_prompt"));
    mock.assert_async().await;
}

#[tokio::test]
async fn streaming_tool_aggregates_event_stream() {
    let mut server = Server::new_async().await;
    let body = concat!(
        "data: {\"data\":{\"content\":\"Once \"}}\n",
        "data: {\"data\":{\"content\":\"upon\"}}\n",
    );
    let mock = server
        .mock("POST", "/pulsar/mcp/inner/comic/generate_script")
        .match_body(Matcher::Json(json!({"topic_input": "pirates"})))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_generate_comic_story",
            &args(&[("topic_input", json!("pirates"))]),
        )
        .await;

    assert!(!outcome.is_error, "got error: {}", outcome.text);
    assert_eq!(outcome.text, "Once upon");
    mock.assert_async().await;
}

#[tokio::test]
async fn flux_edit_polls_task_to_image_urls() {
    let mut server = Server::new_async().await;
    let edit_mock = server
        .mock("POST", "/pulsar/mcp/inner/comic/edit")
        .match_body(Matcher::Json(
            json!({"image_url": "https://img/in.png", "edit_prompt": "add a hat"}),
        ))
        .with_status(200)
        .with_body(
            json!({"base_resp": {"status_code": 0}, "data": {"task_id": "task-9"}}).to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let query_mock = server
        .mock("POST", QUERY_TASK_PATH)
        .with_status(200)
        .with_body_from_request(move |_| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt < 2 {
                json!({"errno": 2200, "err_msg": "pending"}).to_string().into_bytes()
            } else {
                json!({
                    "errno": 0,
                    "data": {"img_data": [{"images": [{"url": "final.png"}]}]}
                })
                .to_string()
                .into_bytes()
            }
        })
        .expect(2)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_flux_edit_image",
            &args(&[
                ("image_url", json!("https://img/in.png")),
                ("image_prompt", json!("add a hat")),
            ]),
        )
        .await;

    assert!(!outcome.is_error, "got error: {}", outcome.text);
    assert_eq!(outcome.text, "final.png");
    edit_mock.assert_async().await;
    query_mock.assert_async().await;
}

#[tokio::test]
async fn immediate_image_data_skips_polling() {
    let mut server = Server::new_async().await;
    let _align_mock = server
        .mock("POST", "/pulsar/mcp/inner/comic/pose_straighten")
        .with_status(200)
        .with_body(
            json!({
                "base_resp": {"status_code": 0},
                "data": {"img_data": [{"images": [{"webp": "aligned.webp", "url": "aligned.png"}]}]}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let query_mock = server
        .mock("POST", QUERY_TASK_PATH)
        .expect(0)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_anime_pose_align",
            &args(&[("image_url", json!("https://img/raw.png"))]),
        )
        .await;

    assert!(!outcome.is_error, "got error: {}", outcome.text);
    // webp preferred over url.
    assert_eq!(outcome.text, "aligned.webp");
    query_mock.assert_async().await;
}

#[tokio::test]
async fn task_failure_surfaces_as_error_outcome() {
    let mut server = Server::new_async().await;
    let _role_mock = server
        .mock("POST", "/pulsar/mcp/inner/comic/generate_role")
        .with_status(200)
        .with_body(
            json!({"base_resp": {"status_code": 0}, "data": {"task_id": "task-3"}}).to_string(),
        )
        .create_async()
        .await;
    let _query_mock = server
        .mock("POST", QUERY_TASK_PATH)
        .with_status(200)
        .with_body(json!({"errno": 500, "err_msg": "render crashed"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_ugc_tti",
            &args(&[
                ("prompt", json!("a knight")),
                ("gender", json!(1)),
                ("model_style", json!("anime")),
            ]),
        )
        .await;

    assert!(outcome.is_error);
    assert!(outcome.text.contains("render crashed"));
}

#[tokio::test]
async fn response_without_result_or_task_id_falls_back_to_raw_json() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/pulsar/mcp/inner/comic/pose_straighten")
        .with_status(200)
        .with_body(json!({"base_resp": {"status_code": 0}, "data": {}}).to_string())
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_anime_pose_align",
            &args(&[("image_url", json!("https://img/raw.png"))]),
        )
        .await;

    assert!(!outcome.is_error);
    let parsed: Value = serde_json::from_str(&outcome.text).expect("raw JSON fallback");
    assert_eq!(parsed.pointer("/base_resp/status_code"), Some(&json!(0)));
}

#[tokio::test]
async fn backend_auth_failure_becomes_error_outcome() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/pulsar/mcp/inner/comic/generate_role")
        .with_status(200)
        .with_body(
            json!({"base_resp": {"status_code": 1004, "status_msg": "bad key"}}).to_string(),
        )
        .create_async()
        .await;

    let dispatcher = dispatcher_for(&server);
    let outcome = dispatcher
        .dispatch(
            "gbu_ugc_tti",
            &args(&[
                ("prompt", json!("a knight")),
                ("gender", json!(1)),
                ("model_style", json!("anime")),
            ]),
        )
        .await;

    assert!(outcome.is_error);
    assert!(outcome.text.contains("bad key"));
}
