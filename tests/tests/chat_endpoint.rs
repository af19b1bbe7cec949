use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use domain::ports::GenerationReply;
use http_body_util::BodyExt;
use presentation::error::{
    INTERNAL_ERROR_DETAIL, MISSING_USER_MESSAGE_DETAIL, UPSTREAM_FAILURE_DETAIL,
};
use presentation::middleware::X_REQUEST_ID;
use presentation::routes;
use serde_json::{json, Value};
use shared::utils::word_count;
use tests::{fake_vector, Harness, TEST_COLLECTION};
use tower::ServiceExt;

async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn office_question_is_answered_from_retrieved_context() {
    let (state, log) = Harness::new()
        .chunks(&["Офис находится по адресу ул. Ленина 10"])
        .answer("Наш офис находится по адресу ул. Ленина 10.")
        .build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "Где находится офис?" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["role"], "assistant");
    assert_eq!(
        body["message"]["content"],
        "Наш офис находится по адресу ул. Ленина 10."
    );

    let prompts = log.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Офис находится по адресу ул. Ленина 10"));
    assert!(prompt.ends_with("Вопрос пользователя: Где находится офис?"));

    assert_eq!(body["usage"]["prompt_tokens"], word_count(prompt));
    assert_eq!(body["usage"]["completion_tokens"], 8);
    assert_eq!(
        body["usage"]["total_tokens"].as_u64().unwrap(),
        body["usage"]["prompt_tokens"].as_u64().unwrap()
            + body["usage"]["completion_tokens"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn retrieval_uses_the_last_user_message() {
    let (state, log) = Harness::new().chunks(&["ctx"]).answer("ok").build();

    let (status, _) = post_chat(
        routes::build(state),
        json!({ "messages": [
            { "role": "user", "content": "старый вопрос" },
            { "role": "assistant", "content": "ответ" },
            { "role": "user", "content": "Сколько стоит доставка?" },
            { "role": "assistant", "content": "уточните" }
        ] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(log.embedded(), vec!["Сколько стоит доставка?".to_string()]);
    let searched = log.searched();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].collection, TEST_COLLECTION);
    assert_eq!(searched[0].query, fake_vector("Сколько стоит доставка?"));
    assert_eq!(searched[0].limit, 3);
}

#[tokio::test]
async fn no_user_message_is_rejected_without_upstream_calls() {
    let (state, log) = Harness::new().chunks(&["ctx"]).answer("never").build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "assistant", "content": "Привет" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], MISSING_USER_MESSAGE_DETAIL);
    assert!(log.is_untouched());
}

#[tokio::test]
async fn empty_message_list_is_rejected() {
    let (state, log) = Harness::new().build();

    let (status, body) = post_chat(routes::build(state), json!({ "messages": [] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], MISSING_USER_MESSAGE_DETAIL);
    assert!(log.is_untouched());
}

#[tokio::test]
async fn whitespace_user_message_is_still_answered() {
    let (state, log) = Harness::new().chunks(&["ctx"]).answer("Уточните вопрос").build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "   " }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["content"], "Уточните вопрос");
    assert_eq!(log.embedded(), vec!["   ".to_string()]);
    assert_eq!(log.searched()[0].query, fake_vector("   "));
}

#[tokio::test]
async fn empty_user_message_is_rejected() {
    let (state, log) = Harness::new().chunks(&["ctx"]).answer("never").build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], MISSING_USER_MESSAGE_DETAIL);
    assert!(log.is_untouched());
}

#[tokio::test]
async fn empty_retrieval_sends_the_no_context_marker() {
    let (state, log) = Harness::new().answer("Не могу ответить").build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "Что-то неизвестное" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["content"], "Не могу ответить");
    let prompts = log.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Контекст не найден."));
}

#[tokio::test]
async fn upstream_503_becomes_500_without_message() {
    let (state, _) = Harness::new()
        .chunks(&["ctx"])
        .reply(GenerationReply::Rejected { status: 503 })
        .build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "вопрос" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], UPSTREAM_FAILURE_DETAIL);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn missing_response_field_returns_placeholder_answer() {
    let (state, _) = Harness::new()
        .chunks(&["ctx"])
        .reply(GenerationReply::Completed { response: None })
        .build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "вопрос" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["content"], "Ответ не получен");
    assert_eq!(body["usage"]["completion_tokens"], 3);
}

#[tokio::test]
async fn embedding_failure_is_a_generic_500() {
    let (state, log) = Harness::new().failing_embedder().answer("never").build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "вопрос" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], INTERNAL_ERROR_DETAIL);
    assert!(log.searched().is_empty());
    assert!(log.prompts().is_empty());
}

#[tokio::test]
async fn retrieval_failure_is_a_generic_500() {
    let (state, log) = Harness::new().failing_index().answer("never").build();

    let (status, body) = post_chat(
        routes::build(state),
        json!({ "messages": [{ "role": "user", "content": "вопрос" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], INTERNAL_ERROR_DETAIL);
    assert!(log.prompts().is_empty());
}

#[tokio::test]
async fn malformed_body_is_rejected_by_the_extractor() {
    let (state, log) = Harness::new().build();

    let (status, _) = post_chat(routes::build(state), json!({ "messages": "hello" })).await;

    assert!(status.is_client_error());
    assert!(log.is_untouched());
}

#[tokio::test]
async fn health_is_served() {
    let (state, _) = Harness::new().build();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = routes::build(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_echoed_or_minted() {
    let (state, _) = Harness::new().build();
    let app = routes::build(state);
    let id = "6f1c1d2e-8b0a-4f57-9d7e-2a51b8f5c0aa";

    let request = Request::builder()
        .uri("/health")
        .header(X_REQUEST_ID, id)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], id);

    let request = Request::builder()
        .uri("/health")
        .header(X_REQUEST_ID, "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let minted = response.headers()[X_REQUEST_ID].to_str().unwrap();
    assert_ne!(minted, "not-a-uuid");
    assert_eq!(minted.len(), 36);
}
