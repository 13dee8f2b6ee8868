use crate::helpers::{lead_form, spawn_app};
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn verify_request_count(app: &crate::helpers::TestApp) -> usize {
    app.otp_server
        .received_requests()
        .await
        .expect("Request recording is disabled")
        .iter()
        .filter(|request| request.url.path() == "/api/auth/verify-otp")
        .count()
}

#[tokio::test]
async fn wrong_code_then_right_code_saves_the_lead_once() {
    let app = spawn_app().await;
    let challenge_id = Uuid::new_v4();
    app.mock_request_otp(challenge_id).await;
    app.mock_verify_otp(challenge_id, "482913").await;
    Mock::given(method("POST"))
        .and(path("/macros/exec"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.sheet_server)
        .await;
    let flow_id = app.create_flow().await;

    let response = app
        .post_intent(&flow_id, "submit", lead_form("9876543210"))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["state"], "awaiting_code");
    assert_eq!(body["data"]["attemptsRemaining"], 3);

    let body: Value = app
        .post_intent(&flow_id, "verify", json!({"otp": "111111"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["state"], "awaiting_code");
    assert_eq!(body["data"]["attemptsRemaining"], 2);
    assert_eq!(body["data"]["codeError"]["reason"], "incorrect");

    let body: Value = app
        .post_intent(&flow_id, "verify", json!({"otp": "482913"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["state"], "thankyou");

    let sheet_requests = app.sheet_server.received_requests().await.unwrap();
    let form = String::from_utf8(sheet_requests[0].body.clone()).unwrap();
    assert!(form.contains("Phone=9876543210"));
    assert!(form.contains("Name=Asha+Verma"));
}

#[tokio::test]
async fn short_phone_never_reaches_the_otp_backend() {
    let app = spawn_app().await;
    app.mock_request_otp(Uuid::new_v4()).await;
    let flow_id = app.create_flow().await;

    let response = app.post_intent(&flow_id, "submit", lead_form("12345")).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["field"], "phone");
    assert_eq!(
        body["data"][0]["message"],
        "Please enter a valid 10-digit phone number."
    );
    assert!(app
        .otp_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn exhausted_attempts_block_verification() {
    let app = spawn_app().await;
    let challenge_id = Uuid::new_v4();
    app.mock_request_otp(challenge_id).await;
    app.mock_verify_otp(challenge_id, "482913").await;
    app.mock_sheet(200).await;
    let flow_id = app.create_flow().await;
    app.post_intent(&flow_id, "submit", lead_form("9876543210"))
        .await;

    for _ in 0..3 {
        let response = app
            .post_intent(&flow_id, "verify", json!({"otp": "000000"}))
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }
    let response = app
        .post_intent(&flow_id, "verify", json!({"otp": "482913"}))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(verify_request_count(&app).await, 3);
}

#[tokio::test]
async fn failed_save_keeps_the_user_on_the_code_screen() {
    let app = spawn_app().await;
    let challenge_id = Uuid::new_v4();
    app.mock_request_otp(challenge_id).await;
    app.mock_verify_otp(challenge_id, "482913").await;
    app.mock_sheet(500).await;
    let flow_id = app.create_flow().await;
    app.post_intent(&flow_id, "submit", lead_form("9876543210"))
        .await;

    let response = app
        .post_intent(&flow_id, "verify", json!({"otp": "482913"}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["state"], "awaiting_code");
    assert!(body["data"]["flowError"].is_string());

    let response = app
        .post_intent(&flow_id, "verify", json!({"otp": "482913"}))
        .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn change_phone_returns_to_the_form() {
    let app = spawn_app().await;
    app.mock_request_otp(Uuid::new_v4()).await;
    let flow_id = app.create_flow().await;
    app.post_intent(&flow_id, "submit", lead_form("9876543210"))
        .await;

    let body: Value = app
        .post_intent(&flow_id, "change-phone", json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["state"], "form");
    assert!(body["data"]["attemptsRemaining"].is_null());

    let body: Value = app
        .api_client
        .get(format!("{}/lead/flow/{}", &app.address, flow_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["state"], "form");
}

#[tokio::test]
async fn unknown_flow_is_not_found() {
    let app = spawn_app().await;
    let response = app
        .post_intent(&Uuid::new_v4().to_string(), "resend", json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}
