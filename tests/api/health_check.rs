use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/util/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
    assert_eq!(Some(14), response.content_length());
}

#[tokio::test]
async fn openapi_document_lists_lead_routes() {
    let app = spawn_app().await;

    let body: serde_json::Value = app
        .api_client
        .get(format!("{}/api-docs/openapi.json", &app.address))
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response.");

    assert!(body["paths"]["/lead/flow/{flow_id}/verify"].is_object());
    assert!(app.port > 0);
}
