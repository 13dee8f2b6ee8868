use lead_capture::{
    configuration::{get_configuration, LeadSinkKind, OtpMode},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub otp_server: MockServer,
    pub sheet_server: MockServer,
    pub api_client: reqwest::Client,
}

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let test_log = std::env::var("TEST_LOG")
        .map(|value| value == "true")
        .unwrap_or(false);
    if test_log {
        let subscriber = get_subscriber(default_filter_level, None, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to set subscriber");
    } else {
        let subscriber = get_subscriber(default_filter_level, None, std::io::sink);
        init_subscriber(subscriber).expect("Failed to set subscriber");
    }
});

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);
    let otp_server = MockServer::start().await;
    let sheet_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.application.host = "127.0.0.1".to_string();
        c.application.workers = 1;
        c.otp.mode = OtpMode::Real;
        c.otp.base_url = otp_server.uri();
        c.otp.timeout_milliseconds = 2000;
        c.lead_sink.kind = LeadSinkKind::Sheet;
        c.lead_sink.sheet_url = format!("{}/macros/exec", sheet_server.uri());
        c.lead_sink.timeout_milliseconds = 2000;
        c
    };
    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        otp_server,
        sheet_server,
        api_client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn mock_request_otp(&self, challenge_id: Uuid) {
        Mock::given(method("POST"))
            .and(path("/api/auth/request-otp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "challengeId": challenge_id})),
            )
            .mount(&self.otp_server)
            .await;
    }

    pub async fn mock_verify_otp(&self, challenge_id: Uuid, code: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/verify-otp"))
            .and(body_partial_json(
                json!({"otp": code, "challengeId": challenge_id}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .with_priority(1)
            .mount(&self.otp_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/verify-otp"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"success": false, "message": "Invalid OTP"})),
            )
            .with_priority(10)
            .mount(&self.otp_server)
            .await;
    }

    pub async fn mock_sheet(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/macros/exec"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.sheet_server)
            .await;
    }

    pub async fn create_flow(&self) -> String {
        let body: Value = self
            .api_client
            .post(format!("{}/lead/flow", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .expect("Failed to parse response.");
        body["data"]["flowId"]
            .as_str()
            .expect("Missing flow id")
            .to_string()
    }

    pub async fn post_intent(&self, flow_id: &str, action: &str, body: Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/lead/flow/{}/{}", &self.address, flow_id, action))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn lead_form(phone: &str) -> Value {
    json!({
        "name": "Asha Verma",
        "email": "asha@example.com",
        "phone": phone,
        "concern": "Late-night gaming"
    })
}
