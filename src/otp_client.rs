use crate::configuration::{OtpMode, OtpSettings};
use crate::errors::{IssueError, VerifyError};
use crate::flow::{Clock, LeadDraft, PhoneNumber};
use crate::utils::mask_phone;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Initial,
    Resend,
}

#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub flow_id: Uuid,
    pub kind: IssueKind,
    pub draft: LeadDraft,
}

impl IssueRequest {
    pub fn phone(&self) -> &PhoneNumber {
        &self.draft.phone
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeIssued {
    pub challenge_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Match,
    Mismatch(Option<String>),
    Expired,
}

#[async_trait]
pub trait OtpIssuer: Send + Sync {
    async fn request(&self, request: &IssueRequest) -> Result<ChallengeIssued, IssueError>;
}

#[async_trait]
pub trait OtpVerifier: Send + Sync {
    async fn verify(
        &self,
        phone: &PhoneNumber,
        code: &str,
        challenge_id: Uuid,
    ) -> Result<VerifyOutcome, VerifyError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestOtpBody<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    concern: &'a str,
    challenge_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResendOtpBody<'a> {
    phone: &'a str,
    challenge_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpBody<'a> {
    phone: &'a str,
    otp: &'a str,
    challenge_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OtpServiceResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    message: Option<String>,
    challenge_id: Option<Uuid>,
}

impl OtpServiceResponse {
    fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Client for the OTP backend that owns SMS delivery.
#[derive(Debug)]
pub struct HttpOtpClient {
    http_client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpOtpClient {
    #[tracing::instrument(skip(api_key))]
    pub fn new(
        base_url: String,
        api_key: Option<SecretString>,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        tracing::info!("Establishing connection to the OTP server.");
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.http_client.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(api_key) => {
                request.header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            }
            None => request,
        }
    }

    async fn send<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, OtpServiceResponse), anyhow::Error> {
        let response = self
            .post(path)
            .json(body)
            .send()
            .await
            .map_err(|err| anyhow!("Request error: {}", err))?;
        let status = response.status();
        let response_body: OtpServiceResponse = response
            .json()
            .await
            .map_err(|err| anyhow!("Failed to parse response ({}): {}", status, err))?;
        Ok((status, response_body))
    }
}

#[async_trait]
impl OtpIssuer for HttpOtpClient {
    #[tracing::instrument(name = "Request OTP", skip(self, request), fields(flow_id = %request.flow_id, kind = ?request.kind))]
    async fn request(&self, request: &IssueRequest) -> Result<ChallengeIssued, IssueError> {
        let challenge_id = Uuid::new_v4();
        let phone = request.phone().as_str();
        let (status, response_body) = match request.kind {
            IssueKind::Initial => {
                let body = RequestOtpBody {
                    name: &request.draft.name,
                    email: &request.draft.email,
                    phone,
                    concern: &request.draft.concern,
                    challenge_id,
                };
                self.send("/api/auth/request-otp", &body).await
            }
            IssueKind::Resend => {
                let body = ResendOtpBody {
                    phone,
                    challenge_id,
                };
                self.send("/api/auth/resend-otp", &body).await
            }
        }
        .map_err(IssueError::UnexpectedError)?;

        if status.is_success() && response_body.success {
            tracing::info!("OTP sent to {}", mask_phone(phone));
            return Ok(ChallengeIssued {
                challenge_id: response_body.challenge_id.unwrap_or(challenge_id),
            });
        }
        let default_message = match request.kind {
            IssueKind::Initial => "Failed to send OTP.",
            IssueKind::Resend => "Failed to resend OTP.",
        };
        Err(IssueError::Rejected(
            response_body.reason().unwrap_or(default_message).to_string(),
        ))
    }
}

#[async_trait]
impl OtpVerifier for HttpOtpClient {
    #[tracing::instrument(name = "Verify OTP", skip(self, phone, code))]
    async fn verify(
        &self,
        phone: &PhoneNumber,
        code: &str,
        challenge_id: Uuid,
    ) -> Result<VerifyOutcome, VerifyError> {
        let body = VerifyOtpBody {
            phone: phone.as_str(),
            otp: code,
            challenge_id,
        };
        let (status, response_body) = self
            .send("/api/auth/verify-otp", &body)
            .await
            .map_err(VerifyError::UnexpectedError)?;

        if status.is_server_error() {
            return Err(VerifyError::Rejected(
                response_body
                    .reason()
                    .unwrap_or("OTP service is unavailable. Please try again.")
                    .to_string(),
            ));
        }
        if status.is_success() && response_body.success {
            return Ok(VerifyOutcome::Match);
        }
        let reason = response_body.reason().map(str::to_string);
        match reason {
            Some(message) if message.to_lowercase().contains("expired") => {
                Ok(VerifyOutcome::Expired)
            }
            reason => Ok(VerifyOutcome::Mismatch(reason)),
        }
    }
}

#[derive(Debug)]
struct IssuedCode {
    phone: String,
    code: String,
    issued_at: DateTime<Utc>,
}

/// Generates codes locally and logs them instead of sending an SMS.
pub struct SimulatedOtpService {
    codes: Mutex<HashMap<Uuid, IssuedCode>>,
    code_length: usize,
    validity: Duration,
    clock: Arc<dyn Clock>,
}

impl SimulatedOtpService {
    pub fn new(code_length: usize, validity: Duration, clock: Arc<dyn Clock>) -> Self {
        tracing::info!("Using simulated OTP delivery.");
        Self {
            codes: Mutex::new(HashMap::new()),
            code_length,
            validity,
            clock,
        }
    }

    pub fn issued_code(&self, challenge_id: Uuid) -> Option<String> {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&challenge_id)
            .map(|issued| issued.code.clone())
    }
}

fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[async_trait]
impl OtpIssuer for SimulatedOtpService {
    #[tracing::instrument(name = "Request simulated OTP", skip(self, request), fields(flow_id = %request.flow_id, kind = ?request.kind))]
    async fn request(&self, request: &IssueRequest) -> Result<ChallengeIssued, IssueError> {
        let challenge_id = Uuid::new_v4();
        let phone = request.phone().to_string();
        let code = generate_code(self.code_length);
        tracing::info!(challenge_id = %challenge_id, code = %code, "Simulated OTP for {}", mask_phone(&phone));

        let now = self.clock.now();
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        // One live code per phone; expired codes of abandoned flows go too.
        codes.retain(|_, issued| issued.phone != phone && now < issued.issued_at + self.validity);
        codes.insert(
            challenge_id,
            IssuedCode {
                phone,
                code,
                issued_at: now,
            },
        );
        Ok(ChallengeIssued { challenge_id })
    }
}

#[async_trait]
impl OtpVerifier for SimulatedOtpService {
    #[tracing::instrument(name = "Verify simulated OTP", skip(self, phone, code))]
    async fn verify(
        &self,
        phone: &PhoneNumber,
        code: &str,
        challenge_id: Uuid,
    ) -> Result<VerifyOutcome, VerifyError> {
        let mut codes = self.codes.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(issued) = codes.get(&challenge_id) else {
            return Ok(VerifyOutcome::Mismatch(Some(
                "This OTP is no longer valid. Please request a new one.".to_string(),
            )));
        };
        if issued.phone != phone.as_str() {
            return Ok(VerifyOutcome::Mismatch(None));
        }
        if self.clock.now() >= issued.issued_at + self.validity {
            codes.remove(&challenge_id);
            return Ok(VerifyOutcome::Expired);
        }
        if issued.code != code {
            return Ok(VerifyOutcome::Mismatch(None));
        }
        codes.remove(&challenge_id);
        Ok(VerifyOutcome::Match)
    }
}

/// Direct-submit variant: every issue succeeds and every code matches.
#[derive(Debug, Default)]
pub struct BypassOtp;

#[async_trait]
impl OtpIssuer for BypassOtp {
    async fn request(&self, request: &IssueRequest) -> Result<ChallengeIssued, IssueError> {
        tracing::info!(flow_id = %request.flow_id, "Skipping OTP delivery");
        Ok(ChallengeIssued {
            challenge_id: Uuid::new_v4(),
        })
    }
}

#[async_trait]
impl OtpVerifier for BypassOtp {
    async fn verify(
        &self,
        _phone: &PhoneNumber,
        _code: &str,
        _challenge_id: Uuid,
    ) -> Result<VerifyOutcome, VerifyError> {
        Ok(VerifyOutcome::Match)
    }
}

pub fn get_otp_services(
    settings: &OtpSettings,
    clock: Arc<dyn Clock>,
) -> Result<(Arc<dyn OtpIssuer>, Arc<dyn OtpVerifier>), anyhow::Error> {
    match settings.mode {
        OtpMode::Real => {
            let client = Arc::new(HttpOtpClient::new(
                settings.base_url.clone(),
                settings
                    .api_key
                    .as_ref()
                    .map(|key| SecretString::from(key.expose_secret().to_string())),
                settings.timeout(),
            )?);
            let issuer: Arc<dyn OtpIssuer> = client.clone();
            let verifier: Arc<dyn OtpVerifier> = client;
            Ok((issuer, verifier))
        }
        OtpMode::Simulated => {
            let service = Arc::new(SimulatedOtpService::new(
                settings.code_length,
                settings.policy().validity,
                clock,
            ));
            let issuer: Arc<dyn OtpIssuer> = service.clone();
            let verifier: Arc<dyn OtpVerifier> = service;
            Ok((issuer, verifier))
        }
        OtpMode::Bypass => {
            tracing::warn!("OTP verification is bypassed.");
            let bypass = Arc::new(BypassOtp);
            let issuer: Arc<dyn OtpIssuer> = bypass.clone();
            let verifier: Arc<dyn OtpVerifier> = bypass;
            Ok((issuer, verifier))
        }
    }
}
