use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::PHONE_PATTERN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(s: &str) -> Result<PhoneNumber, String> {
        if PHONE_PATTERN.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err("Please enter a valid 10-digit phone number.".to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Raw contact details as typed by the user.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub concern: String,
}

/// Contact details that passed validation. Owned by exactly one flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDraft {
    pub name: String,
    pub email: String,
    pub phone: PhoneNumber,
    pub concern: String,
}

/// The lead handed to the sink once the phone has been verified.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub flow_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub concern: String,
    pub submitted_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn new(flow_id: Uuid, draft: &LeadDraft, submitted_at: DateTime<Utc>) -> Self {
        Self {
            flow_id,
            name: draft.name.clone(),
            email: draft.email.clone(),
            phone: draft.phone.to_string(),
            concern: draft.concern.clone(),
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Form,
    AwaitingCode,
    Submitting,
    Thankyou,
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            FlowState::Form => "form",
            FlowState::AwaitingCode => "awaiting_code",
            FlowState::Submitting => "submitting",
            FlowState::Thankyou => "thankyou",
        };
        write!(f, "{}", state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Name,
    Email,
    Phone,
    Concern,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: LeadField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: LeadField, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CodeErrorReason {
    Incorrect,
    Expired,
}

/// Error attached to the OTP input after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeError {
    pub reason: CodeErrorReason,
    pub message: String,
}

impl CodeError {
    pub fn incorrect(message: Option<String>) -> Self {
        Self {
            reason: CodeErrorReason::Incorrect,
            message: message.unwrap_or_else(|| "Invalid OTP. Please try again.".to_string()),
        }
    }

    pub fn expired() -> Self {
        Self {
            reason: CodeErrorReason::Expired,
            message: "OTP has expired. Please request a new one.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Intent {
    SubmitForm(LeadForm),
    SubmitCode(String),
    Resend,
    ChangePhone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    SubmitForm,
    SubmitCode,
    Resend,
    ChangePhone,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::SubmitForm(_) => IntentKind::SubmitForm,
            Intent::SubmitCode(_) => IntentKind::SubmitCode,
            Intent::Resend => IntentKind::Resend,
            Intent::ChangePhone => IntentKind::ChangePhone,
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            IntentKind::SubmitForm => "submit the form",
            IntentKind::SubmitCode => "submit an OTP",
            IntentKind::Resend => "resend the OTP",
            IntentKind::ChangePhone => "change the phone number",
        };
        write!(f, "{}", kind)
    }
}

/// Read model of a flow, rendered by the presentation layer.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub flow_id: Uuid,
    pub state: FlowState,
    pub phone: Option<String>,
    pub field_errors: Vec<FieldError>,
    pub code_error: Option<CodeError>,
    pub flow_error: Option<String>,
    pub attempts_remaining: Option<u32>,
    pub code_expires_at: Option<DateTime<Utc>>,
    pub is_submitting: bool,
}
