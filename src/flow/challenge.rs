use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::constants::{DEFAULT_MAX_VERIFY_ATTEMPTS, DEFAULT_OTP_VALIDITY_SECONDS};

use super::schemas::PhoneNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub max_attempts: u32,
    pub validity: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_VERIFY_ATTEMPTS,
            validity: Duration::seconds(DEFAULT_OTP_VALIDITY_SECONDS),
        }
    }
}

/// A single issued OTP. At most one is live per flow.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    id: Uuid,
    phone_target: PhoneNumber,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    attempts_remaining: u32,
    consumed: bool,
}

impl OtpChallenge {
    pub fn new(
        id: Uuid,
        phone_target: PhoneNumber,
        issued_at: DateTime<Utc>,
        policy: &OtpPolicy,
    ) -> Self {
        Self {
            id,
            phone_target,
            issued_at,
            expires_at: issued_at + policy.validity,
            attempts_remaining: policy.max_attempts,
            consumed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phone_target(&self) -> &PhoneNumber {
        &self.phone_target
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn record_failure(&mut self) {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }
}
