use crate::utils::error_chain_fmt;

use super::schemas::{FieldError, FlowState, IntentKind};

/// Reasons an intent is refused without contacting any collaborator.
#[derive(thiserror::Error, PartialEq)]
pub enum FlowRejection {
    #[error("A request is already in progress. Please wait.")]
    Busy,
    #[error("This submission has already been completed.")]
    Finished,
    #[error("Cannot {intent} while the flow is in {state} state.")]
    UnexpectedIntent { intent: IntentKind, state: FlowState },
    #[error("Please correct the highlighted fields.")]
    Validation(Vec<FieldError>),
    #[error("No active OTP for this submission. Please request a new OTP.")]
    NoLiveChallenge,
    #[error("This OTP has already been used. Please request a new OTP.")]
    ChallengeConsumed,
    #[error("Too many incorrect attempts. Please request a new OTP or change your phone number.")]
    AttemptsExhausted,
}

impl std::fmt::Debug for FlowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
