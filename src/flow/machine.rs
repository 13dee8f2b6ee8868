use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{COMMIT_FAILURE_MESSAGE, INTERRUPTED_REQUEST_MESSAGE};
use crate::errors::{CommitError, IssueError, VerifyError};
use crate::lead_sink::Committed;
use crate::otp_client::{ChallengeIssued, IssueKind, IssueRequest, VerifyOutcome};
use crate::utils::mask_phone;

use super::challenge::{OtpChallenge, OtpPolicy};
use super::clock::Clock;
use super::errors::FlowRejection;
use super::observer::FlowObserver;
use super::schemas::{
    CodeError, FieldError, FlowSnapshot, FlowState, Intent, LeadDraft, LeadField, LeadForm,
    LeadRecord, PhoneNumber,
};
use super::validation::{validate_code, validate_lead_form};

/// Identifies the request an effect belongs to. A result carrying a stale
/// ticket is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    challenge_id: Option<Uuid>,
}

/// A collaborator call the flow wants performed.
#[derive(Debug)]
pub enum Effect {
    Issue {
        ticket: Ticket,
        request: IssueRequest,
    },
    Verify {
        ticket: Ticket,
        phone: PhoneNumber,
        code: String,
        challenge_id: Uuid,
    },
    Commit {
        ticket: Ticket,
        record: LeadRecord,
    },
}

#[derive(Debug)]
pub enum EffectResult {
    Issued(Result<ChallengeIssued, IssueError>),
    Verified(Result<VerifyOutcome, VerifyError>),
    Committed(Result<Committed, CommitError>),
}

/// One lead submission, from the contact form to the thank-you screen.
///
/// The flow never performs I/O itself. [`SubmissionFlow::dispatch`] turns a
/// user intent into at most one [`Effect`]; the caller performs it and hands
/// the outcome back through [`SubmissionFlow::resolve`], which may ask for a
/// follow-up effect (a successful verify is followed by the commit).
pub struct SubmissionFlow {
    id: Uuid,
    state: FlowState,
    draft: Option<LeadDraft>,
    challenge: Option<OtpChallenge>,
    code_input: String,
    code_error: Option<CodeError>,
    field_errors: Vec<FieldError>,
    flow_error: Option<String>,
    is_submitting: bool,
    generation: u64,
    pending_record: Option<LeadRecord>,
    committed: Option<(LeadRecord, Committed)>,
    last_activity: DateTime<Utc>,
    policy: OtpPolicy,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn FlowObserver>,
}

impl SubmissionFlow {
    pub fn new(
        id: Uuid,
        policy: OtpPolicy,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn FlowObserver>,
    ) -> Self {
        let last_activity = clock.now();
        Self {
            id,
            state: FlowState::Form,
            draft: None,
            challenge: None,
            code_input: String::new(),
            code_error: None,
            field_errors: vec![],
            flow_error: None,
            is_submitting: false,
            generation: 0,
            pending_record: None,
            committed: None,
            last_activity,
            policy,
            clock,
            observer,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn draft(&self) -> Option<&LeadDraft> {
        self.draft.as_ref()
    }

    pub fn challenge(&self) -> Option<&OtpChallenge> {
        self.challenge.as_ref()
    }

    pub fn code_input(&self) -> &str {
        &self.code_input
    }

    pub fn code_error(&self) -> Option<&CodeError> {
        self.code_error.as_ref()
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn flow_error(&self) -> Option<&str> {
        self.flow_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn committed_record(&self) -> Option<&LeadRecord> {
        self.committed.as_ref().map(|(record, _)| record)
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            flow_id: self.id,
            state: self.state,
            // The phone is only shown once it is locked in for an OTP.
            phone: self
                .draft
                .as_ref()
                .filter(|_| self.state != FlowState::Form)
                .map(|draft| mask_phone(draft.phone.as_str())),
            field_errors: self.field_errors.clone(),
            code_error: self.code_error.clone(),
            flow_error: self.flow_error.clone(),
            attempts_remaining: self
                .challenge
                .as_ref()
                .filter(|challenge| !challenge.is_consumed())
                .map(OtpChallenge::attempts_remaining),
            code_expires_at: self
                .challenge
                .as_ref()
                .filter(|challenge| !challenge.is_consumed())
                .map(OtpChallenge::expires_at),
            is_submitting: self.is_submitting,
        }
    }

    #[tracing::instrument(name = "Dispatch lead intent", skip(self, intent), fields(flow_id = %self.id, state = %self.state, intent = ?intent.kind()))]
    pub fn dispatch(&mut self, intent: Intent) -> Result<Option<Effect>, FlowRejection> {
        self.last_activity = self.clock.now();
        match (self.state, intent) {
            (FlowState::Thankyou, _) => Err(FlowRejection::Finished),
            // A commit in flight cannot be interrupted by the user.
            (FlowState::Submitting, _) => Err(FlowRejection::Busy),
            (FlowState::Form, Intent::SubmitForm(form)) => self.submit_form(form),
            (FlowState::AwaitingCode, Intent::SubmitCode(code)) => self.submit_code(&code),
            (FlowState::AwaitingCode, Intent::Resend) => self.resend(),
            (FlowState::AwaitingCode, Intent::ChangePhone) => {
                self.change_phone();
                Ok(None)
            }
            (state, intent) => Err(FlowRejection::UnexpectedIntent {
                intent: intent.kind(),
                state,
            }),
        }
    }

    #[tracing::instrument(name = "Resolve lead effect", skip(self, result), fields(flow_id = %self.id, state = %self.state))]
    pub fn resolve(&mut self, ticket: Ticket, result: EffectResult) -> Option<Effect> {
        self.last_activity = self.clock.now();
        if ticket.generation != self.generation {
            tracing::warn!(
                ?ticket,
                generation = self.generation,
                "Ignoring response for a superseded request"
            );
            return None;
        }
        match result {
            EffectResult::Issued(outcome) => {
                self.complete_issue(outcome);
                None
            }
            EffectResult::Verified(outcome) => self.complete_verify(ticket, outcome),
            EffectResult::Committed(outcome) => {
                self.complete_commit(outcome);
                None
            }
        }
    }

    /// Recovers from an effect whose result will never be resolved. Any late
    /// result is dropped, and a lost commit needs a fresh code like a failed one.
    pub fn abandon(&mut self) {
        self.generation += 1;
        self.is_submitting = false;
        if self.pending_record.take().is_some() && self.state == FlowState::Submitting {
            self.transition(FlowState::AwaitingCode);
            self.raise_flow_error(COMMIT_FAILURE_MESSAGE.to_string());
        } else {
            self.raise_flow_error(INTERRUPTED_REQUEST_MESSAGE.to_string());
        }
    }

    fn ensure_idle(&self) -> Result<(), FlowRejection> {
        if self.is_submitting {
            return Err(FlowRejection::Busy);
        }
        Ok(())
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
            challenge_id: self.challenge.as_ref().map(OtpChallenge::id),
        }
    }

    fn transition(&mut self, next: FlowState) {
        if self.state != next {
            tracing::info!(from = %self.state, to = %next, "Lead flow transition");
            self.state = next;
            self.observer.on_state_change(self.id, next);
        }
    }

    fn reject_fields(&mut self, errors: Vec<FieldError>) -> FlowRejection {
        for error in &errors {
            self.observer
                .on_field_error(self.id, error.field, &error.message);
        }
        self.field_errors = errors.clone();
        FlowRejection::Validation(errors)
    }

    fn raise_flow_error(&mut self, message: String) {
        self.observer.on_flow_error(self.id, &message);
        self.flow_error = Some(message);
    }

    fn clear_errors(&mut self) {
        self.field_errors.clear();
        self.code_error = None;
        self.flow_error = None;
    }

    fn begin_issue(&mut self, draft: LeadDraft, kind: IssueKind) -> Effect {
        self.generation += 1;
        self.is_submitting = true;
        Effect::Issue {
            ticket: self.ticket(),
            request: IssueRequest {
                flow_id: self.id,
                kind,
                draft,
            },
        }
    }

    fn submit_form(&mut self, form: LeadForm) -> Result<Option<Effect>, FlowRejection> {
        self.ensure_idle()?;
        let draft = validate_lead_form(&form).map_err(|errors| self.reject_fields(errors))?;
        self.clear_errors();
        self.draft = Some(draft.clone());
        Ok(Some(self.begin_issue(draft, IssueKind::Initial)))
    }

    fn submit_code(&mut self, code: &str) -> Result<Option<Effect>, FlowRejection> {
        self.ensure_idle()?;
        let code = validate_code(code).map_err(|error| self.reject_fields(vec![error]))?;
        let now = self.clock.now();
        let (challenge_id, phone, expired) = {
            let challenge = self
                .challenge
                .as_ref()
                .ok_or(FlowRejection::NoLiveChallenge)?;
            if challenge.is_consumed() {
                return Err(FlowRejection::ChallengeConsumed);
            }
            if challenge.is_exhausted() {
                return Err(FlowRejection::AttemptsExhausted);
            }
            (
                challenge.id(),
                challenge.phone_target().clone(),
                challenge.is_expired(now),
            )
        };
        self.clear_errors();
        self.code_input = code.clone();
        if expired {
            self.record_failed_attempt(CodeError::expired());
            return Ok(None);
        }
        self.is_submitting = true;
        Ok(Some(Effect::Verify {
            ticket: self.ticket(),
            phone,
            code,
            challenge_id,
        }))
    }

    fn resend(&mut self) -> Result<Option<Effect>, FlowRejection> {
        self.ensure_idle()?;
        let Some(draft) = self.draft.clone() else {
            return Err(FlowRejection::NoLiveChallenge);
        };
        self.challenge = None;
        self.code_input.clear();
        self.clear_errors();
        Ok(Some(self.begin_issue(draft, IssueKind::Resend)))
    }

    fn change_phone(&mut self) {
        self.generation += 1;
        self.challenge = None;
        self.code_input.clear();
        self.clear_errors();
        self.is_submitting = false;
        self.transition(FlowState::Form);
    }

    fn record_failed_attempt(&mut self, error: CodeError) {
        if let Some(challenge) = self.challenge.as_mut() {
            challenge.record_failure();
        }
        self.observer
            .on_field_error(self.id, LeadField::Code, &error.message);
        self.code_error = Some(error);
    }

    fn complete_issue(&mut self, outcome: Result<ChallengeIssued, IssueError>) {
        self.is_submitting = false;
        match outcome {
            Ok(issued) => {
                let Some(phone) = self.draft.as_ref().map(|draft| draft.phone.clone()) else {
                    tracing::error!("OTP issued for a flow without contact details");
                    return;
                };
                self.challenge = Some(OtpChallenge::new(
                    issued.challenge_id,
                    phone,
                    self.clock.now(),
                    &self.policy,
                ));
                self.transition(FlowState::AwaitingCode);
            }
            Err(e) => {
                tracing::error!("Failed to issue OTP: {:?}", e);
                self.raise_flow_error(e.to_string());
            }
        }
    }

    fn complete_verify(
        &mut self,
        ticket: Ticket,
        outcome: Result<VerifyOutcome, VerifyError>,
    ) -> Option<Effect> {
        let live_challenge = self.challenge.as_ref().map(OtpChallenge::id);
        if ticket.challenge_id.is_none() || ticket.challenge_id != live_challenge {
            tracing::warn!(?ticket, "Ignoring verification for a superseded OTP");
            return None;
        }
        match outcome {
            Ok(VerifyOutcome::Match) => {
                let Some(draft) = self.draft.as_ref() else {
                    self.is_submitting = false;
                    tracing::error!("OTP verified for a flow without contact details");
                    return None;
                };
                let record = LeadRecord::new(self.id, draft, self.clock.now());
                if let Some(challenge) = self.challenge.as_mut() {
                    challenge.consume();
                }
                self.code_error = None;
                self.pending_record = Some(record.clone());
                self.transition(FlowState::Submitting);
                Some(Effect::Commit { ticket, record })
            }
            Ok(VerifyOutcome::Mismatch(message)) => {
                self.is_submitting = false;
                self.record_failed_attempt(CodeError::incorrect(message));
                None
            }
            Ok(VerifyOutcome::Expired) => {
                self.is_submitting = false;
                self.record_failed_attempt(CodeError::expired());
                None
            }
            Err(e) => {
                self.is_submitting = false;
                tracing::error!("Failed to verify OTP: {:?}", e);
                self.raise_flow_error(e.to_string());
                None
            }
        }
    }

    fn complete_commit(&mut self, outcome: Result<Committed, CommitError>) {
        self.is_submitting = false;
        let Some(record) = self.pending_record.take() else {
            tracing::warn!("Ignoring commit result without a pending lead");
            return;
        };
        if self.state != FlowState::Submitting {
            tracing::warn!("Ignoring commit result outside of submission");
            return;
        }
        match outcome {
            Ok(committed) => {
                tracing::info!(reference = ?committed.reference, "Lead committed");
                self.committed = Some((record, committed));
                self.code_input.clear();
                self.transition(FlowState::Thankyou);
            }
            Err(e) => {
                tracing::error!("Failed to commit lead: {:?}", e);
                self.transition(FlowState::AwaitingCode);
                self.raise_flow_error(COMMIT_FAILURE_MESSAGE.to_string());
            }
        }
    }
}
