use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Instrument;
use uuid::Uuid;

use crate::lead_sink::LeadSink;
use crate::otp_client::{OtpIssuer, OtpVerifier};

use super::errors::FlowRejection;
use super::machine::{Effect, EffectResult, SubmissionFlow, Ticket};
use super::schemas::{FlowSnapshot, Intent};

pub struct Collaborators {
    pub issuer: Arc<dyn OtpIssuer>,
    pub verifier: Arc<dyn OtpVerifier>,
    pub sink: Arc<dyn LeadSink>,
}

impl Collaborators {
    pub fn new(
        issuer: Arc<dyn OtpIssuer>,
        verifier: Arc<dyn OtpVerifier>,
        sink: Arc<dyn LeadSink>,
    ) -> Self {
        Self {
            issuer,
            verifier,
            sink,
        }
    }

    pub async fn perform(&self, effect: Effect) -> (Ticket, EffectResult) {
        match effect {
            Effect::Issue { ticket, request } => {
                (ticket, EffectResult::Issued(self.issuer.request(&request).await))
            }
            Effect::Verify {
                ticket,
                phone,
                code,
                challenge_id,
            } => (
                ticket,
                EffectResult::Verified(self.verifier.verify(&phone, &code, challenge_id).await),
            ),
            Effect::Commit { ticket, record } => {
                (ticket, EffectResult::Committed(self.sink.commit(&record).await))
            }
        }
    }
}

/// Shared handle to one flow. The lock is only held for the synchronous
/// transition steps, never while a collaborator call is awaited.
#[derive(Clone)]
pub struct FlowHandle {
    id: Uuid,
    flow: Arc<Mutex<SubmissionFlow>>,
    collaborators: Arc<Collaborators>,
}

impl FlowHandle {
    pub fn new(flow: SubmissionFlow, collaborators: Arc<Collaborators>) -> Self {
        Self {
            id: flow.id(),
            flow: Arc::new(Mutex::new(flow)),
            collaborators,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionFlow> {
        self.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.lock().snapshot()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.lock().last_activity()
    }

    pub fn with_flow<R>(&self, f: impl FnOnce(&SubmissionFlow) -> R) -> R {
        f(&*self.lock())
    }

    /// Applies the intent and performs the collaborator calls it leads to.
    ///
    /// The calls run on a spawned task, so dropping the returned future (a
    /// client disconnecting mid-request) never leaves the flow busy: the task
    /// still resolves the outcome.
    #[tracing::instrument(name = "Run lead intent", skip(self, intent), fields(flow_id = %self.id))]
    pub async fn dispatch(&self, intent: Intent) -> Result<FlowSnapshot, FlowRejection> {
        let next = self.lock().dispatch(intent)?;
        if let Some(effect) = next {
            let handle = self.clone();
            let driver = tokio::spawn(async move { handle.drive(effect).await }.in_current_span());
            if let Err(e) = driver.await {
                tracing::error!("Lead flow effect task failed: {:?}", e);
                self.lock().abandon();
            }
        }
        Ok(self.snapshot())
    }

    async fn drive(&self, effect: Effect) {
        let mut next = Some(effect);
        while let Some(effect) = next {
            let (ticket, result) = self.collaborators.perform(effect).await;
            next = self.lock().resolve(ticket, result);
        }
    }
}
