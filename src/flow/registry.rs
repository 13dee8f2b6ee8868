use chrono::Duration;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use super::challenge::OtpPolicy;
use super::clock::Clock;
use super::machine::SubmissionFlow;
use super::observer::FlowObserver;
use super::runner::{Collaborators, FlowHandle};

/// Live flows of this process, one per browser session.
pub struct FlowRegistry {
    flows: Mutex<HashMap<Uuid, FlowHandle>>,
    collaborators: Arc<Collaborators>,
    policy: OtpPolicy,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn FlowObserver>,
    idle_ttl: Duration,
}

impl FlowRegistry {
    pub fn new(
        collaborators: Collaborators,
        policy: OtpPolicy,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn FlowObserver>,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            flows: Mutex::new(HashMap::new()),
            collaborators: Arc::new(collaborators),
            policy,
            clock,
            observer,
            idle_ttl,
        }
    }

    #[tracing::instrument(name = "Create lead flow", skip(self))]
    pub fn create(&self) -> FlowHandle {
        self.purge_idle();
        let flow = SubmissionFlow::new(
            Uuid::new_v4(),
            self.policy,
            self.clock.clone(),
            self.observer.clone(),
        );
        let handle = FlowHandle::new(flow, self.collaborators.clone());
        tracing::info!(flow_id = %handle.id(), "Lead flow created");
        self.flows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.id(), handle.clone());
        handle
    }

    pub fn get(&self, flow_id: &Uuid) -> Option<FlowHandle> {
        self.flows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(flow_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.flows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_idle(&self) {
        let cutoff = self.clock.now() - self.idle_ttl;
        let mut flows = self.flows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = flows.len();
        flows.retain(|_, handle| handle.last_activity() > cutoff);
        let purged = before - flows.len();
        if purged > 0 {
            tracing::info!(purged, "Purged idle lead flows");
        }
    }
}
