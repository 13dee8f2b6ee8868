use uuid::Uuid;

use super::schemas::{FlowState, LeadField};

/// Presentation-facing notifications emitted by a flow.
pub trait FlowObserver: Send + Sync {
    fn on_state_change(&self, flow_id: Uuid, state: FlowState);

    fn on_field_error(&self, flow_id: Uuid, field: LeadField, message: &str);

    fn on_flow_error(&self, flow_id: Uuid, message: &str);
}

#[derive(Debug, Default)]
pub struct TracingObserver;

impl FlowObserver for TracingObserver {
    fn on_state_change(&self, flow_id: Uuid, state: FlowState) {
        tracing::info!(%flow_id, %state, "Lead flow state changed");
    }

    fn on_field_error(&self, flow_id: Uuid, field: LeadField, message: &str) {
        tracing::info!(%flow_id, ?field, message, "Lead flow field error");
    }

    fn on_flow_error(&self, flow_id: Uuid, message: &str) {
        tracing::warn!(%flow_id, message, "Lead flow error");
    }
}
