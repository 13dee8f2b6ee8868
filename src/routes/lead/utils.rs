use actix_web::web;
use uuid::Uuid;

use super::errors::LeadFlowError;
use crate::flow::{FlowHandle, FlowRegistry, FlowSnapshot, Intent};
use crate::schemas::GenericResponse;

pub fn find_flow(registry: &FlowRegistry, flow_id: Uuid) -> Result<FlowHandle, LeadFlowError> {
    registry
        .get(&flow_id)
        .ok_or(LeadFlowError::NotFound(flow_id))
}

/// Collaborator failures are not HTTP errors: they come back as a 200 whose
/// snapshot carries the flow error.
pub fn snapshot_response(
    snapshot: FlowSnapshot,
    message: &str,
) -> web::Json<GenericResponse<FlowSnapshot>> {
    let message = snapshot.flow_error.clone().unwrap_or_else(|| message.to_string());
    web::Json(GenericResponse::success(&message, Some(snapshot)))
}

#[tracing::instrument(name = "Run lead flow intent", skip(registry, intent), fields(intent = ?intent.kind()))]
pub async fn run_intent(
    registry: &FlowRegistry,
    flow_id: Uuid,
    intent: Intent,
    message: &str,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    let handle = find_flow(registry, flow_id)?;
    match handle.dispatch(intent).await {
        Ok(snapshot) => Ok(snapshot_response(snapshot, message)),
        Err(e) => {
            tracing::info!("Lead flow intent rejected: {}", e);
            Err(LeadFlowError::Rejected(e))
        }
    }
}
