use actix_web::web;
use uuid::Uuid;

use super::errors::LeadFlowError;
use super::schemas::VerifyCodeRequest;
use super::utils::{find_flow, run_intent, snapshot_response};
use crate::flow::{FlowRegistry, FlowSnapshot, Intent, LeadForm};
use crate::schemas::GenericResponse;

#[utoipa::path(
    post,
    path = "/lead/flow",
    tag = "Lead Flow API",
    responses(
        (status=200, description= "Submission started", body= GenericResponse<FlowSnapshot>),
    )
)]
#[tracing::instrument(name = "Create lead flow API", skip(registry))]
pub async fn create_flow(
    registry: web::Data<FlowRegistry>,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    let handle = registry.create();
    Ok(snapshot_response(
        handle.snapshot(),
        "Successfully started submission",
    ))
}

#[utoipa::path(
    get,
    path = "/lead/flow/{flow_id}",
    tag = "Lead Flow API",
    params(("flow_id" = Uuid, Path, description = "Submission id")),
    responses(
        (status=200, description= "Current submission state", body= GenericResponse<FlowSnapshot>),
        (status=404, description= "Unknown submission"),
    )
)]
#[tracing::instrument(err, name = "Fetch lead flow API", skip(registry), fields(flow_id = %flow_id))]
pub async fn get_flow(
    registry: web::Data<FlowRegistry>,
    flow_id: web::Path<Uuid>,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    let handle = find_flow(&registry, *flow_id)?;
    Ok(snapshot_response(
        handle.snapshot(),
        "Successfully fetched submission",
    ))
}

#[utoipa::path(
    post,
    path = "/lead/flow/{flow_id}/submit",
    tag = "Lead Flow API",
    request_body(content = LeadForm, description = "Request Body"),
    params(("flow_id" = Uuid, Path, description = "Submission id")),
    responses(
        (status=200, description= "OTP requested", body= GenericResponse<FlowSnapshot>),
        (status=400, description= "Invalid contact details"),
        (status=409, description= "Submission cannot accept the form"),
    )
)]
#[tracing::instrument(err, name = "Submit lead form API", skip(registry, body), fields(flow_id = %flow_id))]
pub async fn submit_form(
    registry: web::Data<FlowRegistry>,
    flow_id: web::Path<Uuid>,
    body: web::Json<LeadForm>,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    run_intent(
        &registry,
        *flow_id,
        Intent::SubmitForm(body.into_inner()),
        "OTP sent successfully",
    )
    .await
}

#[utoipa::path(
    post,
    path = "/lead/flow/{flow_id}/verify",
    tag = "Lead Flow API",
    request_body(content = VerifyCodeRequest, description = "Request Body"),
    params(("flow_id" = Uuid, Path, description = "Submission id")),
    responses(
        (status=200, description= "Code checked", body= GenericResponse<FlowSnapshot>),
        (status=400, description= "Blank code"),
        (status=409, description= "No code can be verified right now"),
    )
)]
#[tracing::instrument(err, name = "Verify lead OTP API", skip(registry, body), fields(flow_id = %flow_id))]
pub async fn verify_code(
    registry: web::Data<FlowRegistry>,
    flow_id: web::Path<Uuid>,
    body: web::Json<VerifyCodeRequest>,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    run_intent(
        &registry,
        *flow_id,
        Intent::SubmitCode(body.into_inner().otp),
        "OTP verified",
    )
    .await
}

#[utoipa::path(
    post,
    path = "/lead/flow/{flow_id}/resend",
    tag = "Lead Flow API",
    params(("flow_id" = Uuid, Path, description = "Submission id")),
    responses(
        (status=200, description= "OTP resent", body= GenericResponse<FlowSnapshot>),
        (status=409, description= "Submission cannot resend right now"),
    )
)]
#[tracing::instrument(err, name = "Resend lead OTP API", skip(registry), fields(flow_id = %flow_id))]
pub async fn resend_code(
    registry: web::Data<FlowRegistry>,
    flow_id: web::Path<Uuid>,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    run_intent(&registry, *flow_id, Intent::Resend, "OTP resent successfully").await
}

#[utoipa::path(
    post,
    path = "/lead/flow/{flow_id}/change-phone",
    tag = "Lead Flow API",
    params(("flow_id" = Uuid, Path, description = "Submission id")),
    responses(
        (status=200, description= "Back to the contact form", body= GenericResponse<FlowSnapshot>),
        (status=409, description= "Submission cannot change phone right now"),
    )
)]
#[tracing::instrument(err, name = "Change lead phone API", skip(registry), fields(flow_id = %flow_id))]
pub async fn change_phone(
    registry: web::Data<FlowRegistry>,
    flow_id: web::Path<Uuid>,
) -> Result<web::Json<GenericResponse<FlowSnapshot>>, LeadFlowError> {
    run_intent(
        &registry,
        *flow_id,
        Intent::ChangePhone,
        "Please update your phone number",
    )
    .await
}
