use crate::flow::{
    CodeError, CodeErrorReason, FieldError, FlowSnapshot, FlowState, LeadField, LeadForm,
};
use crate::routes::lead::handlers::{
    __path_change_phone, __path_create_flow, __path_get_flow, __path_resend_code,
    __path_submit_form, __path_verify_code,
};
use crate::routes::lead::schemas::VerifyCodeRequest;
use crate::routes::util::handlers::__path_health_check;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_flow,
        get_flow,
        submit_form,
        verify_code,
        resend_code,
        change_phone,
        health_check,
    ),
    components(schemas(
        LeadForm,
        VerifyCodeRequest,
        FlowSnapshot,
        FlowState,
        FieldError,
        LeadField,
        CodeError,
        CodeErrorReason,
    )),
    tags(
        (name = "Lead Flow API", description = "OTP-gated lead capture endpoints")
    ),
)]
pub struct ApiDoc {}
