use crate::flow::FlowRejection;
use crate::schemas::GenericResponse;
use crate::utils::error_chain_fmt;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum LeadFlowError {
    #[error("Submission {0} was not found or has expired.")]
    NotFound(Uuid),
    #[error(transparent)]
    Rejected(#[from] FlowRejection),
}

impl std::fmt::Debug for LeadFlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for LeadFlowError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeadFlowError::NotFound(_) => StatusCode::NOT_FOUND,
            LeadFlowError::Rejected(FlowRejection::Validation(_)) => StatusCode::BAD_REQUEST,
            LeadFlowError::Rejected(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        let message = self.to_string();
        match self {
            LeadFlowError::Rejected(FlowRejection::Validation(errors)) => HttpResponse::build(
                status_code,
            )
            .json(GenericResponse::error(
                &message,
                status_code_str,
                Some(errors.clone()),
            )),
            _ => HttpResponse::build(status_code).json(GenericResponse::error(
                &message,
                status_code_str,
                Some(()),
            )),
        }
    }
}
