use actix_web::{HttpResponse, Responder};

#[utoipa::path(
    get,
    path = "/util/health_check",
    tag = "Utility API",
    responses(
        (status=200, description= "Server is running"),
    )
)]
#[tracing::instrument(name = "Health check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("Running Server")
}
