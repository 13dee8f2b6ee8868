use crate::openapi::ApiDoc;
use crate::routes::{lead_route, util_route};
use actix_web::{web, HttpResponse, Responder};
use utoipa::OpenApi;

async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn main_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/lead").configure(lead_route))
        .service(web::scope("/util").configure(util_route))
        .route("/api-docs/openapi.json", web::get().to(openapi_json));
}
