use actix_web::web;

use super::handlers::{change_phone, create_flow, get_flow, resend_code, submit_form, verify_code};

pub fn lead_route(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/flow").route(web::post().to(create_flow)));
    cfg.service(web::resource("/flow/{flow_id}").route(web::get().to(get_flow)));
    cfg.service(web::resource("/flow/{flow_id}/submit").route(web::post().to(submit_form)));
    cfg.service(web::resource("/flow/{flow_id}/verify").route(web::post().to(verify_code)));
    cfg.service(web::resource("/flow/{flow_id}/resend").route(web::post().to(resend_code)));
    cfg.service(
        web::resource("/flow/{flow_id}/change-phone").route(web::post().to(change_phone)),
    );
}
