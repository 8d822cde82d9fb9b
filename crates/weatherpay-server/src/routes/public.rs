use actix_web::{web, HttpResponse};

use crate::metrics::record_request;

/// GET /non-protected - no identity or payment required
pub async fn non_protected() -> HttpResponse {
    record_request("/non-protected", 200);
    HttpResponse::Ok().json(serde_json::json!({
        "message": "This is a non-protected route"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/non-protected", web::get().to(non_protected));
}
