//! CORS configuration.

use actix_cors::Cors;
use actix_web::HttpResponse;

/// Fully open CORS: any origin, method and header; all response headers
/// exposed so browsers can read the price hint and server identity.
pub fn build_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .expose_any_header()
        .send_wildcard()
        .max_age(3600)
}

/// OPTIONS on any path: 200 with an empty body.
///
/// Covers bare OPTIONS requests that the CORS middleware does not treat as
/// preflights (no `Origin` / `Access-Control-Request-Method`).
pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}
