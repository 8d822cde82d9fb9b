use actix_web::{guard, web};

pub mod health;
pub mod public;
pub mod weather;

/// Register every route. The OPTIONS catch-all must come first so it wins over
/// method-specific resources on the same path.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{tail:.*}")
            .guard(guard::Options())
            .to(crate::cors::preflight),
    );
    public::configure(cfg);
    health::configure(cfg);
    weather::configure(cfg);
}
