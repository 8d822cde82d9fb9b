use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weatherpay_server::{
    config::ServerConfig, cors, metrics::register_metrics, routes, state::AppState,
};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Fail before binding: a server without its key cannot answer any paid request.
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let port = config.port;

    tracing::info!("Starting weatherpay-server on port {}", port);
    tracing::info!("Server identity: {:#x}", config.server_key.address());
    tracing::info!("Base URL: {}", config.base_url);
    tracing::info!("Payment service: {}", config.payment_service_url);
    tracing::info!(
        "Weather price: {} satoshis",
        weatherpay::WEATHER_PRICE_SATOSHIS
    );

    register_metrics().map_err(std::io::Error::other)?;

    let state = AppState::new(config).map_err(std::io::Error::other)?;
    let state_data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .app_data(web::PayloadConfig::new(64 * 1024))
            .wrap(Logger::default())
            .wrap(cors::build_cors())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
