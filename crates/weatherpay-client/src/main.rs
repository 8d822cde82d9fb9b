use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weatherpay_client::{
    ClientConfig, FetchOutcome, HttpWallet, PaymentAgent, RequestOptions, WeatherSummary,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let agent = match PaymentAgent::new(HttpWallet::new(reqwest::Client::new(), &config.wallet_url)) {
        Ok(agent) => agent,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let options = RequestOptions::post().header("Content-Type", "application/json");
    let response = match agent
        .fetch_with_payment(&config.weather_url, &options, &config.credentials)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error occurred while fetching weather data.");
            std::process::exit(1);
        }
    };

    match response.outcome() {
        FetchOutcome::Success(payload) => match WeatherSummary::from_payload(&payload) {
            Some(summary) => println!("{summary}"),
            None => println!("{payload}"),
        },
        FetchOutcome::PaymentRequired { message, .. } => {
            eprintln!("{message}");
            std::process::exit(2);
        }
        FetchOutcome::Failed { status, message } => {
            eprintln!("Request failed ({status}): {message}");
            std::process::exit(1);
        }
    }
}
