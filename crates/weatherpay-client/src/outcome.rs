use serde_json::Value;

use crate::agent::AgentResponse;

/// What the caller should do with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Value),
    /// 402, still unpaid after the agent's single retry.
    PaymentRequired {
        satoshis: Option<u64>,
        message: String,
    },
    Failed {
        status: u16,
        message: String,
    },
}

impl FetchOutcome {
    pub fn classify(response: &AgentResponse) -> Self {
        let text = |key: &str| {
            response
                .json_body
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        match response.status {
            200..=299 => FetchOutcome::Success(response.json_body.clone()),
            402 => FetchOutcome::PaymentRequired {
                satoshis: response.price_hint,
                message: text("message").unwrap_or_else(|| match response.price_hint {
                    Some(sats) => format!("Payment required: {sats} satoshis"),
                    None => "Payment required".to_string(),
                }),
            },
            status => FetchOutcome::Failed {
                status,
                message: text("error")
                    .or_else(|| text("message"))
                    .unwrap_or_else(|| format!("HTTP {status}")),
            },
        }
    }
}

/// The fields the client displays from a weather payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSummary {
    pub temp: f64,
    pub description: String,
    pub humidity: f64,
}

impl WeatherSummary {
    /// `None` unless `main.temp`, `main.humidity` and `weather[0].description` are all present.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let main = payload.get("main")?;
        Some(Self {
            temp: main.get("temp")?.as_f64()?,
            humidity: main.get("humidity")?.as_f64()?,
            description: payload
                .get("weather")?
                .get(0)?
                .get("description")?
                .as_str()?
                .to_string(),
        })
    }
}

impl std::fmt::Display for WeatherSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Temperature: {}°C", self.temp)?;
        writeln!(f, "Weather: {}", self.description)?;
        write!(f, "Humidity: {}%", self.humidity)
    }
}
