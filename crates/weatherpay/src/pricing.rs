use std::collections::HashMap;

use crate::constants::{DEFAULT_PRICE_SATOSHIS, WEATHER_PRICE_SATOSHIS, WEATHER_ROUTE};

/// Maps a route path to the price, in satoshis, a request must pay.
///
/// Lookup is exact on the path with any query string removed. Paths the policy
/// does not list fall back to the default price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricePolicy {
    routes: HashMap<String, u64>,
    default_price: u64,
}

/// Builder for a [`PricePolicy`] with several priced routes.
#[derive(Debug, Clone)]
pub struct PricePolicyBuilder {
    routes: HashMap<String, u64>,
    default_price: u64,
}

impl PricePolicyBuilder {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            default_price: DEFAULT_PRICE_SATOSHIS,
        }
    }

    /// Register a fixed price for `path` (e.g. `route("/weather", 333)`).
    pub fn route(mut self, path: &str, satoshis: u64) -> Self {
        self.routes.insert(path.to_string(), satoshis);
        self
    }

    /// Override the price for unlisted routes.
    pub fn default_price(mut self, satoshis: u64) -> Self {
        self.default_price = satoshis;
        self
    }

    pub fn build(self) -> PricePolicy {
        PricePolicy {
            routes: self.routes,
            default_price: self.default_price,
        }
    }
}

impl Default for PricePolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PricePolicy {
    /// `/weather` at 333 satoshis, everything else at 100.
    pub fn reference() -> Self {
        PricePolicyBuilder::new()
            .route(WEATHER_ROUTE, WEATHER_PRICE_SATOSHIS)
            .default_price(DEFAULT_PRICE_SATOSHIS)
            .build()
    }

    /// Required price for a request path.
    pub fn price_for(&self, path: &str) -> u64 {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        self.routes
            .get(path)
            .copied()
            .unwrap_or(self.default_price)
    }

    pub fn default_price(&self) -> u64 {
        self.default_price
    }
}

impl Default for PricePolicy {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_route_costs_333() {
        assert_eq!(PricePolicy::reference().price_for("/weather"), 333);
    }

    #[test]
    fn unknown_route_gets_default() {
        let policy = PricePolicy::reference();
        assert_eq!(policy.price_for("/forecast"), 100);
        assert_eq!(policy.price_for("/"), 100);
        assert_eq!(policy.price_for(""), 100);
    }

    #[test]
    fn query_string_does_not_change_price() {
        let policy = PricePolicy::reference();
        assert_eq!(policy.price_for("/weather?id=5746545"), 333);
        assert_eq!(policy.price_for("/weather?"), 333);
    }

    #[test]
    fn matching_is_exact() {
        let policy = PricePolicy::reference();
        assert_eq!(policy.price_for("/weather/"), 100);
        assert_eq!(policy.price_for("/Weather"), 100);
        assert_eq!(policy.price_for("/weather/extra"), 100);
    }

    #[test]
    fn lookup_is_stable() {
        let policy = PricePolicy::reference();
        let first = policy.price_for("/weather");
        for _ in 0..10 {
            assert_eq!(policy.price_for("/weather"), first);
        }
    }

    #[test]
    fn builder_multiple_routes() {
        let policy = PricePolicyBuilder::new()
            .route("/weather", 333)
            .route("/forecast", 1_000)
            .route("/free", 0)
            .default_price(7)
            .build();

        assert_eq!(policy.price_for("/weather"), 333);
        assert_eq!(policy.price_for("/forecast"), 1_000);
        assert_eq!(policy.price_for("/free"), 0);
        assert_eq!(policy.price_for("/other"), 7);
        assert_eq!(policy.default_price(), 7);
    }

    #[test]
    fn empty_builder_prices_everything_at_default() {
        let policy = PricePolicyBuilder::new().build();
        assert_eq!(policy.price_for("/weather"), DEFAULT_PRICE_SATOSHIS);
    }
}
