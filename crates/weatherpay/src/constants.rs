/// Path of the paid weather route.
pub const WEATHER_ROUTE: &str = "/weather";

/// Price of the weather route, in satoshis.
pub const WEATHER_PRICE_SATOSHIS: u64 = 333;

/// Price charged for any route the policy does not list.
pub const DEFAULT_PRICE_SATOSHIS: u64 = 100;

/// Base URL the server identifies as when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Settlement service used when `PAYMENT_SERVICE_URL` is unset.
pub const DEFAULT_PAYMENT_SERVICE_URL: &str = "https://staging-dojo.babbage.systems";

/// How old (or how far in the future) an identity assertion may be.
pub const DEFAULT_ASSERTION_MAX_AGE_SECS: i64 = 300;

/// Domain-separation prefix for client identity assertions.
pub const ASSERTION_DOMAIN: &str = "weatherpay-identity";

/// Domain-separation prefix for the server's acknowledgement signature.
pub const ACK_DOMAIN: &str = "weatherpay-identity-ack";

pub const IDENTITY_KEY_HEADER: &str = "X-Identity-Key";
pub const IDENTITY_NONCE_HEADER: &str = "X-Identity-Nonce";
pub const IDENTITY_TIMESTAMP_HEADER: &str = "X-Identity-Timestamp";
pub const IDENTITY_SIGNATURE_HEADER: &str = "X-Identity-Signature";

pub const SERVER_KEY_HEADER: &str = "X-Identity-Server-Key";
pub const SERVER_SIGNATURE_HEADER: &str = "X-Identity-Server-Signature";

/// Base64 JSON [`PaymentProof`](crate::payment::PaymentProof).
pub const PAYMENT_HEADER: &str = "X-Payment";

/// Price hint attached to every 402 response.
pub const PRICE_HINT_HEADER: &str = "X-Payment-Satoshis-Required";

/// Headers on server-to-settlement-service requests.
pub const SETTLEMENT_IDENTITY_HEADER: &str = "X-Server-Identity";
pub const SETTLEMENT_SIGNATURE_HEADER: &str = "X-Server-Signature";
