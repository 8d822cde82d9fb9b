use alloy::signers::local::PrivateKeySigner;

use crate::error::ClientError;

pub const DEFAULT_WEATHER_URL: &str = "http://localhost:3000/weather";
pub const DEFAULT_WALLET_URL: &str = "http://localhost:3321";

/// Signing key the agent acts with. Never logged.
#[derive(Clone)]
pub struct Credentials {
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity_key", &self.identity_key())
            .finish()
    }
}

impl Credentials {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// `0x`-prefixed lowercase address, as the server reports it.
    pub fn identity_key(&self) -> String {
        format!("{:#x}", self.signer.address())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub weather_url: String,
    pub wallet_url: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let key = get("CLIENT_PRIVATE_KEY").ok_or(ClientError::MissingConfig("CLIENT_PRIVATE_KEY"))?;
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|_| ClientError::InvalidKey("CLIENT_PRIVATE_KEY"))?;

        let weather_url = get("WEATHER_URL").unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string());
        url::Url::parse(&weather_url)
            .map_err(|e| ClientError::InvalidUrl(format!("WEATHER_URL: {e}")))?;

        let wallet_url = get("WALLET_URL").unwrap_or_else(|| DEFAULT_WALLET_URL.to_string());
        url::Url::parse(&wallet_url)
            .map_err(|e| ClientError::InvalidUrl(format!("WALLET_URL: {e}")))?;

        Ok(Self {
            credentials: Credentials::new(signer),
            weather_url,
            wallet_url: wallet_url.trim_end_matches('/').to_string(),
        })
    }
}
