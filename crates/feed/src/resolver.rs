//! Endpoint resolver client
//!
//! The resolver is an HTTP collaborator returning the node endpoints per
//! provider family. The core only consumes its GET contract; where the
//! URLs come from (env vars, a config service) is the resolver's business.

use serde::{Deserialize, Serialize};

use pricewall_core::{EndpointFamily, FeedError, FeedResult};

/// Wire shape of the resolver response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    #[serde(default)]
    pub http_url: Option<String>,
    #[serde(default)]
    pub ws_url: Option<String>,
    #[serde(default)]
    pub http_url_wld: Option<String>,
    // the deployed resolver spells this one without the camel hump
    #[serde(default, alias = "wsurlWld")]
    pub ws_url_wld: Option<String>,
}

/// Endpoints for one pair, resolved to its provider family.
#[derive(Debug, Clone)]
pub struct ResolvedEndpoints {
    pub http_url: String,
    /// Absent when the family has no push endpoint; the session falls
    /// back to polling.
    pub ws_url: Option<String>,
}

impl ResolvedEndpoints {
    pub fn from_config(config: &EndpointConfig, family: EndpointFamily) -> FeedResult<Self> {
        let (http, ws) = match family {
            EndpointFamily::Mainnet => (&config.http_url, &config.ws_url),
            EndpointFamily::WorldChain => (&config.http_url_wld, &config.ws_url_wld),
        };

        let http_url = http
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                FeedError::Configuration(format!("no http endpoint for {family}"))
            })?
            .to_string();

        let ws_url = ws
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(Self { http_url, ws_url })
    }
}

/// HTTP client for the resolver endpoint.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    url: String,
    client: reqwest::Client,
}

impl EndpointResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn resolve(&self, family: EndpointFamily) -> FeedResult<ResolvedEndpoints> {
        let config: EndpointConfig = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Configuration(format!("resolver unreachable: {e}")))?
            .json()
            .await
            .map_err(|e| FeedError::Configuration(format!("malformed resolver response: {e}")))?;

        ResolvedEndpoints::from_config(&config, family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolver_response_including_legacy_key() {
        let config: EndpointConfig = serde_json::from_str(
            r#"{
                "httpUrl": "https://rpc.example/http",
                "wsUrl": "wss://rpc.example/ws",
                "httpUrlWld": "https://wld.example/http",
                "wsurlWld": "wss://wld.example/ws"
            }"#,
        )
        .unwrap();

        let mainnet = ResolvedEndpoints::from_config(&config, EndpointFamily::Mainnet).unwrap();
        assert_eq!(mainnet.http_url, "https://rpc.example/http");
        assert_eq!(mainnet.ws_url.as_deref(), Some("wss://rpc.example/ws"));

        let wld = ResolvedEndpoints::from_config(&config, EndpointFamily::WorldChain).unwrap();
        assert_eq!(wld.http_url, "https://wld.example/http");
        assert_eq!(wld.ws_url.as_deref(), Some("wss://wld.example/ws"));
    }

    #[test]
    fn missing_or_empty_http_url_is_a_configuration_error() {
        let config: EndpointConfig =
            serde_json::from_str(r#"{"wsUrl": "wss://rpc.example/ws"}"#).unwrap();
        let err = ResolvedEndpoints::from_config(&config, EndpointFamily::Mainnet).unwrap_err();
        assert!(matches!(err, FeedError::Configuration(_)));

        let config: EndpointConfig =
            serde_json::from_str(r#"{"httpUrl": ""}"#).unwrap();
        assert!(ResolvedEndpoints::from_config(&config, EndpointFamily::Mainnet).is_err());
    }

    #[test]
    fn missing_ws_url_selects_polling_fallback() {
        let config: EndpointConfig =
            serde_json::from_str(r#"{"httpUrl": "https://rpc.example/http"}"#).unwrap();
        let resolved = ResolvedEndpoints::from_config(&config, EndpointFamily::Mainnet).unwrap();
        assert!(resolved.ws_url.is_none());
    }
}
