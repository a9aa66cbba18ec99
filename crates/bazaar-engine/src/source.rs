//! # Configuration Sources
//!
//! Where delivery tiers and tax settings come from.
//!
//! A source only fetches raw JSON. Shape checks happen in
//! [`bazaar_core::payload`] once the loader has the value in hand, so every
//! source gets the same normalization for free.
//!
//! ## HTTP Layout
//! ```text
//!   GET {base_url}{delivery_path}   (default /delivery-charges)
//!   GET {base_url}{tax_path}        (default /tax-settings)
//!
//!   2xx + JSON body ──► Ok(Value)
//!   non-2xx         ──► EngineError::Status
//!   timeout         ──► EngineError::Timeout
//!   anything else   ──► EngineError::Transport / Serialization
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bazaar_core::ConfigKind;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ServiceSettings;
use crate::error::{EngineError, EngineResult};

/// Fetches raw rule payloads.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetches the payload for one rule set.
    async fn fetch(&self, kind: ConfigKind) -> EngineResult<Value>;
}

/// [`ConfigSource`] backed by the storefront's REST configuration service.
#[derive(Debug, Clone)]
pub struct HttpConfigSource {
    client: Client,
    base_url: Url,
    delivery_path: String,
    tax_path: String,
}

impl HttpConfigSource {
    /// Creates a source from the `[service]` settings.
    pub fn new(settings: &ServiceSettings) -> EngineResult<Self> {
        let base_url = Url::parse(&settings.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(HttpConfigSource {
            client,
            base_url,
            delivery_path: settings.delivery_path.clone(),
            tax_path: settings.tax_path.clone(),
        })
    }

    /// The URL fetched for `kind`.
    ///
    /// Paths are appended to the base URL as written, so a base of
    /// `https://api.example.com/v1` with `/tax-settings` gives
    /// `https://api.example.com/v1/tax-settings`.
    pub fn endpoint(&self, kind: ConfigKind) -> String {
        let path = match kind {
            ConfigKind::Delivery => &self.delivery_path,
            ConfigKind::Tax => &self.tax_path,
        };
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self, kind: ConfigKind) -> EngineResult<Value> {
        let url = self.endpoint(kind);
        debug!(%kind, %url, "Fetching rule payload");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                kind,
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> ServiceSettings {
        ServiceSettings {
            base_url: server.uri(),
            ..ServiceSettings::default()
        }
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let settings = ServiceSettings {
            base_url: "https://api.example.com/v1/".to_string(),
            ..ServiceSettings::default()
        };
        let source = HttpConfigSource::new(&settings).unwrap();

        assert_eq!(
            source.endpoint(ConfigKind::Delivery),
            "https://api.example.com/v1/delivery-charges"
        );
        assert_eq!(
            source.endpoint(ConfigKind::Tax),
            "https://api.example.com/v1/tax-settings"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let settings = ServiceSettings {
            base_url: "not a url".to_string(),
            ..ServiceSettings::default()
        };
        assert!(matches!(
            HttpConfigSource::new(&settings),
            Err(EngineError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetches_delivery_payload() {
        let server = MockServer::start().await;
        let body = json!({ "data": [{ "minWeight": 0, "maxWeight": null, "charge": 40 }] });
        Mock::given(method("GET"))
            .and(path("/delivery-charges"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpConfigSource::new(&settings_for(&server)).unwrap();
        let value = source.fetch(ConfigKind::Delivery).await.unwrap();
        assert_eq!(value, body);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tax-settings"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpConfigSource::new(&settings_for(&server)).unwrap();
        let err = source.fetch(ConfigKind::Tax).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Status {
                kind: ConfigKind::Tax,
                status: 503
            }
        ));
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tax-settings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let source = HttpConfigSource::new(&settings_for(&server)).unwrap();
        let err = source.fetch(ConfigKind::Tax).await.unwrap_err();
        assert!(!matches!(err, EngineError::Status { .. }));
    }
}
