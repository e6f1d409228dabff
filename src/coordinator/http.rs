use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use super::{
    CommandOutcome, CoordinatorError, SyncCommand, SyncCoordinator, CONFIG_PATH,
    CONFIG_SWITCH_PATH,
};
use crate::auth::BackendIdentity;
use crate::config::CoordinatorConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    current_config: String,
}

/// Coordinator reached over HTTP.
#[derive(Clone)]
pub struct HttpCoordinator {
    client: Client,
    base_url: String,
}

impl HttpCoordinator {
    pub fn new(config: &CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .timeout(Duration::from_secs(config.timeout_seconds as u64))
            .build()
            .map_err(|e| CoordinatorError::Client { source: e })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one of the coordinator's maintenance commands.
    pub async fn trigger(&self, command: SyncCommand) -> Result<CommandOutcome, CoordinatorError> {
        let endpoint = command.path();
        let response = self
            .client
            .post(self.url(endpoint))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| connection(endpoint, e))?;
        let response = ensure_success(endpoint, response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Err(CoordinatorError::UnexpectedContentType {
                endpoint: endpoint.to_string(),
                content_type,
            });
        }

        let body: Value = response.json().await.map_err(|e| decode(endpoint, e))?;
        let outcome = CommandOutcome::from_body(body);

        if outcome.success {
            tracing::info!(command = %command, message = ?outcome.message, "Coordinator command completed");
        } else {
            tracing::warn!(command = %command, error = ?outcome.message, "Coordinator command reported failure");
        }

        Ok(outcome)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SyncCoordinator for HttpCoordinator {
    async fn current_config(&self) -> Result<BackendIdentity, CoordinatorError> {
        let response = self
            .client
            .get(self.url(CONFIG_PATH))
            .send()
            .await
            .map_err(|e| connection(CONFIG_PATH, e))?;
        let response = ensure_success(CONFIG_PATH, response)?;

        let body: ConfigResponse = response.json().await.map_err(|e| decode(CONFIG_PATH, e))?;

        body.current_config
            .parse()
            .map_err(|_| CoordinatorError::UnknownIdentity(body.current_config))
    }

    async fn announce_switch(&self, identity: BackendIdentity) -> Result<(), CoordinatorError> {
        let response = self
            .client
            .post(self.url(CONFIG_SWITCH_PATH))
            .json(&serde_json::json!({ "config": identity.as_str() }))
            .send()
            .await
            .map_err(|e| connection(CONFIG_SWITCH_PATH, e))?;
        ensure_success(CONFIG_SWITCH_PATH, response)?;
        Ok(())
    }
}

fn ensure_success(endpoint: &str, response: Response) -> Result<Response, CoordinatorError> {
    let status = response.status();
    if !status.is_success() {
        return Err(CoordinatorError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn connection(endpoint: &str, source: reqwest::Error) -> CoordinatorError {
    CoordinatorError::Connection {
        endpoint: endpoint.to_string(),
        source,
    }
}

fn decode(endpoint: &str, source: reqwest::Error) -> CoordinatorError {
    CoordinatorError::Decode {
        endpoint: endpoint.to_string(),
        message: source.to_string(),
    }
}
