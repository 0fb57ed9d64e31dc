//! Compute provider bridge over a JSON/HTTP API
//!
//! Endpoints:
//! - `GET  /instances?tag_key=..&tag_value=..&state=..[&next_token=..]`
//! - `POST /instances/start` and `POST /instances/stop` with `{"instance_ids": [...]}`

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::http::{read_error, HttpEndpoint};
use super::{ComputeControl, ComputeInventory, InstancePage, InstanceQuery, ProviderError};
use crate::request::Action;

#[derive(Debug, Serialize)]
struct ChangeStateRequest<'a> {
    instance_ids: &'a [String],
}

/// Inventory and control client for the compute provider
#[derive(Debug, Clone)]
pub struct HttpCompute {
    endpoint: HttpEndpoint,
}

impl HttpCompute {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, ProviderError> {
        let endpoint = HttpEndpoint::new(base_url, timeout_ms)
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        Ok(Self { endpoint })
    }

    fn query_params(
        query: &InstanceQuery,
        next_token: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("tag_key", query.tag_key.clone()),
            ("tag_value", query.tag_value.clone()),
            ("state", query.state.as_str().to_string()),
        ];
        if let Some(token) = next_token {
            params.push(("next_token", token.to_string()));
        }
        params
    }

    fn action_path(action: Action) -> &'static str {
        match action {
            Action::Start => "/instances/start",
            Action::Stop => "/instances/stop",
        }
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::transport("Request timed out")
    } else {
        ProviderError::transport(e.to_string())
    }
}

#[async_trait]
impl ComputeInventory for HttpCompute {
    async fn describe_instances(
        &self,
        query: &InstanceQuery,
        next_token: Option<&str>,
    ) -> Result<InstancePage, ProviderError> {
        let url = self.endpoint.url("/instances");
        debug!("GET {} (state={})", url, query.state);

        let response = self
            .endpoint
            .client()
            .get(&url)
            .query(&Self::query_params(query, next_token))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let (_, detail) = read_error(response).await;
            return Err(ProviderError::new(detail.code, detail.message));
        }

        response
            .json::<InstancePage>()
            .await
            .map_err(|e| ProviderError::new("InvalidResponse", e.to_string()))
    }
}

#[async_trait]
impl ComputeControl for HttpCompute {
    async fn change_state(
        &self,
        instance_ids: &[String],
        action: Action,
    ) -> Result<(), ProviderError> {
        let url = self.endpoint.url(Self::action_path(action));
        let response = self
            .endpoint
            .client()
            .post(&url)
            .json(&ChangeStateRequest { instance_ids })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let (_, detail) = read_error(response).await;
            return Err(ProviderError::new(detail.code, detail.message));
        }

        info!("POST {} -> {} ({} instance(s))", url, status, instance_ids.len());
        Ok(())
    }
}
