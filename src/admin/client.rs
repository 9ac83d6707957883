//! HTTP client for the Garage admin API

use crate::admin::types::{
    ApplyLayoutRequest, ConnectResult, HealthResponse, LayoutEntry, LayoutResponse, StatusResponse,
};
use crate::admin::AdminApi;
use crate::common::{host_port, BootstrapConfig, Error, LayoutStep, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

pub struct AdminClient {
    client: Client,
    scheme: String,
    port: u16,
    path_prefix: String,
    token: String,
}

impl AdminClient {
    pub fn new(config: &BootstrapConfig, token: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.admin_insecure_tls)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build admin client: {}", e)))?;

        Ok(Self {
            client,
            scheme: config.admin_scheme.clone(),
            port: config.admin_port,
            path_prefix: config.admin_path_prefix.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Endpoint URL on one node
    pub fn url(&self, address: &str, path: &str) -> String {
        format!(
            "{}://{}{}{}",
            self.scheme,
            host_port(address, self.port),
            self.path_prefix,
            path
        )
    }

    async fn send(&self, address: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| unreachable(address, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = body_text(address, response).await;
            return Err(unreachable(address, format!("{}: {}", status, body)));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, address: &str, path: &str) -> Result<T> {
        let request = self.client.get(self.url(address, path));
        self.send(address, request)
            .await?
            .json()
            .await
            .map_err(|e| unreachable(address, format!("malformed {} body: {}", path, e)))
    }

    /// Layout writes report `LayoutCommit` on any failure.
    async fn post_layout<B: serde::Serialize + ?Sized>(
        &self,
        address: &str,
        path: &str,
        step: LayoutStep,
        body: &B,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.url(address, path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::LayoutCommit {
                step,
                reason: format!("request to {} failed: {}", address, e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = body_text(address, response).await;
            return Err(Error::LayoutCommit {
                step,
                reason: format!("rejected by {}: {}: {}", address, status, body),
            });
        }
        Ok(())
    }
}

/// Response body for diagnostics; an unreadable body is logged and treated
/// as empty.
async fn body_text(address: &str, response: Response) -> String {
    match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(address, error = %e, "Unreadable admin response body");
            String::new()
        }
    }
}

fn unreachable(address: &str, reason: String) -> Error {
    Error::AdminUnreachable {
        address: address.to_string(),
        reason,
    }
}

impl AdminApi for AdminClient {
    async fn status(&self, address: &str) -> Result<StatusResponse> {
        self.get_json(address, "/status").await
    }

    async fn connect(&self, address: &str, peers: &[String]) -> Result<Vec<ConnectResult>> {
        let request = self.client.post(self.url(address, "/connect")).json(peers);
        let response = self.send(address, request).await?;

        // Older admin API versions reply without a per-peer body
        let text = body_text(address, response).await;
        match serde_json::from_str(&text) {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::debug!(address, error = %e, "Unparsed /connect reply");
                Ok(Vec::new())
            }
        }
    }

    async fn health(&self, address: &str) -> Result<HealthResponse> {
        self.get_json(address, "/health").await
    }

    async fn layout(&self, address: &str) -> Result<LayoutResponse> {
        self.get_json(address, "/layout").await
    }

    async fn stage_layout(&self, address: &str, entries: &[LayoutEntry]) -> Result<()> {
        self.post_layout(address, "/layout", LayoutStep::Stage, entries)
            .await
    }

    async fn apply_layout(&self, address: &str, version: u64) -> Result<()> {
        self.post_layout(
            address,
            "/layout/apply",
            LayoutStep::Apply,
            &ApplyLayoutRequest { version },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(scheme: &str, prefix: &str) -> BootstrapConfig {
        BootstrapConfig {
            service_name: "garage".into(),
            placement_label: "garage".into(),
            zone_label: "garage.zone".into(),
            capacity_label: "garage.capacity".into(),
            tags_label: "garage.tags".into(),
            admin_port: 3903,
            rpc_port: 3901,
            admin_token_file: PathBuf::from("/tok"),
            admin_scheme: scheme.into(),
            admin_path_prefix: prefix.into(),
            admin_insecure_tls: false,
            docker_host: "unix:///var/run/docker.sock".into(),
            poll_interval_ms: 2000,
            max_attempts: 150,
            request_timeout_secs: 30,
            probe_timeout_secs: 10,
            resolve_concurrency: 1,
        }
    }

    #[test]
    fn test_url_building() {
        let client = AdminClient::new(&config("https", ""), "t".into()).unwrap();
        assert_eq!(client.url("10.0.0.1", "/status"), "https://10.0.0.1:3903/status");
        assert_eq!(
            client.url("fd00::2", "/layout/apply"),
            "https://[fd00::2]:3903/layout/apply"
        );

        let client = AdminClient::new(&config("http", "/v1/"), "t".into()).unwrap();
        assert_eq!(client.url("node", "/health"), "http://node:3903/v1/health");
    }
}
