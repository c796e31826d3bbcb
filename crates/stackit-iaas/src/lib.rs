//! Typed Rust client for the STACKIT IaaS API.
//!
//! Covers the subset needed to manage machines for a node-lifecycle
//! controller: servers (create, get, delete, list by label) and network
//! interfaces (list per server, update allowed addresses).

pub mod auth;
mod types;

use std::sync::Arc;

pub use auth::{KeyCredentials, ServiceAccountKey};
pub use reqwest::StatusCode;
pub use types::*;

use auth::KeyFlow;

pub const DEFAULT_ENDPOINT: &str = "https://iaas.api.stackit.cloud";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://service-account.api.stackit.cloud/token";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("stackit api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("stackit api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("invalid service account key: {0}")]
    InvalidServiceAccountKey(#[source] serde_json::Error),

    #[error("service account key has no private key")]
    MissingPrivateKey,

    #[error("invalid service account private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),

    #[error("stackit token exchange failed: {0}")]
    Token(String),
}

impl Error {
    /// HTTP status of an API error response, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum Authentication {
    /// Send no credentials. For local backends and tests.
    None,
    ServiceAccountKey(ServiceAccountKey),
}

/// Client settings. Defaults to the public STACKIT endpoints.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub endpoint: String,
    pub token_endpoint: String,
    pub authentication: Authentication,
}

impl Configuration {
    pub fn new(authentication: Authentication) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            authentication,
        }
    }

    pub fn without_authentication() -> Self {
        Self::new(Authentication::None)
    }

    /// Parse a service-account key and use it for authentication.
    pub fn with_service_account_key(raw_key: &str) -> Result<Self> {
        let key = ServiceAccountKey::from_json(raw_key)?;
        Ok(Self::new(Authentication::ServiceAccountKey(key)))
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn token_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = token_endpoint.into();
        self
    }
}

/// Client for the STACKIT IaaS REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct IaasClient {
    base_url: String,
    http: reqwest::Client,
    key_flow: Option<Arc<KeyFlow>>,
}

impl IaasClient {
    /// Build a client. Key material is validated here; no network I/O
    /// happens until the first request.
    pub fn new(config: Configuration) -> Result<Self> {
        let http = reqwest::Client::new();

        let key_flow = match config.authentication {
            Authentication::None => None,
            Authentication::ServiceAccountKey(key) => Some(Arc::new(KeyFlow::new(
                key,
                config.token_endpoint,
                http.clone(),
            )?)),
        };

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            http,
            key_flow,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, project_id: &str, region: &str, path: &str) -> String {
        format!(
            "{}/v2/projects/{project_id}/regions/{region}{path}",
            self.base_url
        )
    }

    async fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.key_flow {
            Some(flow) => Ok(builder.bearer_auth(flow.access_token().await?)),
            None => Ok(builder),
        }
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                endpoint,
                status,
                body,
            });
        }
        Ok(resp)
    }

    // ── Servers ─────────────────────────────────────────────────────

    pub async fn create_server(
        &self,
        project_id: &str,
        region: &str,
        payload: &CreateServerPayload,
    ) -> Result<Server> {
        let resp = self
            .authorize(self.http.post(self.url(project_id, region, "/servers")))
            .await?
            .json(payload)
            .send()
            .await?;

        Self::check(resp, "create server")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn get_server(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<Server> {
        let resp = self
            .authorize(
                self.http
                    .get(self.url(project_id, region, &format!("/servers/{server_id}"))),
            )
            .await?
            .send()
            .await?;

        Self::check(resp, "get server")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    /// Delete a server. A 404 is returned as an API error like any other.
    pub async fn delete_server(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<()> {
        let resp = self
            .authorize(
                self.http
                    .delete(self.url(project_id, region, &format!("/servers/{server_id}"))),
            )
            .await?
            .send()
            .await?;

        Self::check(resp, "delete server").await?;
        Ok(())
    }

    /// List servers. `label_selector` uses the API's `key=value,...` form.
    pub async fn list_servers(
        &self,
        project_id: &str,
        region: &str,
        label_selector: Option<&str>,
    ) -> Result<ServerListResponse> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(selector) = label_selector {
            query.push(("label_selector", selector));
        }

        let resp = self
            .authorize(self.http.get(self.url(project_id, region, "/servers")))
            .await?
            .query(&query)
            .send()
            .await?;

        Self::check(resp, "list servers")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    // ── NICs ────────────────────────────────────────────────────────

    pub async fn list_server_nics(
        &self,
        project_id: &str,
        region: &str,
        server_id: &str,
    ) -> Result<NicListResponse> {
        let resp = self
            .authorize(
                self.http
                    .get(self.url(project_id, region, &format!("/servers/{server_id}/nics"))),
            )
            .await?
            .send()
            .await?;

        Self::check(resp, "list server nics")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }

    pub async fn update_nic(
        &self,
        project_id: &str,
        region: &str,
        network_id: &str,
        nic_id: &str,
        payload: &UpdateNicPayload,
    ) -> Result<Nic> {
        let resp = self
            .authorize(self.http.patch(self.url(
                project_id,
                region,
                &format!("/networks/{network_id}/nics/{nic_id}"),
            )))
            .await?
            .json(payload)
            .send()
            .await?;

        Self::check(resp, "update nic")
            .await?
            .json()
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard) -> IaasClient {
        IaasClient::new(Configuration::without_authentication().endpoint(server.url())).unwrap()
    }

    #[test]
    fn defaults_to_public_endpoints() {
        let config = Configuration::without_authentication();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_endpoint() {
        let client =
            IaasClient::new(Configuration::without_authentication().endpoint("http://iaas.local/"))
                .unwrap();
        assert_eq!(client.base_url(), "http://iaas.local");
    }

    #[tokio::test]
    async fn non_success_becomes_typed_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v2/projects/p1/regions/eu01/servers/missing")
            .with_status(404)
            .with_body(r#"{"code":404,"msg":"server not found"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .get_server("p1", "eu01", "missing")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("get server"));
        assert!(err.to_string().contains("server not found"));
    }

    #[tokio::test]
    async fn create_server_omits_unset_fields() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/v2/projects/p1/regions/eu01/servers")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "name": "worker-1",
                "machineType": "c1.2",
                "networking": { "networkId": "net-1" },
                "labels": {},
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"srv-1","name":"worker-1","status":"CREATING","machineType":"c1.2"}"#)
            .create_async()
            .await;

        let payload = CreateServerPayload {
            name: "worker-1".into(),
            machine_type: "c1.2".into(),
            networking: Some(ServerNetworking::Network {
                network_id: "net-1".into(),
            }),
            labels: Some(AttributeMap::new()),
            ..Default::default()
        };

        let created = client(&server)
            .create_server("p1", "eu01", &payload)
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(created.id.as_deref(), Some("srv-1"));
        assert_eq!(created.status.as_deref(), Some("CREATING"));
    }

    #[tokio::test]
    async fn list_servers_decodes_items() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/v2/projects/p1/regions/eu01/servers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[{"id":"srv-1","name":"a","status":"ACTIVE","labels":{"role":"worker","size":3}}]}"#,
            )
            .create_async()
            .await;

        let list = client(&server)
            .list_servers("p1", "eu01", None)
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(list.items.len(), 1);
        let labels = list.items[0].labels.as_ref().unwrap();
        assert_eq!(labels["size"], serde_json::json!(3));
    }

    #[tokio::test]
    async fn key_flow_token_is_sent_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let _token = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"tok-abc","expires_in":3600}"#)
            .create_async()
            .await;
        let m = server
            .mock("DELETE", "/v2/projects/p1/regions/eu01/servers/srv-1")
            .match_header("authorization", "Bearer tok-abc")
            .with_status(204)
            .create_async()
            .await;

        let key = serde_json::json!({
            "id": "key-id",
            "credentials": {
                "kid": "key-id",
                "iss": "sa@sa.stackit.cloud",
                "sub": "sa-uuid",
                "aud": "https://stackit-service-account-prod.apps.01.cf.eu01.stackit.cloud",
                "privateKey": include_str!("../tests/fixtures/test_rsa.pem"),
            }
        })
        .to_string();

        let config = Configuration::with_service_account_key(&key)
            .unwrap()
            .endpoint(server.url())
            .token_endpoint(format!("{}/token", server.url()));
        let client = IaasClient::new(config).unwrap();

        client.delete_server("p1", "eu01", "srv-1").await.unwrap();
        m.assert_async().await;
    }
}
