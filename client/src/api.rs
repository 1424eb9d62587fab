//! HTTP client for the remote tabular base
//!
//! The base exposes its tables over a two-step REST API: an account API key
//! is exchanged for a short-lived base token plus the base's UUID, and row
//! reads then go through the dtable server under that UUID. All session
//! state lives in an explicit client value; there are no process globals.

use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use offerbook_core::RawRows;

/// Default public endpoint of the hosted base.
pub const DEFAULT_API_BASE: &str = "https://cloud.seatable.io";

/// Rows fetched per page. The server caps page size at 1000; 100 keeps
/// response latency flat on slow links.
const BATCH_SIZE: usize = 100;

/// Error type for store operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server replied with a non-success status
    #[error("Server error: {0}")]
    Server(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (snapshot cache)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Names of the four tables inside the base.
#[derive(Debug, Clone)]
pub struct TableNames {
    /// Applicant table.
    pub applicants: String,

    /// Datapoint table.
    pub datapoints: String,

    /// Program table.
    pub programs: String,

    /// Major table.
    pub majors: String,
}

impl Default for TableNames {
    fn default() -> Self {
        TableNames {
            applicants: "Applicants".to_string(),
            datapoints: "Datapoints".to_string(),
            programs: "Programs".to_string(),
            majors: "Majors".to_string(),
        }
    }
}

/// Client configuration for one base.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. [`DEFAULT_API_BASE`].
    pub api_base: String,

    /// Account API key authorizing access to the base.
    pub api_key: String,

    /// Timeout per request.
    pub timeout: Duration,

    /// Table names inside the base.
    pub tables: TableNames,
}

impl ClientConfig {
    /// Configuration with default timeout and table names.
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        ClientConfig {
            api_base: api_base.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            tables: TableNames::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
    dtable_uuid: String,
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct DownloadLink {
    download_link: String,
}

/// The four raw collections of one snapshot.
#[derive(Debug, Clone, Default)]
pub struct RawTables {
    /// Raw applicant rows.
    pub applicants: RawRows,

    /// Raw datapoint rows.
    pub datapoints: RawRows,

    /// Raw program rows.
    pub programs: RawRows,

    /// Raw major rows.
    pub majors: RawRows,
}

/// Authenticated client for one base.
#[derive(Debug)]
pub struct StoreClient {
    /// Configuration this client was built from.
    config: ClientConfig,

    /// HTTP client
    http: Client,

    /// Base token obtained from the key exchange.
    base_token: String,

    /// UUID of the base behind the token.
    base_uuid: String,
}

impl StoreClient {
    /// Exchange the API key for a base token and return a ready client.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let http = Client::new();
        let url = format!("{}/api/v2.1/dtable/app-access-token/", config.api_base);
        let response = http
            .get(&url)
            .timeout(config.timeout)
            .header("Accept", "application/json")
            .bearer_auth(&config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = response.text().await?;
            return Err(ClientError::Server(error));
        }

        let token: AccessToken = response.json().await?;
        debug!("connected to base {}", token.dtable_uuid);

        Ok(StoreClient {
            config,
            http,
            base_token: token.access_token,
            base_uuid: token.dtable_uuid,
        })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch every row of one table, keyed by row id.
    pub async fn fetch_rows(&self, table_name: &str) -> Result<RawRows> {
        let url = format!(
            "{}/dtable-server/api/v1/dtables/{}/rows",
            self.config.api_base, self.base_uuid
        );

        let mut rows = RawRows::new();
        let mut start = 0usize;
        loop {
            let start_param = start.to_string();
            let limit_param = BATCH_SIZE.to_string();
            let response = self
                .http
                .get(&url)
                .timeout(self.config.timeout)
                .header("Accept", "application/json")
                .bearer_auth(&self.base_token)
                .query(&[
                    ("table_name", table_name),
                    ("start", start_param.as_str()),
                    ("limit", limit_param.as_str()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                let error = response.text().await?;
                return Err(ClientError::Server(error));
            }

            let page: RowsPage = response.json().await?;
            let page_len = page.rows.len();
            for row in page.rows {
                match row.get("_id").and_then(Value::as_str) {
                    Some(id) => {
                        rows.insert(id.to_string(), row);
                    }
                    None => warn!("table {}: skipping row without _id", table_name),
                }
            }

            if page_len < BATCH_SIZE {
                break;
            }
            start += BATCH_SIZE;
        }

        debug!("fetched {} rows from {}", rows.len(), table_name);
        Ok(rows)
    }

    /// Fetch the four collections in table order.
    pub async fn fetch_all(&self) -> Result<RawTables> {
        Ok(RawTables {
            applicants: self.fetch_rows(&self.config.tables.applicants).await?,
            datapoints: self.fetch_rows(&self.config.tables.datapoints).await?,
            programs: self.fetch_rows(&self.config.tables.programs).await?,
            majors: self.fetch_rows(&self.config.tables.majors).await?,
        })
    }

    /// Resolve an asset path to a short-lived direct download link.
    ///
    /// This endpoint authenticates with the account API key, not the base
    /// token.
    pub async fn image_direct_url(&self, path: &str) -> Result<String> {
        let url = format!("{}/api/v2.1/dtable/app-download-link", self.config.api_base);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.timeout)
            .header("Accept", "application/json")
            .bearer_auth(&self.config.api_key)
            .query(&[("path", path)])
            .send()
            .await?;

        if !response.status().is_success() {
            let error = response.text().await?;
            return Err(ClientError::Server(error));
        }

        let link: DownloadLink = response.json().await?;
        Ok(link.download_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn connected_client(server: &mockito::ServerGuard) -> StoreClient {
        let config = ClientConfig::new(server.url(), "test-key");
        StoreClient::connect(config).await.unwrap()
    }

    async fn token_mock(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("GET", "/api/v2.1/dtable/app-access-token/")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(json!({"access_token": "base-token", "dtable_uuid": "uuid-1"}).to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_connect_exchanges_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_mock(&mut server).await;

        let client = connected_client(&server).await;
        mock.assert_async().await;
        assert_eq!(client.base_token, "base-token");
        assert_eq!(client.base_uuid, "uuid-1");
    }

    #[tokio::test]
    async fn test_connect_surfaces_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2.1/dtable/app-access-token/")
            .with_status(403)
            .with_body("bad key")
            .create_async()
            .await;

        let config = ClientConfig::new(server.url(), "wrong");
        let err = StoreClient::connect(config).await.unwrap_err();
        match err {
            ClientError::Server(msg) => assert_eq!(msg, "bad key"),
            other => panic!("expected Server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_rows_paginates() {
        let mut server = mockito::Server::new_async().await;
        token_mock(&mut server).await;

        let full_page: Vec<Value> = (0..BATCH_SIZE)
            .map(|i| json!({"_id": format!("r{:03}", i), "ID": "X"}))
            .collect();
        server
            .mock("GET", "/dtable-server/api/v1/dtables/uuid-1/rows")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("table_name".into(), "Programs".into()),
                mockito::Matcher::UrlEncoded("start".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(json!({ "rows": full_page }).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/dtable-server/api/v1/dtables/uuid-1/rows")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("table_name".into(), "Programs".into()),
                mockito::Matcher::UrlEncoded("start".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(json!({"rows": [{"_id": "last"}, {"no_id": true}]}).to_string())
            .create_async()
            .await;

        let client = connected_client(&server).await;
        let rows = client.fetch_rows("Programs").await.unwrap();

        // 100 from the first page, 1 from the second; the id-less row is
        // skipped.
        assert_eq!(rows.len(), BATCH_SIZE + 1);
        assert!(rows.contains_key("last"));
    }

    #[tokio::test]
    async fn test_image_direct_url() {
        let mut server = mockito::Server::new_async().await;
        token_mock(&mut server).await;
        server
            .mock("GET", "/api/v2.1/dtable/app-download-link")
            .match_query(mockito::Matcher::UrlEncoded(
                "path".into(),
                "/images/auto-upload/a.png".into(),
            ))
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(json!({"download_link": "https://files/a.png"}).to_string())
            .create_async()
            .await;

        let client = connected_client(&server).await;
        let link = client
            .image_direct_url("/images/auto-upload/a.png")
            .await
            .unwrap();
        assert_eq!(link, "https://files/a.png");
    }
}
