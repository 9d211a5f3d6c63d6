//! Rate-limit aware access to the Riot match API.
//!
//! Every call is a fresh request. A 429 response is retried after the
//! server-supplied `Retry-After` delay; any other non-success status fails
//! immediately with [`FetchError::Api`].

pub mod cache;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::models::{MatchId, MatchPayload, Puuid, RiotId};
use crate::storage::StorageError;

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Still rate limited after {attempts} attempts (last retry-after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64, attempts: u32 },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Content too large: {size} bytes (max {max_size})")]
    ContentTooLarge { size: usize, max_size: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache write failed: {0}")]
    Cache(#[from] StorageError),
}

/// Configuration for the match API client.
#[derive(Debug, Clone)]
pub struct RiotClientConfig {
    /// Regional routing host, e.g. `https://americas.api.riotgames.com`
    pub base_url: String,

    /// Sent as `X-Riot-Token`
    pub api_key: String,

    /// Request timeout
    pub timeout: Duration,

    /// Wait used when a 429 carries no `Retry-After`
    pub default_retry_after: Duration,

    /// Give up after this many consecutive 429s; `None` waits forever
    pub max_rate_limit_retries: Option<u32>,
}

impl RiotClientConfig {
    pub fn for_region(region: &str, api_key: impl Into<String>) -> Self {
        Self {
            base_url: regional_base_url(region),
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

impl Default for RiotClientConfig {
    fn default() -> Self {
        Self {
            base_url: regional_base_url("americas"),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
            default_retry_after: Duration::from_secs(10),
            max_rate_limit_retries: None,
        }
    }
}

/// Routing host for a region name such as `americas` or `europe`.
pub fn regional_base_url(region: &str) -> String {
    format!("https://{}.api.riotgames.com", region.trim().to_lowercase())
}

/// Match API endpoints used by the pipeline.
#[derive(Debug, Clone, Copy)]
pub enum Endpoint<'a> {
    /// Riot ID to PUUID lookup
    AccountByRiotId(&'a RiotId),

    /// Paginated match ids for a player
    MatchIds(&'a Puuid),

    /// Full match detail
    Match(&'a MatchId),

    /// Frame-by-frame match timeline
    Timeline(&'a MatchId),
}

impl Endpoint<'_> {
    fn path_segments(&self) -> Vec<&str> {
        match self {
            Endpoint::AccountByRiotId(id) => vec![
                "riot",
                "account",
                "v1",
                "accounts",
                "by-riot-id",
                id.game_name.as_str(),
                id.tag_line.as_str(),
            ],
            Endpoint::MatchIds(puuid) => {
                vec!["lol", "match", "v5", "matches", "by-puuid", puuid.as_str(), "ids"]
            }
            Endpoint::Match(id) => vec!["lol", "match", "v5", "matches", id.as_str()],
            Endpoint::Timeline(id) => {
                vec!["lol", "match", "v5", "matches", id.as_str(), "timeline"]
            }
        }
    }
}

/// The calls the ingestion pipeline makes against the match API.
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Resolve a Riot ID to its PUUID.
    async fn account_puuid(&self, riot_id: &RiotId) -> Result<Puuid, FetchError>;

    /// One page of match ids, newest first. An empty page means the history
    /// is exhausted.
    async fn match_ids(
        &self,
        puuid: &Puuid,
        start: u32,
        count: u32,
        start_time: Option<i64>,
    ) -> Result<Vec<MatchId>, FetchError>;

    /// Full detail document for one match.
    async fn match_detail(&self, id: &MatchId) -> Result<MatchPayload, FetchError>;

    /// Timeline document for one match.
    async fn match_timeline(&self, id: &MatchId) -> Result<serde_json::Value, FetchError>;
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    puuid: Puuid,
}

/// HTTP client for the Riot match API.
pub struct RiotClient {
    client: Client,
    base_url: Url,
    config: RiotClientConfig,
}

impl RiotClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RiotClientConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&config.api_key)
            .map_err(|_| FetchError::InvalidUrl("API key is not a valid header value".into()))?;
        headers.insert("X-Riot-Token", token);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Issue a GET and return the JSON body.
    pub async fn get(
        &self,
        endpoint: Endpoint<'_>,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, FetchError> {
        self.get_json(endpoint, params).await
    }

    /// Issue a GET and deserialize the JSON body into `T`.
    ///
    /// Rate-limit responses are waited out and the identical request is sent
    /// again.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint<'_>,
        params: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = self.endpoint_url(endpoint, params)?;
        let mut attempts = 0u32;

        loop {
            debug!("GET {}", url.path());
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                attempts += 1;
                let delay = retry_after(response.headers(), self.config.default_retry_after);

                if let Some(max) = self.config.max_rate_limit_retries {
                    if attempts > max {
                        return Err(FetchError::RateLimited {
                            retry_after_secs: delay.as_secs(),
                            attempts,
                        });
                    }
                }

                warn!(
                    "Rate limit hit on {}. Retrying after {} seconds.",
                    url.path(),
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Api {
                    status: status.as_u16(),
                    message: api_error_message(status, &body),
                });
            }

            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }
    }

    fn endpoint_url(
        &self,
        endpoint: Endpoint<'_>,
        params: &[(&str, String)],
    ) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FetchError::InvalidUrl(format!("{} cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty();
            segments.extend(endpoint.path_segments());
        }
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl MatchApi for RiotClient {
    async fn account_puuid(&self, riot_id: &RiotId) -> Result<Puuid, FetchError> {
        let account: AccountResponse = self
            .get_json(Endpoint::AccountByRiotId(riot_id), &[])
            .await?;
        Ok(account.puuid)
    }

    async fn match_ids(
        &self,
        puuid: &Puuid,
        start: u32,
        count: u32,
        start_time: Option<i64>,
    ) -> Result<Vec<MatchId>, FetchError> {
        let mut params = vec![("start", start.to_string()), ("count", count.to_string())];
        if let Some(ts) = start_time {
            params.push(("startTime", ts.to_string()));
        }
        self.get_json(Endpoint::MatchIds(puuid), &params).await
    }

    async fn match_detail(&self, id: &MatchId) -> Result<MatchPayload, FetchError> {
        self.get_json(Endpoint::Match(id), &[]).await
    }

    async fn match_timeline(&self, id: &MatchId) -> Result<serde_json::Value, FetchError> {
        self.get(Endpoint::Timeline(id), &[]).await
    }
}

/// Delay requested by a 429 response, in whole seconds.
fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Riot error bodies look like `{"status": {"message": "...", "status_code": 404}}`.
fn api_error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        status: ErrorStatus,
    }
    #[derive(Deserialize)]
    struct ErrorStatus {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.status.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the given raw HTTP responses, one per connection, in order.
    pub(super) async fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                loop {
                    let n = socket.read(&mut buf[read..]).await.unwrap();
                    read += n;
                    if n == 0 || buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        format!("http://{}", addr)
    }

    pub(super) fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            extra_headers,
            body
        )
    }

    fn test_client(base_url: String, max_retries: Option<u32>) -> RiotClient {
        RiotClient::new(RiotClientConfig {
            base_url,
            api_key: "RGAPI-test".to_string(),
            timeout: Duration::from_secs(5),
            default_retry_after: Duration::from_secs(0),
            max_rate_limit_retries: max_retries,
        })
        .unwrap()
    }

    #[test]
    fn test_regional_base_url() {
        assert_eq!(
            regional_base_url("Americas"),
            "https://americas.api.riotgames.com"
        );
    }

    #[test]
    fn test_riot_client_config_default() {
        let config = RiotClientConfig::default();
        assert_eq!(config.default_retry_after, Duration::from_secs(10));
        assert!(config.max_rate_limit_retries.is_none());
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            retry_after(&headers, Duration::from_secs(10)),
            Duration::from_secs(10)
        );

        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(
            retry_after(&headers, Duration::from_secs(10)),
            Duration::from_secs(3)
        );

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(
            retry_after(&headers, Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"status":{"message":"Data not found - match file not found","status_code":404}}"#;
        assert_eq!(
            api_error_message(StatusCode::NOT_FOUND, body),
            "Data not found - match file not found"
        );
        assert_eq!(
            api_error_message(StatusCode::FORBIDDEN, "<html>"),
            "Forbidden"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_segments_and_query() {
        let client = test_client("https://americas.api.riotgames.com".to_string(), None);
        let riot_id: RiotId = "Hide on bush#KR1".parse().unwrap();

        let url = client
            .endpoint_url(Endpoint::AccountByRiotId(&riot_id), &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://americas.api.riotgames.com/riot/account/v1/accounts/by-riot-id/Hide%20on%20bush/KR1"
        );

        let puuid = Puuid::from("abc");
        let url = client
            .endpoint_url(
                Endpoint::MatchIds(&puuid),
                &[("start", "0".into()), ("count", "100".into())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://americas.api.riotgames.com/lol/match/v5/matches/by-puuid/abc/ids?start=0&count=100"
        );
    }

    #[test]
    fn test_timeline_endpoint_path() {
        let id = MatchId::from("NA1_1");
        assert_eq!(
            Endpoint::Timeline(&id).path_segments().join("/"),
            "lol/match/v5/matches/NA1_1/timeline"
        );
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_until_success() {
        let base = serve(vec![
            http_response("429 Too Many Requests", "Retry-After: 0\r\n", "{}"),
            http_response("429 Too Many Requests", "", "{}"),
            http_response("200 OK", "", r#"["NA1_3","NA1_2"]"#),
        ])
        .await;
        let client = test_client(base, None);

        let ids = client
            .match_ids(&Puuid::from("p"), 0, 100, Some(1000))
            .await
            .unwrap();
        assert_eq!(ids, vec![MatchId::from("NA1_3"), MatchId::from("NA1_2")]);
    }

    #[tokio::test]
    async fn test_rate_limit_cap_gives_up() {
        let base = serve(vec![
            http_response("429 Too Many Requests", "Retry-After: 0\r\n", "{}"),
            http_response("429 Too Many Requests", "Retry-After: 0\r\n", "{}"),
        ])
        .await;
        let client = test_client(base, Some(1));

        let err = client
            .match_detail(&MatchId::from("NA1_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn test_non_success_status_fails_without_retry() {
        let base = serve(vec![http_response(
            "403 Forbidden",
            "",
            r#"{"status":{"message":"Forbidden","status_code":403}}"#,
        )])
        .await;
        let client = test_client(base, None);

        let err = client
            .account_puuid(&"Someone#NA1".parse().unwrap())
            .await
            .unwrap_err();
        match err {
            FetchError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Forbidden");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_account_lookup_parses_puuid() {
        let base = serve(vec![http_response(
            "200 OK",
            "",
            r#"{"puuid":"xyz-789","gameName":"Someone","tagLine":"NA1"}"#,
        )])
        .await;
        let client = test_client(base, None);

        let puuid = client
            .account_puuid(&"Someone#NA1".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(puuid, Puuid::from("xyz-789"));
    }
}
