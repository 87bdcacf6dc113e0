use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::errors::ApiError;

/// Transport client for the TaskMaster backend.
///
/// Owns a reqwest client with an enabled cookie store, so the `_cookie`
/// session credential set by `/authenticate` rides along on every later
/// request automatically. Two normalization rules apply to every response:
/// a non-2xx status becomes `ApiError::Status` without reading the body, and
/// an empty 2xx body decodes as the empty JSON object.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = cfg.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|_| ApiError::BadBaseUrl {
            url: base_url.clone(),
        })?;

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(cfg.request_timeout)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `base_url + path`, decoding the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        tracing::debug!(path, "GET");
        let resp = self.http.get(self.url(path)).send().await?;
        Self::decode(resp).await
    }

    /// POST `base_url + path` with a JSON body, decoding the response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(path, "POST");
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        let body = if text.trim().is_empty() { "{}" } else { &text };
        serde_json::from_str(body).map_err(ApiError::Decode)
    }
}
