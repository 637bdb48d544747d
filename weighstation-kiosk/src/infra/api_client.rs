use reqwest::{Client, RequestBuilder, Response, header::CONTENT_TYPE};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};
use weighstation_config::ServerConfig;

use crate::error::{KioskError, KioskResult};
use crate::infra::api_types::ApiErrorBody;

/// HTTP client for the ticket backend.
///
/// Every failure is mapped into [`KioskError`] so callers can hand the
/// message straight to the operator.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiClient {
    /// Create a client for an already-normalised base URL.
    pub fn new(server: &ServerConfig) -> KioskResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = server.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(KioskError::network)?;

        info!(
            base_url = %server.base_url,
            "[ApiClient] Creating API client"
        );

        Ok(Self {
            client,
            base_url: server.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build an absolute URL for a backend route.
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let p = path.as_ref();
        if p.starts_with("http://") || p.starts_with("https://") {
            return p.to_string();
        }
        format!("{}/{}", self.base_url, p.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> KioskResult<R> {
        let url = self.build_url(path);
        self.execute(self.client.get(&url), &url).await
    }

    pub async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> KioskResult<R> {
        let url = self.build_url(path);
        self.execute(self.client.post(&url).json(body), &url).await
    }

    /// POST without a request body.
    pub async fn post_empty<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> KioskResult<R> {
        let url = self.build_url(path);
        self.execute(self.client.post(&url), &url).await
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> KioskResult<R> {
        let url = self.build_url(path);
        self.execute(self.client.delete(&url), &url).await
    }

    async fn execute<R: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> KioskResult<R> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|err| {
                debug!(url, error = %err, "[ApiClient] request failed");
                KioskError::network(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| KioskError::decode(status.as_u16(), err))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| KioskError::decode(status.as_u16(), err))
    }
}

/// Map a non-2xx response onto the error taxonomy.
///
/// JSON bodies with a non-empty `error` field become application errors
/// carrying the server's message; everything else is an opaque status error.
pub(crate) async fn error_from_response(response: Response) -> KioskError {
    let status = response.status().as_u16();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if !is_json {
        return KioskError::server_status(status);
    }

    match response.json::<ApiErrorBody>().await {
        Ok(ApiErrorBody {
            error: Some(message),
        }) if !message.trim().is_empty() => {
            KioskError::application(status, message)
        }
        _ => KioskError::server_status(status),
    }
}
