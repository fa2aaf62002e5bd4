use crate::config::GatewayConfig;
use mediacore::AdapterError;
use reqwest::Url;
use serde_json::Value;

/// Thin HTTP client for the Gemini generative-media endpoints
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, AdapterError> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout());

        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|p| !p.is_empty()) {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => {
                    tracing::info!("Using proxy {}", proxy_url);
                    builder = builder.proxy(proxy);
                }
                Err(e) => tracing::warn!("Invalid proxy URL {}, connecting directly: {}", proxy_url, e),
            }
        }

        let http = builder
            .build()
            .map_err(|e| AdapterError::Transport(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config.gemini_api_key.clone(),
        })
    }

    /// `{base}/models/{model}:{method}`
    pub fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// `{base}/{resource}` for long-running operation names
    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value, AdapterError> {
        tracing::debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    pub async fn get_json(&self, url: &str) -> Result<Value, AdapterError> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    /// Fetch raw bytes from a provider file URI, following redirects
    pub async fn download(&self, uri: &str) -> Result<Vec<u8>, AdapterError> {
        let response = self
            .http
            .get(self.with_key(uri))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::upstream(
                status.as_u16(),
                upstream_message(status.as_u16(), &body),
            ));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    /// Append the API key as a query parameter unless the URI already has one
    pub fn with_key(&self, uri: &str) -> String {
        let mut url = match Url::parse(uri) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Download URI {} is not a valid URL: {}", uri, e);
                return uri.to_string();
            }
        };
        if !url.query_pairs().any(|(name, _)| name == "key") {
            url.query_pairs_mut().append_pair("key", &self.api_key);
        }
        url.into()
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, AdapterError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        tracing::warn!("Provider returned {}: {}", status, body);
        return Err(AdapterError::upstream(
            status.as_u16(),
            upstream_message(status.as_u16(), &body),
        ));
    }

    serde_json::from_str(&body)
        .map_err(|e| AdapterError::malformed(format!("Invalid JSON from provider: {}", e)))
}

fn transport_error(e: reqwest::Error) -> AdapterError {
    if e.is_timeout() {
        AdapterError::Transport(format!("request timed out: {}", e))
    } else {
        AdapterError::Transport(e.to_string())
    }
}

/// Best human-readable message for an error response body
pub fn upstream_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| "no response body".to_string());

    format!("provider returned {}: {}", status, detail)
}
