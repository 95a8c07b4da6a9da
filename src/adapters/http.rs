use crate::domain::model::ServerReply;
use crate::domain::ports::Transport;
use crate::utils::error::{CartError, Result};
use crate::utils::validation::resolve_endpoint;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Storefront transport over reqwest. Keeps a cookie store so the anonymous
/// cart held in the server session survives across requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<Url>,
    headers: HashMap<String, String>,
}

impl ReqwestTransport {
    pub fn new(
        base_url: Option<&str>,
        timeout: Option<Duration>,
        headers: HashMap<String, String>,
    ) -> Result<Self> {
        let base_url = match base_url {
            Some(raw) => Some(Url::parse(raw).map_err(|e| CartError::InvalidConfigValueError {
                field: "client.base_url".to_string(),
                value: raw.to_string(),
                reason: format!("Invalid URL format: {}", e),
            })?),
            None => None,
        };

        let mut builder = Client::builder().cookie_store(true);
        // 預設不設超時，與瀏覽器行為一致
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            headers,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<ServerReply> {
        let url = resolve_endpoint("endpoint", self.base_url.as_ref(), endpoint)?;
        tracing::debug!("📤 POST {} {}", url, body);

        let mut request = self
            .client
            .post(url.clone())
            .header("X-Requested-With", "XMLHttpRequest")
            .json(&body);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("📥 {} from {}: {}", status, url, text);

        // 非 JSON 回應視為沒有訊息
        let reply: ServerReply = serde_json::from_str(&text).unwrap_or_default();

        if status.is_success() {
            Ok(reply)
        } else {
            let message = reply.failure_message();
            tracing::warn!("⚠️ {} rejected the request ({}): {}", url, status, message);
            Err(CartError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}
