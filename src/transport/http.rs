use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};
use url::Url;
use crate::config::Config;
use crate::core::{ChunkRecord, ChunkTransport, Result, UploadError, UploadResponse};

/// 拼接 `{server_url}upload`，缺少结尾的 `/` 时自动补上
pub fn upload_endpoint(server_url: &str) -> Result<Url> {
    let mut base = Url::parse(server_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    Ok(base.join("upload")?)
}

/// 基于 HTTP JSON 的分片接收端客户端
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_options(server_url, &HashMap::new(), None)
    }

    pub fn with_options(
        server_url: &str,
        headers: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let endpoint = upload_endpoint(server_url)?;

        let mut header_map = HeaderMap::new();
        for (k, v) in headers {
            header_map.insert(
                HeaderName::from_str(k)?,
                HeaderValue::from_str(v)?
            );
        }

        // 未配置时沿用 reqwest 默认超时
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            headers: header_map,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_options(
            &config.server_url,
            &config.headers,
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn send_chunk(&self, chunk: &ChunkRecord) -> Result<UploadResponse> {
        let response = self.client
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(chunk)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Failed to upload chunk").to_string()
            } else {
                body
            };

            warn!(
                upload_id = %chunk.id,
                chunk_index = chunk.chunk_index,
                status = status.as_u16(),
                "receiver rejected chunk"
            );
            return Err(UploadError::server_error(status.as_u16(), message));
        }

        let body = response.bytes().await?;
        let parsed = serde_json::from_slice::<UploadResponse>(&body)
            .map_err(|err| UploadError::invalid_response(err.to_string()))?;

        debug!(
            upload_id = %chunk.id,
            chunk_index = chunk.chunk_index,
            complete = parsed.is_complete(),
            "receiver answered"
        );

        Ok(parsed)
    }
}
