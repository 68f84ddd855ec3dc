//! Gateway-style HTTP uploader: the payload is POSTed as-is and the node
//! answers with a content id that the gateway serves under `{gateway}/{id}`.

use super::StorageUploader;
use crate::runtime::config::MinterConfig;
use crate::submission::ImageFile;
use anyhow::{anyhow, bail, Context, Result};
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const JSON_CONTENT_TYPE: &str = "application/json";
const FILE_NAME_HEADER: &str = "x-file-name";
const MAX_ERROR_BODY_CHARS: usize = 256;

#[derive(Debug, Deserialize)]
struct UploadReceipt {
    id: String,
}

#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
    upload_url: String,
    gateway_url: String,
}

impl HttpUploader {
    pub fn new(
        upload_url: impl Into<String>,
        gateway_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow!("failed to build storage HTTP client: {err}"))?;

        Ok(Self {
            client,
            upload_url: upload_url.into(),
            gateway_url: gateway_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub fn from_config(config: &MinterConfig) -> Result<Self> {
        Self::new(
            config.upload_url().to_owned(),
            config.gateway_url().to_owned(),
            config.rpc_timeout(),
        )
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    async fn post(
        &self,
        body: Vec<u8>,
        content_type: &str,
        file_name: Option<&str>,
    ) -> Result<String> {
        let size = body.len();
        let mut request = self
            .client
            .post(&self.upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        if let Some(name) = file_name {
            request = request.header(FILE_NAME_HEADER, name);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("storage upload to {} failed", self.upload_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            bail!("storage node rejected upload with status {status}: {body}");
        }

        let receipt: UploadReceipt = response
            .json()
            .await
            .context("storage node returned an unreadable upload receipt")?;
        let id = receipt.id.trim();
        if id.is_empty() {
            bail!("storage node returned an empty content id");
        }

        let uri = format!("{}/{}", self.gateway_url, id);
        tracing::debug!(bytes = size, content_type, %uri, "upload stored");
        Ok(uri)
    }
}

impl StorageUploader for HttpUploader {
    fn upload<'a>(&'a self, file: &'a ImageFile) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.post(
            file.bytes.clone(),
            &file.content_type,
            Some(file.file_name.as_str()),
        ))
    }

    fn upload_json<'a>(&'a self, document: &'a Value) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let body = serde_json::to_vec(document).context("failed to encode metadata JSON")?;
            self.post(body, JSON_CONTENT_TYPE, None).await
        })
    }
}
