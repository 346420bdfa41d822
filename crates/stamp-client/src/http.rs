//! Multipart HTTP transport for the stamping service
//!
//! Single stamp: `pdf`, `image`, `x`, `y`, `width`, `height`.
//! Multi-page stamp: `pdf`, `image`, `coordinates` (JSON array, page-ascending).

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use stamp_core::{
    GatewayError, MultiStampRequest, SingleStampRequest, SourceFile, StampGateway,
    StampedDocument,
};

use crate::config::GatewayConfig;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct HttpStampGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpStampGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn file_part(file: &SourceFile) -> Part {
        let part = Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string());
        match part.mime_str(file.content_type()) {
            Ok(part) => part,
            Err(_) => {
                tracing::warn!(
                    content_type = file.content_type(),
                    "unusable content type, sending without one"
                );
                Part::bytes(file.bytes().to_vec()).file_name(file.name().to_string())
            }
        }
    }

    fn base_form(pdf: &SourceFile, image: &SourceFile) -> Form {
        Form::new()
            .part("pdf", Self::file_part(pdf))
            .part("image", Self::file_part(image))
    }

    async fn send(&self, url: String, form: Form) -> Result<StampedDocument, GatewayError> {
        tracing::debug!(%url, "sending stamp request");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                body
            };
            tracing::warn!(%url, status = status.as_u16(), %message, "stamp request rejected");
            return Err(GatewayError::Stamp {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/pdf")
            .to_string();
        let bytes = response.bytes().await.map_err(classify)?.to_vec();

        tracing::info!(%url, bytes = bytes.len(), "received stamped document");
        Ok(StampedDocument {
            bytes,
            content_type,
        })
    }
}

/// Only a failed connect means the host is unreachable; a timeout or broken
/// body after connecting says nothing about reachability
fn classify(err: reqwest::Error) -> GatewayError {
    if let Some(status) = err.status() {
        return GatewayError::Stamp {
            status: status.as_u16(),
            message: err.to_string(),
        };
    }
    if err.is_connect() {
        GatewayError::Connectivity(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait]
impl StampGateway for HttpStampGateway {
    async fn health(&self) -> bool {
        let url = self.config.endpoint(&self.config.health_path);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::debug!(%url, error = %err, "health probe failed");
                false
            }
        }
    }

    async fn stamp_single(
        &self,
        request: &SingleStampRequest,
    ) -> Result<StampedDocument, GatewayError> {
        let coords = &request.coords;
        let form = Self::base_form(&request.pdf, &request.image)
            .text("x", coords.x.to_string())
            .text("y", coords.y.to_string())
            .text("width", coords.width.to_string())
            .text("height", coords.height.to_string());

        self.send(self.config.endpoint(&self.config.stamp_path), form)
            .await
    }

    async fn stamp_multi(
        &self,
        request: &MultiStampRequest,
    ) -> Result<StampedDocument, GatewayError> {
        let coordinates = serde_json::to_string(&request.coords)
            .map_err(|e| GatewayError::Transport(format!("encoding coordinates: {}", e)))?;
        let form = Self::base_form(&request.pdf, &request.image).text("coordinates", coordinates);

        self.send(self.config.endpoint(&self.config.multi_stamp_path), form)
            .await
    }
}
