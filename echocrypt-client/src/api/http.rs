//! reqwest implementation of [`WatermarkApi`]

use super::{
    ApiError, EmbedRequest, EmbedResponse, ExtractRequest, ExtractResponse, SuggestResponse,
    UploadResponse, WatermarkApi,
};
use crate::assets::AudioFile;
use async_trait::async_trait;
use echocrypt_common::ClientConfig;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

const USER_AGENT: &str = concat!("EchoCrypt/", env!("CARGO_PKG_VERSION"));
const WAV_MIME: &str = "audio/wav";

/// HTTP client for the watermarking service
pub struct HttpWatermarkApi {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl HttpWatermarkApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn file_part(file: &AudioFile) -> Result<Part, ApiError> {
        Part::bytes(file.data().to_vec())
            .file_name(file.name().to_string())
            .mime_str(WAV_MIME)
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        let url = self.config.endpoint(path);
        tracing::debug!(url = %url, "POST multipart");

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }
}

/// Decode a JSON body, mapping non-success statuses to [`ApiError::Status`]
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ApiError::from_error_body(status.as_u16(), &error_text));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl WatermarkApi for HttpWatermarkApi {
    async fn suggest(&self, size_bytes: u64) -> Result<SuggestResponse, ApiError> {
        let url = self.config.endpoint("/suggest");
        tracing::debug!(size_bytes, "Requesting bit depth suggestion");

        let response = self
            .http_client
            .get(&url)
            .query(&[("size", size_bytes)])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }

    async fn upload(&self, file: &AudioFile) -> Result<UploadResponse, ApiError> {
        let form = Form::new().part("file", Self::file_part(file)?);
        let upload: UploadResponse = self.post_form("/upload", form).await?;

        tracing::info!(
            file_id = %upload.file_id,
            file_name = %file.name(),
            size_bytes = file.size(),
            "Upload accepted"
        );

        Ok(upload)
    }

    async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, ApiError> {
        let form = Form::new()
            .text("file_id", request.file_id.clone())
            .text("message", request.message.clone())
            .text("playfair_key", request.cipher_keyword.clone())
            .text("railfence_key", request.transposition_depth.to_string())
            .text("bits_per_sample", request.bit_depth.to_string());

        self.post_form("/embed", form).await
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResponse, ApiError> {
        let form = Form::new()
            .part("file", Self::file_part(&request.file)?)
            .text("playfair_key", request.cipher_keyword.clone())
            .text("railfence_key", request.transposition_depth.to_string())
            .text("bits_per_sample", request.bit_depth.to_string());

        self.post_form("/extract", form).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(url = %url, "Downloading audio");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_error_body(status.as_u16(), &error_text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}
