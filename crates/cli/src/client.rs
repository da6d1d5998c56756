//! API client for a running prediction app

use anyhow::{Context, Result};
use predict_lib::predictor::RawValues;
use predict_lib::{FeatureSchema, PredictionResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the app's JSON endpoints
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        self.send(self.client.get(url)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path)?;
        self.send(self.client.post(url).json(body)).await
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid path '{}'", path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach app at {}", self.base_url))?;
        tracing::debug!(status = %response.status(), url = %response.url(), "Response received");
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(ErrorResponse {
                    error,
                    remediation: Some(hint),
                }) => anyhow::bail!("API error ({}): {}\n{}", status, error, hint),
                Ok(ErrorResponse { error, .. }) => anyhow::bail!("API error ({}): {}", status, error),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, features: RawValues) -> Result<RemotePrediction> {
        self.post("api/v1/predict", &PredictRequest { features }).await
    }

    pub async fn schema(&self) -> Result<SchemaInfo> {
        self.get("api/v1/schema").await
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: RawValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemotePrediction {
    pub headline: String,
    #[serde(flatten)]
    pub result: PredictionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub app: String,
    pub title: String,
    pub model_ready: bool,
    pub schema: FeatureSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}
