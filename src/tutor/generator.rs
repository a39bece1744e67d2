use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TutorConfig;

/// External text-generation capability: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Calls a JSON endpoint that accepts `{model, prompt}` and answers `{text}`.
/// The API key never leaves the server.
#[derive(Clone)]
pub struct HttpTextGenerator {
    client: reqwest::Client,
    config: TutorConfig,
}

impl HttpTextGenerator {
    pub fn new(config: TutorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("build tutor http client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let mut req = self.client.post(&self.config.endpoint).json(&GenerateRequest {
            model: &self.config.model,
            prompt,
        });
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.context("tutor request")?;
        let status = res.status();
        anyhow::ensure!(status.is_success(), "tutor endpoint answered {status}");
        let body: GenerateResponse = res.json().await.context("decode tutor response")?;
        Ok(body.text)
    }
}
