//! OpenAI-compatible chat completions client.
//!
//! One client implements every AI capability. Each call is a single
//! `/chat/completions` request in JSON mode; the message content is parsed
//! into the capability's raw response type.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::prompts;
use super::{
    EvidenceJudge, EvidenceJudgment, ExtractedMemory, GeneratedMeaning, JudgeRequest,
    MemoryExtractor, MirrorRequest, TextGenerator,
};
use crate::error::AnalysisError;
use crate::onboarding::OnboardingAnswers;

/// `[ai]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize)]
struct ScoresEnvelope {
    scores: Vec<EvidenceJudgment>,
}

#[derive(Deserialize)]
struct MemoriesEnvelope {
    #[serde(default)]
    memories: Vec<ExtractedMemory>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorEnvelope {
    #[serde(alias = "mirror_feedback")]
    mirror_feedback: String,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    config: AiConfig,
    api_key: Option<String>,
    endpoint: Url,
    http_client: Client,
}

impl OpenAiClient {
    /// Create a client reading the API key from `config.api_key_env`.
    ///
    /// A missing key is not an error here; calls fail with
    /// [`AnalysisError::CredentialsNotConfigured`] instead.
    pub fn new(config: AiConfig) -> Result<Self, AnalysisError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: AiConfig, api_key: Option<String>) -> Result<Self, AnalysisError> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|u| u.join("chat/completions"))
            .map_err(|e| AnalysisError::Unreachable(format!("invalid base_url '{}': {e}", config.base_url)))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            api_key,
            endpoint,
            http_client,
        })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one system + user exchange and parse the reply as `T`.
    async fn chat_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: String,
    ) -> Result<T, AnalysisError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AnalysisError::CredentialsNotConfigured {
                env_var: self.config.api_key_env.clone(),
            })?;

        let body = json!({
            "model": &self.config.model,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let resp = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(text);
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let resp: Value = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::Malformed(format!("response is not JSON: {e}")))?;

        if let Some(err) = resp.get("error") {
            return Err(AnalysisError::Malformed(format!("API error: {err}")));
        }

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AnalysisError::Malformed("missing message content".into()))?;

        serde_json::from_str(strip_code_fence(content))
            .map_err(|e| AnalysisError::Malformed(format!("unexpected content shape: {e}")))
    }
}

/// Models occasionally wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate_meaning(
        &self,
        answers: &OnboardingAnswers,
    ) -> Result<GeneratedMeaning, AnalysisError> {
        self.chat_json(prompts::MEANING_SYSTEM, prompts::meaning_user(answers))
            .await
    }

    async fn generate_mirror_feedback(
        &self,
        request: &MirrorRequest<'_>,
    ) -> Result<String, AnalysisError> {
        let envelope: MirrorEnvelope = self
            .chat_json(prompts::MIRROR_SYSTEM, prompts::mirror_user(request))
            .await?;
        Ok(envelope.mirror_feedback)
    }
}

#[async_trait]
impl EvidenceJudge for OpenAiClient {
    async fn judge(
        &self,
        request: &JudgeRequest<'_>,
    ) -> Result<Vec<EvidenceJudgment>, AnalysisError> {
        let envelope: ScoresEnvelope = self
            .chat_json(prompts::SCORING_SYSTEM, prompts::scoring_user(request))
            .await?;
        Ok(envelope.scores)
    }
}

#[async_trait]
impl MemoryExtractor for OpenAiClient {
    async fn extract(&self, transcript: &str) -> Result<Vec<ExtractedMemory>, AnalysisError> {
        let envelope: MemoriesEnvelope = self
            .chat_json(prompts::EXTRACTION_SYSTEM, prompts::extraction_user(transcript))
            .await?;
        Ok(envelope.memories)
    }
}
