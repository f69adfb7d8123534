//! Generation provider implementations.
//!
//! Concrete backends for the core [`Generator`] trait:
//! - **[`DisabledGenerator`]**: every call fails; answers that short-circuit
//!   (topics, not-found, category gate) still work.
//! - **[`OpenAIGenerator`]**: `POST /v1/chat/completions`.
//! - **[`OllamaGenerator`]**: `POST /api/generate` with `stream = false`.
//!
//! `deterministic = true` maps to temperature 0. `max_output_length` maps to
//! `max_tokens` (OpenAI) or `options.num_predict` (Ollama). One request per
//! call, no retry.

use anyhow::{bail, Result};
use async_trait::async_trait;
use news_rag_core::generation::Generator;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::embedding::DEFAULT_OLLAMA_URL;

// ============ Disabled Provider ============

/// A generator that always returns an error.
///
/// Used when `generation.provider = "disabled"`.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str, _max: usize, _deterministic: bool) -> Result<String> {
        bail!("Generation provider is disabled; set [generation].provider in the config")
    }
}

// ============ OpenAI Provider ============

/// Generator using the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIGenerator {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            api_key,
            client,
        })
    }

    fn request_body(&self, prompt: &str, max: usize, deterministic: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max,
        });
        if deterministic {
            body["temperature"] = serde_json::json!(0);
        }
        body
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max: usize, deterministic: bool) -> Result<String> {
        let body = self.request_body(prompt, max, deterministic);

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_openai_response(&json)
    }
}

fn parse_openai_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

// ============ Ollama Provider ============

/// Generator using a local Ollama instance.
pub struct OllamaGenerator {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn request_body(&self, prompt: &str, max: usize, deterministic: bool) -> serde_json::Value {
        let mut options = serde_json::json!({ "num_predict": max });
        if deterministic {
            options["temperature"] = serde_json::json!(0);
        }
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max: usize, deterministic: bool) -> Result<String> {
        let body = self.request_body(prompt, max, deterministic);

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url,
                    e
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_ollama_response(&json)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<String> {
    json.get("response")
        .and_then(|r| r.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))
}

/// Create the configured [`Generator`].
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledGenerator`] |
/// | `"openai"` | [`OpenAIGenerator`] |
/// | `"ollama"` | [`OllamaGenerator`] |
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    let generator: Box<dyn Generator> = match config.provider.as_str() {
        "disabled" => Box::new(DisabledGenerator),
        "openai" => Box::new(OpenAIGenerator::new(config)?),
        "ollama" => Box::new(OllamaGenerator::new(config)?),
        other => bail!("Unknown generation provider: {}", other),
    };
    tracing::info!(
        provider = %config.provider,
        model = generator.model_name(),
        "generation provider ready"
    );
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_config() -> GenerationConfig {
        GenerationConfig {
            provider: "ollama".into(),
            model: Some("llama3.2".into()),
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_generator_errors() {
        let gen = create_generator(&GenerationConfig::default()).unwrap();
        assert_eq!(gen.model_name(), "disabled");
        assert!(gen.generate("prompt", 10, true).await.is_err());
    }

    #[test]
    fn test_ollama_request_body() {
        let gen = OllamaGenerator::new(&ollama_config()).unwrap();
        let body = gen.request_body("hello", 300, true);
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 300);
        assert_eq!(body["options"]["temperature"], 0);

        let body = gen.request_body("hello", 300, false);
        assert!(body["options"].get("temperature").is_none());
    }

    #[test]
    fn test_openai_request_body_shape() {
        let gen = OpenAIGenerator {
            model: "gpt-4o-mini".into(),
            api_key: "test".into(),
            client: reqwest::Client::new(),
        };
        let body = gen.request_body("hi", 50, true);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["max_tokens"], 50);
        assert_eq!(body["temperature"], 0);
    }

    #[test]
    fn test_parse_responses() {
        let openai = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "Answer."}}]
        });
        assert_eq!(parse_openai_response(&openai).unwrap(), "Answer.");
        assert!(parse_openai_response(&serde_json::json!({"choices": []})).is_err());

        let ollama = serde_json::json!({"model": "llama3.2", "response": "Answer.", "done": true});
        assert_eq!(parse_ollama_response(&ollama).unwrap(), "Answer.");
        assert!(parse_ollama_response(&serde_json::json!({"done": true})).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let config = GenerationConfig {
            provider: "magic".into(),
            ..GenerationConfig::default()
        };
        assert!(create_generator(&config).is_err());
    }
}
