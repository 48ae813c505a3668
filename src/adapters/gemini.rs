use crate::config::ApiSettings;
use crate::domain::ports::Analyzer;
use crate::utils::error::{BotError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Gemini `generateContent` adapter.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api: &ApiSettings, model: &str, api_key: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: api.gemini_base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl Analyzer for GeminiClient {
    fn generate(&self, prompt: &str) -> impl std::future::Future<Output = Result<String>> + Send {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{"text": prompt}]
                }
            ],
            "generationConfig": {
                "temperature": 0.1
            }
        });
        let http = self.http.clone();

        async move {
            let response = http.post(&url).json(&body).send().await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let text = response.text().await.unwrap_or_default();
                return Err(BotError::AnalysisError {
                    message: format!("Gemini API request failed (HTTP {}): {}", status, text),
                });
            }

            let parsed: GenerateContentResponse = response.json().await?;

            let text = parsed
                .candidates
                .unwrap_or_default()
                .into_iter()
                .flat_map(|candidate| {
                    candidate
                        .content
                        .and_then(|content| content.parts)
                        .unwrap_or_default()
                })
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("\n");

            if text.trim().is_empty() {
                return Err(BotError::AnalysisError {
                    message: "Gemini API returned no text content".to_string(),
                });
            }

            Ok(text)
        }
    }
}
