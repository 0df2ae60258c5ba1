// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Classifier collaborator boundary
//!
//! The evaluation harness drives an externally hosted intent-detection
//! service through a single capability: an ordered batch of texts in, an
//! equally long ordered batch of predicted labels out. Everything behind
//! that seam (sessions, credentials, the wire protocol) belongs to the
//! collaborator, which keeps the core pipeline testable with a fake.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Label reported when the service cannot produce one for an item.
/// Substituting a sentinel instead of dropping the item keeps the
/// prediction sequence aligned with the input sequence.
pub const UNKNOWN_INTENT: &str = "UNKNOWN";

/// Capability required by the evaluation pipeline.
pub trait IntentClassifier {
    /// Classify each text, preserving order and cardinality:
    /// `result[i]` is the predicted label for `texts[i]`.
    fn classify_batch(&self, texts: &[String]) -> Result<Vec<String>>;
}

/// Administrative operations on the remote service, used by cleanup.
pub trait IntentAdmin {
    fn delete_intent(&self, intent_id: &str) -> Result<()>;
}

/// Connection settings for the remote service. The credentials path is
/// explicit configuration passed to the collaborator constructor, never
/// a process-wide constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL of the detect-intent service
    pub endpoint: String,
    /// Project/agent id on the remote service
    pub project_id: String,
    /// Session id shared across the run's requests
    pub session_id: String,
    /// Language code of the queries
    pub language_code: String,
    /// Service account credentials file (bearer token)
    pub credentials_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DetectIntentRequest<'a> {
    project_id: &'a str,
    session_id: &'a str,
    text: &'a str,
    language_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectIntentResponse {
    /// Display name of the detected intent; absent or empty when the
    /// service matched nothing.
    #[serde(default)]
    intent_display_name: Option<String>,
}

impl DetectIntentResponse {
    fn into_label(self) -> String {
        match self.intent_display_name {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_INTENT.to_string(),
        }
    }
}

/// Thin adapter for a detect-intent REST service. One blocking POST per
/// text, strictly sequential; transport and auth failures propagate
/// as-is, with no retry or backoff.
pub struct RestClassifier {
    config: ClassifierConfig,
    client: reqwest::blocking::Client,
    token: Option<String>,
}

impl RestClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let token = match &config.credentials_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read credentials file: {}", path.display()))?;
                Some(raw.trim().to_string())
            }
            None => None,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self {
            config,
            client,
            token,
        })
    }

    fn detect_intent(&self, text: &str) -> Result<String> {
        let request = DetectIntentRequest {
            project_id: &self.config.project_id,
            session_id: &self.config.session_id,
            text,
            language_code: &self.config.language_code,
        };

        let url = format!("{}/detect-intent", self.config.endpoint.trim_end_matches('/'));
        let mut builder = self.client.post(&url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().context("failed to send detect-intent request")?;
        if !response.status().is_success() {
            bail!("detect-intent request failed with status: {}", response.status());
        }

        let body: DetectIntentResponse = response
            .json()
            .context("failed to decode detect-intent response")?;
        Ok(body.into_label())
    }
}

impl IntentClassifier for RestClassifier {
    fn classify_batch(&self, texts: &[String]) -> Result<Vec<String>> {
        tracing::info!(
            "Classifying {} texts (session {})",
            texts.len(),
            self.config.session_id
        );

        let mut detected = Vec::with_capacity(texts.len());
        for text in texts {
            detected.push(self.detect_intent(text)?);
        }
        Ok(detected)
    }
}

impl IntentAdmin for RestClassifier {
    fn delete_intent(&self, intent_id: &str) -> Result<()> {
        let url = format!(
            "{}/intents/{}",
            self.config.endpoint.trim_end_matches('/'),
            intent_id
        );
        let mut builder = self.client.delete(&url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .with_context(|| format!("failed to send delete request for intent {}", intent_id))?;
        if !response.status().is_success() {
            bail!(
                "delete intent {} failed with status: {}",
                intent_id,
                response.status()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_with_display_name() {
        let body: DetectIntentResponse =
            serde_json::from_str(r#"{"intent_display_name": "GetWeather"}"#).unwrap();
        assert_eq!(body.into_label(), "GetWeather");
    }

    #[test]
    fn test_response_without_display_name_maps_to_unknown() {
        let body: DetectIntentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.into_label(), UNKNOWN_INTENT);

        let body: DetectIntentResponse =
            serde_json::from_str(r#"{"intent_display_name": ""}"#).unwrap();
        assert_eq!(body.into_label(), UNKNOWN_INTENT);
    }

    #[test]
    fn test_request_serialization() {
        let request = DetectIntentRequest {
            project_id: "newagent",
            session_id: "s-1",
            text: "will it rain",
            language_code: "en-US",
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""project_id":"newagent""#));
        assert!(json.contains(r#""text":"will it rain""#));
    }

    #[test]
    fn test_missing_credentials_file_is_fatal() {
        let config = ClassifierConfig {
            endpoint: "http://localhost:8080".to_string(),
            project_id: "newagent".to_string(),
            session_id: "s-1".to_string(),
            language_code: "en-US".to_string(),
            credentials_path: Some(PathBuf::from("/nonexistent/credentials.json")),
        };
        assert!(RestClassifier::new(config).is_err());
    }
}
