use serde_json::{Value, json};

use crate::GetField;

/// Speech-to-text collaborator. POSTs a voice note's data-URL to an
/// external endpoint and reads the transcript back out of its JSON.
#[derive(Debug, Clone)]
pub struct Transcriber {
    endpoint: String,
    http: reqwest::Client,
}

impl Transcriber {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn transcribe(&self, audio_data_url: &str) -> anyhow::Result<String> {
        let body: Value = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "audio": audio_data_url }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        body.get_str_field("transcript")
    }
}
