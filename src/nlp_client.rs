/// Urgency classifier client
///
/// Thin HTTP client for the external NLP service that labels a new task
/// urgent or normal. Callers treat failures as non-fatal and fall back
/// to normal urgency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct NlpClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    category: &'a str,
    description: &'a str,
    due_date: String,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    urgency: String,
}

impl NlpClient {
    pub fn new(base_url: String, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    /// Ask the classifier for the urgency of a task. Returns the raw
    /// label ("urgent" or "normal").
    pub async fn classify_urgency(
        &self,
        category: &str,
        description: &str,
        due_date: DateTime<Utc>,
    ) -> Result<String, String> {
        let url = format!("{}/classify", self.base_url);
        let request = ClassifyRequest {
            category,
            description,
            due_date: due_date.to_rfc3339(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Failed to reach classifier: {}", e))?
            .error_for_status()
            .map_err(|e| format!("Classifier returned error: {}", e))?
            .json::<ClassifyResponse>()
            .await
            .map_err(|e| format!("Invalid classifier response: {}", e))?;

        Ok(response.urgency)
    }
}
