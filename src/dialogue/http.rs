use serde::{Deserialize, Serialize};

use super::{DialogueError, DialogueService, PatientRecordService, Reply};
use crate::config::IntakeConfig;
use crate::models::{PatientRecord, SessionId};

/// HTTP client for the intake backend's JSON API.
pub struct HttpDialogueClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpDialogueClient {
    pub fn new(config: &IntakeConfig) -> Result<Self, DialogueError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DialogueError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> DialogueError {
        if e.is_connect() {
            DialogueError::Network(format!("Could not connect to {}", self.base_url))
        } else if e.is_timeout() {
            DialogueError::Network(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            DialogueError::Network(e.to_string())
        }
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response, DialogueError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        check_status(response).await
    }

    async fn read_chat(&self, response: reqwest::Response) -> Result<Reply, DialogueError> {
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DialogueError::Protocol(e.to_string()))?;

        match parsed.next_question {
            Some(text) if !text.trim().is_empty() => Ok(Reply {
                text,
                stage: parsed.current_step,
            }),
            _ => Err(DialogueError::Protocol("missing next_question".into())),
        }
    }
}

/// Request body for /chat
#[derive(Serialize)]
struct ChatRequest<'a> {
    user_id: String,
    response: &'a str,
}

/// Request body for /force_diagnosis and /generate_summary
#[derive(Serialize)]
struct SessionRequest {
    user_id: String,
}

/// Response body from /chat and /force_diagnosis
#[derive(Deserialize)]
struct ChatResponse {
    next_question: Option<String>,
    current_step: Option<String>,
}

/// Response body from /generate_summary
#[derive(Deserialize)]
struct SummaryResponse {
    summary: Option<String>,
}

/// Turn a non-2xx response into `DialogueError::Service`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DialogueError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DialogueError::Service {
        status: status.as_u16(),
        detail: error_detail(status.as_u16(), &body),
    })
}

/// `detail` field of a JSON error body, else the body text, else a generic message.
fn error_detail(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) if !detail.is_empty() => return detail.clone(),
            Some(serde_json::Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    let body = body.trim();
    if body.is_empty() {
        format!("Server error: {status}")
    } else {
        body.to_string()
    }
}

impl DialogueService for HttpDialogueClient {
    async fn send_turn(&self, session: &SessionId, input: &str) -> Result<Reply, DialogueError> {
        let body = ChatRequest {
            user_id: session.to_string(),
            response: input,
        };
        let response = self.post("/chat", &body).await?;
        self.read_chat(response).await
    }

    async fn force_diagnosis(&self, session: &SessionId) -> Result<Reply, DialogueError> {
        let body = SessionRequest {
            user_id: session.to_string(),
        };
        let response = self.post("/force_diagnosis", &body).await?;
        self.read_chat(response).await
    }

    async fn generate_summary(&self, session: &SessionId) -> Result<String, DialogueError> {
        let body = SessionRequest {
            user_id: session.to_string(),
        };
        let response = self.post("/generate_summary", &body).await?;
        let parsed: SummaryResponse = response
            .json()
            .await
            .map_err(|e| DialogueError::Protocol(e.to_string()))?;

        parsed
            .summary
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| DialogueError::Protocol("missing summary".into()))
    }
}

impl PatientRecordService for HttpDialogueClient {
    async fn fetch_record(&self, session: &SessionId) -> Result<PatientRecord, DialogueError> {
        let url = format!("{}/user/{session}", self.base_url);
        tracing::debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| DialogueError::Protocol(e.to_string()))
    }
}
