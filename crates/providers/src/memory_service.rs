//! Hosted conversational memory client (mem0-style v1 REST API).
//!
//! - `POST {base}/v1/memories/search/` with `{query, user_id, agent_id?, limit}`
//! - `POST {base}/v1/memories/` with `{messages, user_id, agent_id?}`
//!
//! Requests authenticate with `Authorization: Token <key>`.

use async_trait::async_trait;
use hubblet_core::error::MemoryError;
use hubblet_core::memory::{MemoryQuery, MemoryRecord, MemoryService, MemoryWrite};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub struct HostedMemoryClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HostedMemoryClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: crate::http_client(),
        }
    }

    fn search_body(query: &MemoryQuery) -> SearchBody<'_> {
        SearchBody {
            query: &query.text,
            user_id: &query.user_id,
            agent_id: query.agent_id.as_deref(),
            limit: query.limit,
        }
    }

    fn add_body(write: &MemoryWrite) -> AddBody<'_> {
        AddBody {
            messages: write
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            user_id: &write.user_id,
            agent_id: write.agent_id.as_deref(),
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<reqwest::Response, String> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Memory service returned error");
            return Err(format!("HTTP {}: {error_body}", status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl MemoryService for HostedMemoryClient {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn search(
        &self,
        query: MemoryQuery,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError> {
        debug!(
            user_id = %query.user_id,
            agent_id = ?query.agent_id,
            limit = query.limit,
            "Searching memory service"
        );

        let response = self
            .post("/v1/memories/search/", &Self::search_body(&query))
            .await
            .map_err(MemoryError::SearchFailed)?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::SearchFailed(format!("Failed to parse response: {e}")))?;

        Ok(parsed.into_records())
    }

    async fn add(&self, write: MemoryWrite) -> std::result::Result<(), MemoryError> {
        debug!(
            user_id = %write.user_id,
            agent_id = ?write.agent_id,
            messages = write.messages.len(),
            "Adding exchange to memory service"
        );

        self.post("/v1/memories/", &Self::add_body(&write))
            .await
            .map_err(MemoryError::AddFailed)?;
        Ok(())
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<&'a str>,
    limit: usize,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AddBody<'a> {
    messages: Vec<ApiMessage<'a>>,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<&'a str>,
}

/// Search replies come either as a bare list or wrapped in `{results: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    List(Vec<MemoryRecord>),
    Wrapped { results: Vec<MemoryRecord> },
}

impl SearchResponse {
    fn into_records(self) -> Vec<MemoryRecord> {
        match self {
            SearchResponse::List(records) => records,
            SearchResponse::Wrapped { results } => results,
        }
    }
}
