//! GraphQL-over-HTTP content backend
//!
//! Posts `{ query, variables }` documents to a single endpoint and maps the
//! `data` / `errors` envelope onto [`BackendError`].

use crate::backend::{ContentBackend, TaskAck};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::types::{DocumentRef, VersionId};
use crate::version::{GenerationPayload, Version};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SUBMIT_GENERATION: &str = r#"
mutation GenerateContent($input: GenerateContentInput!) {
  generateContent(input: $input) { taskId }
}"#;

const FETCH_VERSIONS: &str = r#"
query DocumentVersions($parentId: ID!, $documentKind: String!, $sceneKey: String) {
  documentVersions(parentId: $parentId, documentKind: $documentKind, sceneKey: $sceneKey) {
    id versionNumber versionLabel textSeed textContent textNotes
    characterCount createdAt createdBy llmModel
  }
}"#;

const FETCH_LATEST_POINTER: &str = r#"
query LatestVersionPointer($parentId: ID!, $documentKind: String!, $sceneKey: String) {
  latestVersionPointer(parentId: $parentId, documentKind: $documentKind, sceneKey: $sceneKey) {
    latestVersionId
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentData {
    generate_content: TaskAck,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentVersionsData {
    document_versions: Vec<Version>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestPointerData {
    latest_version_pointer: Option<LatestPointer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestPointer {
    latest_version_id: Option<VersionId>,
}

fn map_http_error(error: reqwest::Error) -> BackendError {
    if let Some(status) = error.status() {
        if status.is_server_error() {
            BackendError::Transport(format!("Server error {}: {}", status, error))
        } else {
            BackendError::Rejected(format!("Request failed with status {}: {}", status, error))
        }
    } else if error.is_timeout() {
        BackendError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        BackendError::Transport(format!("Connection error: {}", error))
    } else {
        BackendError::Transport(format!("HTTP error: {}", error))
    }
}

/// Unwrap a GraphQL envelope: any `errors` entry rejects the request.
fn unwrap_envelope<T>(envelope: GraphqlEnvelope<T>) -> Result<T, BackendError> {
    if !envelope.errors.is_empty() {
        let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(BackendError::Rejected(messages.join("; ")));
    }
    envelope
        .data
        .ok_or_else(|| BackendError::InvalidResponse("Response has no data".to_string()))
}

fn document_variables(document: &DocumentRef) -> Value {
    json!({
        "parentId": document.parent_id,
        "documentKind": document.kind.as_str(),
        "sceneKey": document.scene_key,
    })
}

/// HTTP content backend client
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, BackendError> {
        debug!(operation, endpoint = %self.endpoint, "Sending backend request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(if status.is_server_error() {
                BackendError::Transport(format!("{} failed with {}: {}", operation, status, error_text))
            } else {
                BackendError::Rejected(format!("{} failed with {}: {}", operation, status, error_text))
            });
        }

        let envelope: GraphqlEnvelope<T> = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse {} response: {}", operation, e))
        })?;
        unwrap_envelope(envelope)
    }
}

#[async_trait]
impl ContentBackend for HttpBackend {
    async fn submit_generation(
        &self,
        document: &DocumentRef,
        payload: &GenerationPayload,
    ) -> Result<TaskAck, BackendError> {
        let mut input = document_variables(document);
        if let (Value::Object(input), Ok(Value::Object(fields))) =
            (&mut input, serde_json::to_value(payload))
        {
            input.extend(fields);
        }
        let data: GenerateContentData = self
            .execute("generateContent", SUBMIT_GENERATION, json!({ "input": input }))
            .await?;
        Ok(data.generate_content)
    }

    async fn fetch_versions(&self, document: &DocumentRef) -> Result<Vec<Version>, BackendError> {
        let data: DocumentVersionsData = self
            .execute("documentVersions", FETCH_VERSIONS, document_variables(document))
            .await?;
        Ok(data.document_versions)
    }

    async fn fetch_latest_pointer(
        &self,
        document: &DocumentRef,
    ) -> Result<Option<VersionId>, BackendError> {
        let data: LatestPointerData = self
            .execute(
                "latestVersionPointer",
                FETCH_LATEST_POINTER,
                document_variables(document),
            )
            .await?;
        Ok(data.latest_version_pointer.and_then(|p| p.latest_version_id))
    }
}
