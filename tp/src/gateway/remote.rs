//! Remote gateway over the entity REST API

use std::time::Duration;

use async_trait::async_trait;
use entitystore::{ProjectId, ProjectSnapshot, TaskDraft, TaskId, TaskSnapshot, TaskUpdate};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{EntityGateway, GatewayError};
use crate::config::GatewayConfig;

/// Gateway that calls the out-of-process entity API
///
/// Entity calls use the fixed short timeout from [`GatewayConfig`]; unlike
/// reasoning calls, a failure here propagates as a hard error.
pub struct HttpGateway {
    base_url: String,
    http: Client,
}

impl HttpGateway {
    /// Create a gateway from configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, message });
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl EntityGateway for HttpGateway {
    async fn get_task(&self, id: TaskId) -> Result<TaskSnapshot, GatewayError> {
        debug!(task_id = id, "get_task: remote");
        let response = self.http.get(self.url(&format!("tasks/{id}"))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::TaskNotFound(id));
        }
        Self::read_json(response).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<ProjectSnapshot, GatewayError> {
        debug!(project_id = id, "get_project: remote");
        let response = self.http.get(self.url(&format!("projects/{id}"))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::ProjectNotFound(id));
        }
        Self::read_json(response).await
    }

    async fn list_project_tasks(&self, id: ProjectId) -> Result<Vec<TaskSnapshot>, GatewayError> {
        debug!(project_id = id, "list_project_tasks: remote");
        let response = self
            .http
            .get(self.url("tasks"))
            .query(&[("project_id", id)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn create_tasks(&self, drafts: &[TaskDraft]) -> Result<Vec<TaskSnapshot>, GatewayError> {
        debug!(count = drafts.len(), "create_tasks: remote");
        let response = self
            .http
            .post(self.url("tasks/bulk"))
            .json(&serde_json::json!({ "tasks": drafts }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<TaskSnapshot, GatewayError> {
        debug!(task_id = id, "update_task: remote");
        let response = self.http.put(self.url(&format!("tasks/{id}"))).json(update).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::TaskNotFound(id));
        }
        Self::read_json(response).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), GatewayError> {
        debug!(task_id = id, "delete_task: remote");
        let response = self.http.delete(self.url(&format!("tasks/{id}"))).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::TaskNotFound(id));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
