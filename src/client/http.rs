use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{ClientError, QueueBackend};
use crate::alerts::{AlertRule, NewAlert};
use crate::api::handlers::{
    AlertsResponse, ErrorResponse, MessagesResponse, NewMessage, PostMessagesRequest,
    PostMessagesResponse,
};
use crate::data::{Message, QueueStats};

/// Client for a queuewatch server
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Like [`HttpBackend::try_with_timeout`], falling back to a client
    /// without a timeout if the configured one cannot be built
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        match Self::try_with_timeout(base_url.clone(), timeout) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!(error = %e, ?timeout, "Using HTTP client without timeout");
                Self {
                    http_client: reqwest::Client::new(),
                    base_url,
                }
            }
        }
    }

    pub fn try_with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Build `<base>/queues/<queue>/<rest...>` with each segment escaped
    fn url(&self, queue: &str, rest: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Transport(format!("Invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::Transport(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .push("queues")
            .push(queue)
            .extend(rest);

        Ok(url)
    }

    /// Check if the server is healthy
    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Fetch name, size, reservation and alert counts of a queue
    pub async fn queue_stats(&self, queue: &str) -> Result<QueueStats, ClientError> {
        let url = self.url(queue, &[])?;
        self.send(self.http_client.get(url)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(if status == StatusCode::NOT_FOUND {
                ClientError::NotFound(message)
            } else {
                ClientError::Remote {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Deserialization(e.to_string()))
    }
}

#[async_trait]
impl QueueBackend for HttpBackend {
    async fn post(&self, queue: &str, bodies: Vec<String>) -> Result<Vec<String>, ClientError> {
        let request = PostMessagesRequest {
            messages: bodies.into_iter().map(|body| NewMessage { body }).collect(),
        };
        let url = self.url(queue, &["messages"])?;

        let response: PostMessagesResponse =
            self.send(self.http_client.post(url).json(&request)).await?;
        Ok(response.ids)
    }

    async fn get(&self, queue: &str, n: usize) -> Result<Vec<Message>, ClientError> {
        let url = self.url(queue, &["messages"])?;
        let response: MessagesResponse = self
            .send(self.http_client.delete(url).query(&[("n", n)]))
            .await?;
        Ok(response.messages)
    }

    async fn reserve(&self, queue: &str, n: usize) -> Result<Vec<Message>, ClientError> {
        let url = self.url(queue, &["messages"])?;
        let response: MessagesResponse = self
            .send(self.http_client.get(url).query(&[("n", n)]))
            .await?;
        Ok(response.messages)
    }

    async fn delete_message(&self, queue: &str, id: &str) -> Result<(), ClientError> {
        let url = self.url(queue, &["messages", id])?;
        let _: serde_json::Value = self.send(self.http_client.delete(url)).await?;
        Ok(())
    }

    async fn size(&self, queue: &str) -> Result<usize, ClientError> {
        Ok(self.queue_stats(queue).await?.size)
    }

    async fn delete_queue(&self, queue: &str) -> Result<(), ClientError> {
        let url = self.url(queue, &[])?;
        let _: serde_json::Value = self.send(self.http_client.delete(url)).await?;
        Ok(())
    }

    async fn add_alert(&self, queue: &str, alert: &NewAlert) -> Result<AlertRule, ClientError> {
        // Reject bad rules before they reach the wire
        AlertRule::validate("", queue, alert)?;

        let url = self.url(queue, &["alerts"])?;
        self.send(self.http_client.post(url).json(alert)).await
    }

    async fn list_alerts(&self, queue: &str) -> Result<Vec<AlertRule>, ClientError> {
        let url = self.url(queue, &["alerts"])?;
        let response: AlertsResponse = self.send(self.http_client.get(url)).await?;
        Ok(response.alerts)
    }
}
