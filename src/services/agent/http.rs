use std::time::Duration;

use async_trait::async_trait;

use super::AgentGateway;
use crate::models::{AgentRequest, AgentResponse};

const RESPOND_TIMEOUT: Duration = Duration::from_secs(15);

pub struct HttpAgentGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAgentGateway {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn respond(&self, request: &AgentRequest) -> anyhow::Result<AgentResponse> {
        let url = format!("{}/v1/agent/respond", self.base_url);

        let result = self
            .client
            .post(&url)
            .timeout(RESPOND_TIMEOUT)
            .json(request)
            .send()
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "agent request failed");
                return Ok(AgentResponse::failure());
            }
        };

        match response.json::<AgentResponse>().await {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                tracing::error!(error = %e, "agent returned malformed response");
                Ok(AgentResponse::failure())
            }
        }
    }
}
