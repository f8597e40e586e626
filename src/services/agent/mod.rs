pub mod http;

use async_trait::async_trait;

use crate::models::{AgentRequest, AgentResponse};

/// Port to the external NLU agent. Implementations classify one
/// conversation turn; transport failures are expected to degrade to
/// `AgentResponse::failure()` rather than an error, but callers must also
/// tolerate `Err` from implementations that cannot.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn respond(&self, request: &AgentRequest) -> anyhow::Result<AgentResponse>;
}
