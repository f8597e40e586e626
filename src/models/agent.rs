use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One conversation turn sent to the remote agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest {
    pub business_id: i64,
    pub from_number: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
}

/// What the agent made of a turn: the recognized intent, the reply to
/// relay to the customer, an optional state suggestion, and whatever slot
/// values it believes it extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub ok: bool,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub reply: String,
    #[serde(default)]
    pub next_state: Option<String>,
    #[serde(default)]
    pub extracted_info: Option<ExtractedInfo>,
}

impl AgentResponse {
    /// Sentinel returned when the agent cannot be reached. The conversation
    /// degrades to a failed turn instead of surfacing a fault.
    pub fn failure() -> Self {
        Self {
            ok: false,
            intent: "error".to_string(),
            reply: String::new(),
            next_state: None,
            extracted_info: None,
        }
    }
}

/// Open map of slot values extracted by the agent. The agent's vocabulary
/// evolves independently of this service, so the shape stays loose and the
/// typed accessors below absorb the coercion that entails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedInfo(pub serde_json::Map<String, Value>);

impl ExtractedInfo {
    /// Scalar field as a string. Numbers are stringified the way the agent
    /// sometimes sends numeric selections; anything else is treated as
    /// absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&Vec<Value>> {
        self.0.get(key)?.as_array()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}
