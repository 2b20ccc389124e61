use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub id: u64,
    pub name: String,
    pub evaluator_key: String,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvaluatorConfig {
    pub name: String,
    pub evaluator_key: String,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}
