use crate::batch::DEFAULT_USER_AGENT;
use crate::request::RequestSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchConfig {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1))]
    pub requests: Vec<RequestSpec>,

    /// Unset means every request is fired at once.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub concurrency: Option<usize>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Sent with every request unless the request sets the same header.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    #[serde(default)]
    pub output: Option<OutputConfig>,

    /// Optional path to a parent configuration file to inherit from
    #[serde(default)]
    pub extends: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Console,
    Json { path: String },
    Csv { path: String },
}

pub(crate) fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
