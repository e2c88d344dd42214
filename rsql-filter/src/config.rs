use crate::rsql::{Parser, ParserConfig};
use crate::tokenizer::{Policy, PolicyMode};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    pub policy: Option<PolicyConfig>,
}

#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    pub mode: PolicyMode,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl FilterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn policy(&self) -> Option<Policy> {
        self.policy
            .as_ref()
            .map(|policy| Policy::new(policy.mode, policy.fields.iter().cloned()))
    }

    pub fn parser(&self) -> Parser {
        Parser::with_config(self.policy(), self.parser)
    }
}
