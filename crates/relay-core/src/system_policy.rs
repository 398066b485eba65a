//! Classification of backend `system` events.
//!
//! A system event either carries a continuation id for the agent session,
//! is status noise to hide, or is text worth showing to the user.

use regex::Regex;
use relay_types::{config::SystemEventConfig, ClientError, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemDisposition {
    /// Backend agent session id to adopt silently
    Continuation(String),
    Suppress,
    Show(String),
}

#[derive(Debug, Clone)]
pub struct SystemPolicy {
    continuation_keys: Vec<String>,
    continuation_pattern: Option<Regex>,
    status_patterns: Vec<Regex>,
    show_unmatched: bool,
}

impl SystemPolicy {
    /// Compile a policy; an invalid pattern is a configuration error.
    pub fn from_config(config: &SystemEventConfig) -> Result<Self> {
        let compile = |pattern: &String| {
            Regex::new(pattern)
                .map_err(|e| ClientError::Config(format!("bad system pattern {:?}: {}", pattern, e)))
        };
        Ok(Self {
            continuation_keys: config.continuation_keys.clone(),
            continuation_pattern: config.continuation_pattern.as_ref().map(compile).transpose()?,
            status_patterns: config
                .status_patterns
                .iter()
                .map(compile)
                .collect::<Result<Vec<_>>>()?,
            show_unmatched: config.show_unmatched,
        })
    }

    pub fn classify(&self, content: &Value) -> SystemDisposition {
        match content {
            Value::Object(map) => {
                for key in &self.continuation_keys {
                    if let Some(Value::String(id)) = map.get(key) {
                        if !id.is_empty() {
                            return SystemDisposition::Continuation(id.clone());
                        }
                    }
                }
                match map
                    .get("message")
                    .or_else(|| map.get("content"))
                    .and_then(Value::as_str)
                {
                    Some(text) => self.classify_text(text),
                    None => SystemDisposition::Suppress,
                }
            }
            Value::String(text) => self.classify_text(text),
            _ => SystemDisposition::Suppress,
        }
    }

    fn classify_text(&self, text: &str) -> SystemDisposition {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SystemDisposition::Suppress;
        }

        // Some backends send the JSON payload as a string
        if trimmed.starts_with('{') {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
                return self.classify(&value);
            }
        }

        if let Some(id) = self
            .continuation_pattern
            .as_ref()
            .and_then(|re| re.captures(trimmed))
            .and_then(|caps| caps.get(1))
        {
            return SystemDisposition::Continuation(id.as_str().to_string());
        }

        if self.status_patterns.iter().any(|re| re.is_match(trimmed)) {
            return SystemDisposition::Suppress;
        }

        if self.show_unmatched {
            SystemDisposition::Show(trimmed.to_string())
        } else {
            SystemDisposition::Suppress
        }
    }
}

impl Default for SystemPolicy {
    fn default() -> Self {
        let config = SystemEventConfig::default();
        Self {
            continuation_keys: config.continuation_keys,
            continuation_pattern: config
                .continuation_pattern
                .and_then(|p| Regex::new(&p).ok()),
            status_patterns: config
                .status_patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            show_unmatched: config.show_unmatched,
        }
    }
}
