//! System prompt and agent definition types

use serde::{Deserialize, Serialize};

// ============================================================================
// System Prompt Types
// ============================================================================

/// Preset-based system prompt
///
/// Selecting a preset without `append` makes the CLI use its built-in prompt
/// unchanged; `append` adds text after the preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPromptPreset {
    /// Prompt type (always "preset")
    #[serde(rename = "type")]
    pub prompt_type: String,
    /// Preset name (e.g. "`claude_code`")
    pub preset: String,
    /// Additional text to append to the preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<String>,
}

impl SystemPromptPreset {
    /// Create a preset system prompt
    pub fn new(preset: impl Into<String>) -> Self {
        Self {
            prompt_type: "preset".to_string(),
            preset: preset.into(),
            append: None,
        }
    }

    /// Append text after the preset prompt
    #[must_use]
    pub fn with_append(mut self, append: impl Into<String>) -> Self {
        self.append = Some(append.into());
        self
    }
}

/// System prompt configuration
#[derive(Debug, Clone)]
pub enum SystemPrompt {
    /// Plain string system prompt
    Text(String),
    /// Preset-based system prompt
    Preset(SystemPromptPreset),
    /// Custom preset record passed through as JSON
    Custom(serde_json::Value),
}

impl From<String> for SystemPrompt {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for SystemPrompt {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<SystemPromptPreset> for SystemPrompt {
    fn from(preset: SystemPromptPreset) -> Self {
        Self::Preset(preset)
    }
}

// ============================================================================
// Agent Definition
// ============================================================================

/// Definition of a named subagent passed via `--agents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Agent description
    pub description: String,
    /// Agent system prompt
    pub prompt: String,
    /// Tools available to the agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    /// Model to use for the agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
