//! CLI argv construction
//!
//! A pure function of the options record, apart from the temp files created
//! when a JSON blob would blow the platform argv budget. Spilled blobs are
//! referenced as `@<path>` and the paths are returned so the transport can
//! unlink them on close.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::{ClaudeError, Result};
use crate::types::agent::SystemPrompt;
use crate::types::mcp::McpServers;
use crate::types::options::{ClaudeAgentOptions, PluginConfig, ToolsConfig};

use super::config::{MAX_COMMAND_LENGTH, PromptInput};

/// Command builder for the Claude CLI
pub struct CommandBuilder<'a> {
    cli_path: &'a Path,
    prompt: &'a PromptInput,
    options: &'a ClaudeAgentOptions,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub fn new(
        cli_path: &'a Path,
        prompt: &'a PromptInput,
        options: &'a ClaudeAgentOptions,
    ) -> Self {
        Self {
            cli_path,
            prompt,
            options,
        }
    }

    /// Build the complete command plus any spill files created for it
    ///
    /// # Errors
    /// Returns error when settings cannot be parsed or a spill file cannot
    /// be written
    pub fn build(&self) -> Result<(Command, Vec<PathBuf>)> {
        let mut args: Vec<String> = vec![
            "--output-format".into(),
            "stream-json".into(),
            "--verbose".into(),
        ];
        // Indices of argument values that may be spilled to files
        let mut spillable: Vec<usize> = Vec::new();

        self.add_system_prompt_args(&mut args)?;
        self.add_tool_args(&mut args);
        self.add_configuration_args(&mut args);
        self.add_session_args(&mut args);
        self.add_settings_args(&mut args)?;
        self.add_agent_args(&mut args, &mut spillable)?;
        self.add_mcp_args(&mut args, &mut spillable)?;
        self.add_plugin_args(&mut args);
        self.add_extra_args(&mut args);

        match self.prompt {
            PromptInput::Stream => {
                args.push("--input-format".into());
                args.push("stream-json".into());
            }
            PromptInput::String(s) => {
                args.push("--print".into());
                args.push("--".into());
                args.push(s.clone());
            }
        }

        let temp_files = self.spill_oversize_args(&mut args, &spillable)?;

        let mut cmd = Command::new(self.cli_path);
        cmd.args(&args);
        Ok((cmd, temp_files))
    }

    fn add_system_prompt_args(&self, args: &mut Vec<String>) -> Result<()> {
        match &self.options.system_prompt {
            None => {}
            Some(SystemPrompt::Text(s)) => {
                args.push("--system-prompt".into());
                args.push(s.clone());
            }
            Some(SystemPrompt::Preset(preset)) => {
                // A bare preset means the CLI's built-in prompt: no flag.
                if let Some(ref append) = preset.append {
                    args.push("--append-system-prompt".into());
                    args.push(append.clone());
                }
            }
            Some(SystemPrompt::Custom(value)) => {
                args.push("--system-prompt".into());
                args.push(serde_json::to_string(value)?);
            }
        }
        Ok(())
    }

    fn add_tool_args(&self, args: &mut Vec<String>) {
        match &self.options.tools {
            None => {}
            Some(ToolsConfig::List(tools)) => {
                // An explicitly empty list disables all tools.
                args.push("--tools".into());
                args.push(tools.join(","));
            }
            Some(ToolsConfig::Preset(preset)) => {
                args.push("--tools".into());
                args.push(preset.as_flag_value().to_string());
            }
        }
    }

    fn add_configuration_args(&self, args: &mut Vec<String>) {
        if let Some(max_turns) = self.options.max_turns {
            args.push("--max-turns".into());
            args.push(max_turns.to_string());
        }
        if let Some(ref model) = self.options.model {
            args.push("--model".into());
            args.push(model.clone());
        }
        if let Some(ref fallback) = self.options.fallback_model {
            args.push("--fallback-model".into());
            args.push(fallback.clone());
        }
        if let Some(tokens) = self.options.max_thinking_tokens {
            args.push("--max-thinking-tokens".into());
            args.push(tokens.to_string());
        }
        if let Some(ref tool) = self.options.permission_prompt_tool_name {
            args.push("--permission-prompt-tool".into());
            args.push(tool.clone());
        }
        if let Some(ref mode) = self.options.permission_mode {
            args.push("--permission-mode".into());
            args.push(mode.as_str().to_string());
        }
        if self.options.dangerously_skip_permissions {
            args.push("--dangerously-skip-permissions".into());
        }
    }

    fn add_session_args(&self, args: &mut Vec<String>) {
        if self.options.continue_conversation {
            args.push("--continue".into());
        }
        if let Some(ref session_id) = self.options.resume {
            args.push("--resume".into());
            args.push(session_id.as_str().to_string());
        }
        if let Some(ref uuid) = self.options.resume_session_at {
            args.push("--resume-session-at".into());
            args.push(uuid.clone());
        }
        if self.options.fork_session {
            args.push("--fork-session".into());
        }
        if let Some(ref session_id) = self.options.session_id {
            args.push("--session-id".into());
            args.push(session_id.as_str().to_string());
        }
        for dir in &self.options.add_dirs {
            args.push("--add-dir".into());
            args.push(dir.to_string_lossy().into_owned());
        }
        if self.options.include_partial_messages {
            args.push("--include-partial-messages".into());
        }
        if let Some(ref sources) = self.options.setting_sources {
            let joined: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
            args.push("--setting-sources".into());
            args.push(joined.join(","));
        }
    }

    /// Settings and sandbox merge
    ///
    /// When both are present the settings (inline JSON or file contents)
    /// are parsed and the sandbox configuration lands under the `"sandbox"`
    /// key of one combined `--settings` JSON document.
    fn add_settings_args(&self, args: &mut Vec<String>) -> Result<()> {
        let value = match (&self.options.settings, &self.options.sandbox) {
            (None, None) => return Ok(()),
            (Some(settings), None) => settings.clone(),
            (None, Some(sandbox)) => serde_json::json!({ "sandbox": sandbox }).to_string(),
            (Some(settings), Some(sandbox)) => {
                let mut parsed = self.load_settings(settings)?;
                let serde_json::Value::Object(ref mut map) = parsed else {
                    return Err(ClaudeError::invalid_config(
                        "settings must be a JSON object to merge a sandbox configuration",
                    ));
                };
                map.insert("sandbox".to_string(), sandbox.clone());
                parsed.to_string()
            }
        };
        args.push("--settings".into());
        args.push(value);
        Ok(())
    }

    fn load_settings(&self, settings: &str) -> Result<serde_json::Value> {
        if settings.trim_start().starts_with('{') {
            serde_json::from_str(settings).map_err(|e| {
                ClaudeError::invalid_config(format!("settings is not valid JSON: {e}"))
            })
        } else {
            let contents = std::fs::read_to_string(settings).map_err(|e| {
                ClaudeError::invalid_config(format!(
                    "settings file {settings} could not be read: {e}"
                ))
            })?;
            serde_json::from_str(&contents).map_err(|e| {
                ClaudeError::invalid_config(format!(
                    "settings file {settings} is not valid JSON: {e}"
                ))
            })
        }
    }

    fn add_agent_args(&self, args: &mut Vec<String>, spillable: &mut Vec<usize>) -> Result<()> {
        if let Some(ref agents) = self.options.agents {
            args.push("--agents".into());
            args.push(serde_json::to_string(agents)?);
            spillable.push(args.len() - 1);
        }
        Ok(())
    }

    fn add_mcp_args(&self, args: &mut Vec<String>, spillable: &mut Vec<usize>) -> Result<()> {
        match &self.options.mcp_servers {
            McpServers::None => {}
            McpServers::Path(path) => {
                args.push("--mcp-config".into());
                args.push(path.to_string_lossy().into_owned());
            }
            McpServers::Dict(servers) => {
                if !servers.is_empty() {
                    let config: serde_json::Map<String, serde_json::Value> = servers
                        .iter()
                        .map(|(name, cfg)| (name.clone(), cfg.to_cli_json()))
                        .collect();
                    let config_json = serde_json::json!({ "mcpServers": config });
                    args.push("--mcp-config".into());
                    args.push(config_json.to_string());
                    spillable.push(args.len() - 1);
                }
            }
        }
        Ok(())
    }

    fn add_plugin_args(&self, args: &mut Vec<String>) {
        for plugin in &self.options.plugins {
            match plugin {
                PluginConfig::Local(path) => {
                    args.push("--plugin-dir".into());
                    args.push(path.to_string_lossy().into_owned());
                }
                PluginConfig::Remote { url } => {
                    log::debug!("ignoring remote plugin {url}: only local plugins are forwarded");
                }
            }
        }
    }

    fn add_extra_args(&self, args: &mut Vec<String>) {
        for (flag, value) in &self.options.extra_args {
            args.push(format!("--{flag}"));
            if let Some(v) = value {
                args.push(v.clone());
            }
        }
    }

    /// Replace oversize spillable values with `@<file>` references until the
    /// command fits the platform budget
    fn spill_oversize_args(
        &self,
        args: &mut [String],
        spillable: &[usize],
    ) -> Result<Vec<PathBuf>> {
        let mut temp_files = Vec::new();

        // Largest blob first, so one spill is usually enough.
        let mut by_size: Vec<usize> = spillable.to_vec();
        by_size.sort_by_key(|&idx| std::cmp::Reverse(args[idx].len()));

        for idx in by_size {
            if command_length(self.cli_path, args) <= MAX_COMMAND_LENGTH {
                break;
            }
            let path = write_spill_file(&args[idx])?;
            log::debug!(
                "spilled {} byte argument to {}",
                args[idx].len(),
                path.display()
            );
            args[idx] = format!("@{}", path.display());
            temp_files.push(path);
        }

        Ok(temp_files)
    }
}

fn command_length(cli_path: &Path, args: &[String]) -> usize {
    cli_path.as_os_str().len() + args.iter().map(|a| a.len() + 1).sum::<usize>()
}

fn write_spill_file(contents: &str) -> Result<PathBuf> {
    let mut file = tempfile::NamedTempFile::with_prefix("claude-sdk-arg-")?;
    file.write_all(contents.as_bytes())?;
    let (_, path) = file
        .keep()
        .map_err(|e| ClaudeError::transport(format!("failed to persist spill file: {e}")))?;
    Ok(path)
}
