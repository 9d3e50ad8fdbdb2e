//! Subprocess transport driving the Claude Code CLI

mod command;
mod config;
mod lifecycle;
mod reader;
mod transport;
mod version;

pub use config::{DEFAULT_MAX_BUFFER_SIZE, PromptInput, build_environment};
pub use reader::LineAccumulator;
pub use transport::SubprocessTransport;
pub use version::{CliVersion, MIN_CLI_VERSION, extract_version};
