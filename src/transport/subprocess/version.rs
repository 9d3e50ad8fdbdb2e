//! CLI version gate
//!
//! Before spawning the real session the transport runs `<cli> --version`,
//! scans the output for a semver triple, and refuses versions older than
//! [`MIN_CLI_VERSION`]. A gate that cannot reach a verdict (timeout, no
//! parseable output) logs and lets the connection proceed.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{ClaudeError, Result};

use super::config::{SKIP_VERSION_CHECK_ENV, VERSION_CHECK_TIMEOUT};

/// Minimum CLI version this client supports
pub const MIN_CLI_VERSION: CliVersion = CliVersion {
    major: 1,
    minor: 0,
    patch: 0,
};

/// A parsed `major.minor.patch` version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CliVersion {
    /// Major version
    pub major: u64,
    /// Minor version
    pub minor: u64,
    /// Patch version
    pub patch: u64,
}

impl CliVersion {
    /// Parse a bare `major.minor.patch` string
    ///
    /// A leading `v` is tolerated; anything else (missing parts, non-numeric
    /// parts such as `1.2.x`) is `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.strip_prefix('v').unwrap_or(s);
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// Whether `self` is at least `other`
    #[must_use]
    pub fn is_at_least(&self, other: &Self) -> bool {
        (self.major, self.minor, self.patch) >= (other.major, other.minor, other.patch)
    }
}

impl std::fmt::Display for CliVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Scan free-form `--version` output for the first plausible semver token
#[must_use]
pub fn extract_version(output: &str) -> Option<CliVersion> {
    output.split_whitespace().find_map(CliVersion::parse)
}

/// Run the version gate for `cli_path`
///
/// # Errors
/// Returns `ClaudeError::CliVersion` when the reported version is older than
/// [`MIN_CLI_VERSION`]. Timeouts and unparseable output are logged and pass.
pub async fn check_cli_version(cli_path: &Path) -> Result<()> {
    if std::env::var(SKIP_VERSION_CHECK_ENV).is_ok_and(|v| !v.is_empty()) {
        log::debug!("version gate bypassed via {SKIP_VERSION_CHECK_ENV}");
        return Ok(());
    }

    let mut cmd = Command::new(cli_path);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(VERSION_CHECK_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            log::warn!("version gate could not run {}: {e}", cli_path.display());
            return Ok(());
        }
        Err(_) => {
            log::warn!(
                "version gate timed out after {:?} for {}",
                VERSION_CHECK_TIMEOUT,
                cli_path.display()
            );
            return Ok(());
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some(installed) = extract_version(&stdout) else {
        log::warn!(
            "version gate found no version in output of {}: {:?}",
            cli_path.display(),
            stdout.trim()
        );
        return Ok(());
    };

    if installed.is_at_least(&MIN_CLI_VERSION) {
        log::debug!("CLI version {installed} accepted");
        Ok(())
    } else {
        Err(ClaudeError::cli_version(
            installed.to_string(),
            MIN_CLI_VERSION.to_string(),
        ))
    }
}
