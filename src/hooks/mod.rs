//! Hook registry and dispatch
//!
//! Hook callbacks are registered per event through
//! [`ClaudeAgentOptions::hooks`](crate::ClaudeAgentOptions). At connect time
//! the registry assigns every callback a unique ID, renders the registration
//! payload for the `initialize` request, and afterwards resolves the
//! `hook_callback` control requests the CLI sends back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{ClaudeError, Result};
use crate::types::hooks::{HookCallback, HookContext, HookEvent, HookMatcher, HookOutput};

struct RegisteredHook {
    callback: HookCallback,
    timeout: Option<Duration>,
}

/// Registry of hook callbacks, keyed by their wire callback IDs
///
/// Built once per connection; the CLI matches events to matchers and calls
/// back by ID, in registration order.
#[derive(Default)]
pub struct HookRegistry {
    callbacks: HashMap<String, RegisteredHook>,
    init_payload: Option<serde_json::Value>,
}

impl HookRegistry {
    /// Build a registry from the per-event matcher lists
    #[must_use]
    pub fn new(hooks: Option<&HashMap<HookEvent, Vec<HookMatcher>>>) -> Self {
        let Some(hooks) = hooks else {
            return Self::default();
        };

        let mut callbacks = HashMap::new();
        let mut payload = serde_json::Map::new();

        for (event, matchers) in hooks {
            let mut rendered_matchers = Vec::with_capacity(matchers.len());
            for matcher in matchers {
                let timeout = matcher.timeout.map(Duration::from_secs_f64);
                let mut ids = Vec::with_capacity(matcher.hooks.len());
                for callback in &matcher.hooks {
                    let id = format!("hook_{}", uuid::Uuid::new_v4().simple());
                    callbacks.insert(
                        id.clone(),
                        RegisteredHook {
                            callback: Arc::clone(callback),
                            timeout,
                        },
                    );
                    ids.push(serde_json::Value::String(id));
                }

                let mut rendered = serde_json::Map::new();
                if let Some(ref pattern) = matcher.matcher {
                    rendered.insert(
                        "matcher".to_string(),
                        serde_json::Value::String(pattern.clone()),
                    );
                }
                rendered.insert(
                    "hookCallbackIds".to_string(),
                    serde_json::Value::Array(ids),
                );
                if let Some(timeout) = matcher.timeout {
                    rendered.insert("timeout".to_string(), serde_json::json!(timeout));
                }
                rendered_matchers.push(serde_json::Value::Object(rendered));
            }
            payload.insert(
                event.as_str().to_string(),
                serde_json::Value::Array(rendered_matchers),
            );
        }

        Self {
            callbacks,
            init_payload: Some(serde_json::Value::Object(payload)),
        }
    }

    /// Whether any callback is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Registration payload for the `initialize` request
    #[must_use]
    pub fn init_payload(&self) -> Option<serde_json::Value> {
        self.init_payload.clone()
    }

    /// Invoke the callback behind a `hook_callback` request
    ///
    /// The callback runs under its matcher's timeout when one was declared;
    /// on expiry its context token is cancelled and an error is returned for
    /// the CLI to receive as the hook's reply.
    ///
    /// # Errors
    /// Returns `ClaudeError::Hook` for unknown IDs, timeouts, and callback
    /// failures
    pub async fn dispatch(
        &self,
        callback_id: &str,
        input: serde_json::Value,
        tool_use_id: Option<String>,
        parent: &CancellationToken,
    ) -> Result<HookOutput> {
        let Some(registered) = self.callbacks.get(callback_id) else {
            return Err(ClaudeError::hook(format!(
                "unknown hook callback id: {callback_id}"
            )));
        };

        let signal = parent.child_token();
        let context = HookContext::new(signal.clone());
        let invocation = (registered.callback)(input, tool_use_id, context);

        match registered.timeout {
            None => invocation.await,
            Some(timeout) => match tokio::time::timeout(timeout, invocation).await {
                Ok(output) => output,
                Err(_) => {
                    signal.cancel();
                    Err(ClaudeError::hook(format!(
                        "hook callback {callback_id} timed out after {timeout:?}"
                    )))
                }
            },
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("callbacks", &format!("[{} callbacks]", self.callbacks.len()))
            .finish()
    }
}

/// Create a hook callback from an async closure
pub fn hook_callback<F, Fut>(f: F) -> HookCallback
where
    F: Fn(serde_json::Value, Option<String>, HookContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<HookOutput>> + Send + 'static,
{
    Arc::new(move |input, tool_use_id, context| Box::pin(f(input, tool_use_id, context)))
}

/// Builder for [`HookMatcher`]
pub struct HookMatcherBuilder {
    matcher: Option<String>,
    hooks: Vec<HookCallback>,
    timeout: Option<f64>,
}

impl HookMatcherBuilder {
    /// Create a builder with an optional matcher pattern
    pub fn new(pattern: Option<impl Into<String>>) -> Self {
        Self {
            matcher: pattern.map(Into::into),
            hooks: Vec::new(),
            timeout: None,
        }
    }

    /// Add a hook callback
    #[must_use]
    pub fn add_hook(mut self, hook: HookCallback) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Set the per-invocation timeout in seconds
    #[must_use]
    pub const fn timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Build the matcher
    #[must_use]
    pub fn build(self) -> HookMatcher {
        HookMatcher {
            matcher: self.matcher,
            hooks: self.hooks,
            timeout: self.timeout,
        }
    }
}
