//! The actions an agent host can invoke.
//!
//! Every action has the same shape: a name and similes the host routes on,
//! a `validate` step that only checks configuration, and `handle`, which
//! runs the full pipeline (extract, resolve settings, call the chain,
//! format) and always comes back with an [`ActionOutcome`].

pub mod airdrop;
pub mod create_token;
pub mod extract;
pub mod format;
pub mod query;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::blockchain::models::ChainResult;
use crate::config::{self, SettingsProvider};
use crate::error::ActionResult;

pub use registry::ActionRegistry;

/// One incoming message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    #[serde(default)]
    pub text: String,
    /// Structured options supplied by the host next to the text.
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// A string option, ignoring blanks.
    pub fn option_str(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// The only thing the host ever sees from an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// What the host callback receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallbackResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl From<&ActionOutcome> for CallbackResponse {
    fn from(outcome: &ActionOutcome) -> Self {
        CallbackResponse {
            text: outcome.text.clone(),
            content: outcome.payload.clone(),
        }
    }
}

/// Receives the response of one `handle` call.
pub trait HostCallback: Send + Sync {
    fn respond(&self, response: CallbackResponse);
}

impl<F> HostCallback for F
where
    F: Fn(CallbackResponse) + Send + Sync,
{
    fn respond(&self, response: CallbackResponse) {
        self(response)
    }
}

/// A sample exchange shown to the host's intent router.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionExample {
    pub user: &'static str,
    pub agent: &'static str,
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn similes(&self) -> &'static [&'static str];

    fn description(&self) -> &'static str;

    fn examples(&self) -> Vec<ActionExample>;

    /// Settings that must be present before the action can run, in the
    /// order they are checked.
    fn required_settings(&self) -> &'static [&'static str] {
        &[]
    }

    /// Checks configuration only; never touches the network.
    fn validate(&self, settings: &dyn SettingsProvider) -> ActionResult<bool> {
        config::resolve(self.required_settings(), settings)?;
        Ok(true)
    }

    /// Extraction, settings and the chain call. Errors are turned into a
    /// failure outcome by [`Action::handle`].
    async fn run(
        &self,
        request: &ActionRequest,
        settings: &dyn SettingsProvider,
    ) -> ActionResult<ChainResult>;

    /// Runs the pipeline and reports to `callback` exactly once.
    async fn handle(
        &self,
        request: &ActionRequest,
        settings: &dyn SettingsProvider,
        callback: Option<&dyn HostCallback>,
    ) -> ActionOutcome {
        info!("Handling {}", self.name());
        let outcome = match self.run(request, settings).await {
            Ok(result) => format::format(&result),
            Err(e) => {
                error!("{} failed: {}", self.name(), e);
                format::failure(&e)
            }
        };
        if let Some(callback) = callback {
            callback.respond(CallbackResponse::from(&outcome));
        }
        outcome
    }

    /// Name or simile match, case-insensitive; spaces and underscores are
    /// interchangeable.
    fn answers_to(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        normalize_name(self.name()) == wanted
            || self.similes().iter().any(|s| normalize_name(s) == wanted)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase().replace(&[' ', '-'][..], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_read_as_trimmed_strings() {
        let request = ActionRequest::new("hi")
            .with_option("address", " 0xabc ")
            .with_option("amount", 5)
            .with_option("blank", "  ");
        assert_eq!(request.option_str("address").as_deref(), Some("0xabc"));
        assert_eq!(request.option_str("amount").as_deref(), Some("5"));
        assert_eq!(request.option_str("blank"), None);
        assert_eq!(request.option_str("missing"), None);
    }

    #[test]
    fn names_normalize_spaces_and_case() {
        assert_eq!(normalize_name("create a token"), "CREATE_A_TOKEN");
        assert_eq!(normalize_name("GET_NETWORK_STATS"), "GET_NETWORK_STATS");
    }
}
