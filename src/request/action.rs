//! Action parsing and validation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::envelope::InboundRequest;
use crate::bridge::LifecycleState;

/// A requested power transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Action::Start => "started",
            Action::Stop => "stopped",
        }
    }

    /// The state an instance must currently be in for this action to change it
    pub fn source_state(&self) -> LifecycleState {
        match self {
            Action::Start => LifecycleState::Stopped,
            Action::Stop => LifecycleState::Running,
        }
    }

    /// Accept exactly `"start"` or `"stop"`; anything else is rejected
    pub fn parse(raw: Option<&Value>) -> Result<Self, ValidationError> {
        match raw {
            Some(Value::String(s)) if s == "start" => Ok(Action::Start),
            Some(Value::String(s)) if s == "stop" => Ok(Action::Stop),
            other => Err(ValidationError::new(other)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The requested action is missing, unparseable or not `start`/`stop`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid action: '{value}'. Must be 'start' or 'stop'.")]
pub struct ValidationError {
    /// Rendering of the rejected value, as stored in the ledger
    pub value: String,
}

impl ValidationError {
    fn new(raw: Option<&Value>) -> Self {
        let value = match raw {
            None | Some(Value::Null) => "null".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Self { value }
    }
}

/// Extract and validate the action of a resolved request
pub fn validate_action(request: &InboundRequest) -> Result<Action, ValidationError> {
    Action::parse(request.action().as_ref())
}
