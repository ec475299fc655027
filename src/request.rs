//! Request, outcome and stream event types for multichat

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use serde::ser::SerializeMap;

pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 1024;

/// Reported when a failure carries no message of its own.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Message reported for a failed model.
pub fn failure_reason(error: &crate::error::Error) -> String
{   let reason = error.to_string();
    if reason.is_empty()
    {   UNKNOWN_ERROR.to_string()
    } else
    {   reason
    }
}

/// Messages for a request: either one conversation shared by every
/// model, or one conversation per model id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageSet
{   Shared(Vec<crate::Message>)
  , PerModel(HashMap<String, Vec<crate::Message>>)
}

impl MessageSet
{   /// The conversation `model` should receive.
    pub fn for_model(&self, model: &str)
      -> Result<&[crate::Message], crate::error::Error>
    {   match self
        {   MessageSet::Shared(messages) => Ok(messages)
          , MessageSet::PerModel(map) => map
              .get(model)
              .map(Vec::as_slice)
              .ok_or_else(|| {
                crate::error::Error::MissingModelMessages(
                  model.to_string()
                )
              })
        }
    }
}

/// Unified multi-model chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest
{   /// Model ids, in the order results are reported
    pub models: Vec<String>
  , /// Conversation(s) to send
    pub messages: MessageSet
  , /// Budget for the summed UTF-8 length of message contents
    pub max_input_bytes: usize
  , /// Max tokens each provider may generate
    pub max_output_tokens: usize
  , /// Run the moderation gate before dispatch
    #[serde(default)]
    pub moderation_enabled: bool
}

impl ChatRequest
{   pub fn new(
      models: Vec<String>
    , messages: MessageSet
    ) -> Self
    {   ChatRequest
        {   models
          , messages
          , max_input_bytes: DEFAULT_MAX_INPUT_BYTES
          , max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS
          , moderation_enabled: false
        }
    }

    /// Shared-conversation request from model names.
    pub fn shared(
      models: &[&str]
    , messages: Vec<crate::Message>
    ) -> Self
    {   ChatRequest::new(
          models.iter().map(|m| m.to_string()).collect()
        , MessageSet::Shared(messages)
        )
    }

    /// Per-model request; `models` follows the pair order.
    pub fn per_model(
      pairs: Vec<(&str, Vec<crate::Message>)>
    ) -> Self
    {   let models = pairs.iter()
          .map(|(m, _)| m.to_string())
          .collect();
        let map = pairs.into_iter()
          .map(|(m, msgs)| (m.to_string(), msgs))
          .collect();
        ChatRequest::new(models, MessageSet::PerModel(map))
    }

    pub fn with_max_input_bytes(mut self, bytes: usize) -> Self
    {   self.max_input_bytes = bytes;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: usize) -> Self
    {   self.max_output_tokens = tokens;
        self
    }

    pub fn with_moderation(mut self, enabled: bool) -> Self
    {   self.moderation_enabled = enabled;
        self
    }

    /// Top-level shape checks that run before any dispatch.
    pub fn validate_shape(&self) -> Result<(), crate::error::Error>
    {   if self.models.is_empty()
        {   return Err(crate::error::Error::InvalidRequest(
              "At least one model is required.".to_string()
            ));
        }
        if self.max_input_bytes == 0
        {   return Err(crate::error::Error::InvalidRequest(
              "maxInput must be a positive integer.".to_string()
            ));
        }
        if self.max_output_tokens == 0
        {   return Err(crate::error::Error::InvalidRequest(
              "maxOutput must be a positive integer.".to_string()
            ));
        }
        Ok(())
    }
}

/// Result of one model's call. Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatOutcome
{   Success(String)
  , Failure { error: String }
}

impl ChatOutcome
{   pub fn failure(reason: impl Into<String>) -> Self
    {   ChatOutcome::Failure { error: reason.into() }
    }

    pub fn is_success(&self) -> bool
    {   matches!(self, ChatOutcome::Success(_))
    }

    pub fn text(&self) -> Option<&str>
    {   match self
        {   ChatOutcome::Success(text) => Some(text)
          , ChatOutcome::Failure { .. } => None
        }
    }

    pub fn error(&self) -> Option<&str>
    {   match self
        {   ChatOutcome::Success(_) => None
          , ChatOutcome::Failure { error } => Some(error)
        }
    }
}

impl From<Result<String, crate::error::Error>> for ChatOutcome
{   fn from(result: Result<String, crate::error::Error>) -> Self
    {   match result
        {   Ok(text) => ChatOutcome::Success(text)
          , Err(e) => ChatOutcome::failure(failure_reason(&e))
        }
    }
}

/// Outcomes keyed by model id, in request order.
///
/// A repeated model id keeps the position of its first occurrence
/// and the outcome of its last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedResult
{   entries: Vec<(String, ChatOutcome)>
}

impl AggregatedResult
{   pub fn new() -> Self
    {   AggregatedResult::default()
    }

    pub fn insert(&mut self, model: String, outcome: ChatOutcome)
    {   match self.entries.iter_mut().find(|(m, _)| *m == model)
        {   Some(entry) => entry.1 = outcome
          , None => self.entries.push((model, outcome))
        }
    }

    pub fn get(&self, model: &str) -> Option<&ChatOutcome>
    {   self.entries.iter()
          .find(|(m, _)| m == model)
          .map(|(_, o)| o)
    }

    pub fn len(&self) -> usize
    {   self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.entries.is_empty()
    }

    pub fn models(&self) -> impl Iterator<Item = &str>
    {   self.entries.iter().map(|(m, _)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChatOutcome)>
    {   self.entries.iter().map(|(m, o)| (m.as_str(), o))
    }
}

impl Serialize for AggregatedResult
{   fn serialize<S: serde::Serializer>(&self, serializer: S)
      -> Result<S::Ok, S::Error>
    {   let mut map = serializer.serialize_map(
          Some(self.entries.len())
        )?;
        for (model, outcome) in &self.entries
        {   map.serialize_entry(model, outcome)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus
{   Success
  , Error
}

/// One model's completion, delivered to the stream callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent
{   pub model: String
  , pub status: StreamStatus
  , #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>
  , /// RFC 3339 / ISO-8601, taken when the model's call settled
    pub timestamp: String
}

impl StreamEvent
{   pub fn from_result(
      model: String
    , result: Result<String, crate::error::Error>
    ) -> Self
    {   let timestamp = chrono::Utc::now().to_rfc3339_opts(
          chrono::SecondsFormat::Millis
        , true
        );
        match result
        {   Ok(text) => StreamEvent
            {   model
              , status: StreamStatus::Success
              , data: Some(text)
              , error: None
              , timestamp
            }
          , Err(e) => StreamEvent
            {   model
              , status: StreamStatus::Error
              , data: None
              , error: Some(failure_reason(&e))
              , timestamp
            }
        }
    }
}
