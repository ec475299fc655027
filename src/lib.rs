pub mod error;
pub mod config;
pub mod request;
pub mod validate;
pub mod moderation;
pub mod transform;
pub mod router;
pub mod providers;
pub mod client;
use serde::{Deserialize, Serialize};

/*

multichat: one request shape for several LLM chat APIs at once.

The caller names a list of models and a conversation; every model
is routed to its provider family, the conversation is rewritten
for that family, and all calls are fanned out concurrently. The
answers come back either as one map keyed by model (batch) or as
one callback per model as each finishes (stream).

multichat/
├── src/
│   ├── lib.rs          # Shared message and provider types
│   ├── error.rs        # Error taxonomy
│   ├── config.rs       # Credentials and endpoints
│   ├── request.rs      # Request, outcome and stream event types
│   ├── validate.rs     # Input byte budget
│   ├── moderation.rs   # Content-safety gate
│   ├── transform.rs    # System-role rewriting per provider
│   ├── router.rs       # Model id -> provider family
│   ├── providers/      # One adapter per provider family
│   └── client.rs       # Fan-out / fan-in orchestrator
└── tests/

*/

pub use client::{ChatClient, StreamCallback, StreamHandle};
pub use config::{ApiKeys, ClientConfig, ProviderEndpoints};
pub use error::Error;
pub use request::
{   AggregatedResult
  , ChatOutcome
  , ChatRequest
  , MessageSet
  , StreamEvent
  , StreamStatus
};

/// MULTICHAT STRUCTURES:

/// A single chat turn.
///
/// The role is kept as free text: which roles are legal depends on
/// the provider the message is eventually sent to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message
{   pub role: String
  , pub content: String
}

impl Message
{   pub fn new(role: &str, content: &str) -> Self
    {   Message
        {   role: role.to_string()
          , content: content.to_string()
        }
    }

    pub fn system(content: &str) -> Self
    {   Message::new(ROLE_SYSTEM, content)
    }

    pub fn user(content: &str) -> Self
    {   Message::new(ROLE_USER, content)
    }

    pub fn assistant(content: &str) -> Self
    {   Message::new(ROLE_ASSISTANT, content)
    }
}

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_MODEL: &str = "model";
pub const ROLE_FUNCTION: &str = "function";

/// Enum representing the provider API dialects a model can be
/// routed to. Every supported model id belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
pub enum ProviderFamily
{ /// OpenAI chat completions (GPT-4, GPT-4o, o1, ...)
  OpenAICompatible
  ,
  /// Anthropic messages API (Claude models)
  Anthropic
  ,
  /// Google generative language API (Gemini models)
  Gemini
  ,
  /// Perplexity, speaking the OpenAI wire format
  PerplexityCompatible
}

impl ProviderFamily
{   pub const ALL: [ProviderFamily; 4] = [
      ProviderFamily::OpenAICompatible
    , ProviderFamily::Anthropic
    , ProviderFamily::Gemini
    , ProviderFamily::PerplexityCompatible
    ];

    /// Name used when attributing provider errors.
    pub fn display_name(&self) -> &'static str
    {   match self
        {   ProviderFamily::OpenAICompatible => "OpenAI"
          , ProviderFamily::Anthropic => "Claude"
          , ProviderFamily::Gemini => "Gemini"
          , ProviderFamily::PerplexityCompatible => "Perplexity"
        }
    }

    /// Lowercase identifier, as used for transform targets.
    pub fn target_name(&self) -> &'static str
    {   match self
        {   ProviderFamily::OpenAICompatible => "openai"
          , ProviderFamily::Anthropic => "anthropic"
          , ProviderFamily::Gemini => "gemini"
          , ProviderFamily::PerplexityCompatible => "perplexity"
        }
    }

    /// Whether messages must go through the system-role rewrite
    /// before they can be sent to this family.
    pub fn needs_transform(&self) -> bool
    {   matches!(
          self
        , ProviderFamily::Anthropic | ProviderFamily::Gemini
        )
    }
}

impl std::fmt::Display for ProviderFamily
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   write!(f, "{}", self.display_name())
    }
}
