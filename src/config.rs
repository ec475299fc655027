//! Configuration for provider credentials and endpoints

use serde::{Deserialize, Serialize};
use log::{debug, error};

pub const OPENAI_API_BASE: &str
  = "https://api.openai.com/v1";
pub const ANTHROPIC_API_BASE: &str
  = "https://api.anthropic.com/v1";
pub const GEMINI_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";
pub const PERPLEXITY_API_BASE: &str
  = "https://api.perplexity.ai";

/// One credential per provider family. Read-only once the client
/// is built.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys
{   #[serde(default)]
    pub openai: Option<String>
  , #[serde(default, alias = "claude")]
    pub anthropic: Option<String>
  , #[serde(default)]
    pub gemini: Option<String>
  , #[serde(default)]
    pub perplexity: Option<String>
}

impl ApiKeys
{   /// Read keys from the usual environment variables.
    pub fn from_env() -> Self
    {   debug!("Loading API keys from environment");
        ApiKeys
        {   openai: std::env::var("OPENAI_API_KEY").ok()
          , anthropic: std::env::var("ANTHROPIC_API_KEY").ok()
          , gemini: std::env::var("GEMINI_API_KEY").ok()
          , perplexity: std::env::var("PERPLEXITY_API_KEY").ok()
        }
    }

    pub fn for_family(
      &self
    , family: crate::ProviderFamily
    ) -> Option<&str>
    {   match family
        {   crate::ProviderFamily::OpenAICompatible
              => self.openai.as_deref()
          , crate::ProviderFamily::Anthropic
              => self.anthropic.as_deref()
          , crate::ProviderFamily::Gemini
              => self.gemini.as_deref()
          , crate::ProviderFamily::PerplexityCompatible
              => self.perplexity.as_deref()
        }
    }

    /// Credential for `family`, or `MissingApiKey`.
    pub fn require(
      &self
    , family: crate::ProviderFamily
    ) -> Result<&str, crate::error::Error>
    {   self.for_family(family)
          .filter(|k| !k.is_empty())
          .ok_or_else(|| {
            error!("No API key configured for {}", family);
            crate::error::Error::MissingApiKey(
              family.display_name().to_string()
            )
          })
    }

    pub fn is_empty(&self) -> bool
    {   crate::ProviderFamily::ALL
          .iter()
          .all(|f| {
            self.for_family(*f).map_or(true, str::is_empty)
          })
    }
}

// Keys stay out of debug output and logs.
impl std::fmt::Debug for ApiKeys
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   let mark = |k: &Option<String>| {
          if k.is_some() { "<set>" } else { "<unset>" }
        };
        f.debug_struct("ApiKeys")
          .field("openai", &mark(&self.openai))
          .field("anthropic", &mark(&self.anthropic))
          .field("gemini", &mark(&self.gemini))
          .field("perplexity", &mark(&self.perplexity))
          .finish()
    }
}

/// Base URLs for each provider API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoints
{   pub openai: String
  , pub anthropic: String
  , pub gemini: String
  , pub perplexity: String
  , /// Moderation endpoint (OpenAI)
    pub moderation: String
}

impl ProviderEndpoints
{   pub fn for_family(
      &self
    , family: crate::ProviderFamily
    ) -> &str
    {   match family
        {   crate::ProviderFamily::OpenAICompatible => &self.openai
          , crate::ProviderFamily::Anthropic => &self.anthropic
          , crate::ProviderFamily::Gemini => &self.gemini
          , crate::ProviderFamily::PerplexityCompatible
              => &self.perplexity
        }
    }
}

impl Default for ProviderEndpoints
{   fn default() -> Self
    {   ProviderEndpoints
        {   openai: OPENAI_API_BASE.to_string()
          , anthropic: ANTHROPIC_API_BASE.to_string()
          , gemini: GEMINI_API_BASE.to_string()
          , perplexity: PERPLEXITY_API_BASE.to_string()
          , moderation: format!("{}/moderations", OPENAI_API_BASE)
        }
    }
}

/// multichat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig
{   /// Provider credentials
    pub api_keys: ApiKeys
  , /// Provider base URLs
    #[serde(default)]
    pub endpoints: ProviderEndpoints
  , /// Per-call HTTP timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>
}

impl ClientConfig
{   pub fn new(api_keys: ApiKeys) -> Self
    {   ClientConfig
        {   api_keys
          , ..ClientConfig::default()
        }
    }

    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::Error>
    {   let config: ClientConfig = serde_json::from_str(json)
          .map_err(|e| {
            error!("Config parse error: {}", e);
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(
      path: impl AsRef<std::path::Path>
    ) -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let json = std::fs::read_to_string(path)
          .map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            crate::error::Error::InvalidConfiguration(
              format!("{}: {}", path.display(), e)
            )
          })?;
        ClientConfig::from_json_str(&json)
    }

    /// At least one credential must be present.
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.api_keys.is_empty()
        {   error!("No API keys configured");
            return Err(crate::error::Error::InvalidConfiguration(
              "API keys are required.".to_string()
            ));
        }
        if self.timeout_secs == Some(0)
        {   return Err(crate::error::Error::InvalidConfiguration(
              "timeout_secs must be positive".to_string()
            ));
        }
        Ok(())
    }
}
