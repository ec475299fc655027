//! Model id -> provider family routing over static allow-lists

use log::{debug, warn};
use crate::ProviderFamily;

pub const OPENAI_MODELS: &[&str] = &[
  "gpt-4"
, "gpt-4-turbo"
, "gpt-4o"
, "gpt-4o-mini"
, "gpt-3.5-turbo"
, "o1-preview"
, "o1-mini"
];

pub const ANTHROPIC_MODELS: &[&str] = &[
  "claude-3-5-sonnet-20241022"
, "claude-3-5-sonnet-20240620"
, "claude-3-5-haiku-20241022"
, "claude-3-opus-20240229"
, "claude-3-sonnet-20240229"
, "claude-3-haiku-20240307"
];

pub const GEMINI_MODELS: &[&str] = &[
  "gemini-1.5-pro"
, "gemini-1.5-flash"
, "gemini-1.5-flash-8b"
, "gemini-1.0-pro"
, "gemini-2.0-flash-exp"
];

pub const PERPLEXITY_MODELS: &[&str] = &[
  "llama-3.1-sonar-small-128k-online"
, "llama-3.1-sonar-large-128k-online"
, "llama-3.1-sonar-huge-128k-online"
, "sonar"
, "sonar-pro"
];

/// Allow-list for one family.
pub fn supported_models(family: ProviderFamily) -> &'static [&'static str]
{   match family
    {   ProviderFamily::OpenAICompatible => OPENAI_MODELS
      , ProviderFamily::Anthropic => ANTHROPIC_MODELS
      , ProviderFamily::Gemini => GEMINI_MODELS
      , ProviderFamily::PerplexityCompatible => PERPLEXITY_MODELS
    }
}

/// Every routable model, paired with its family, in table order.
pub fn all_supported_models() -> Vec<(ProviderFamily, &'static str)>
{   ProviderFamily::ALL
      .iter()
      .flat_map(|family| {
        supported_models(*family)
          .iter()
          .map(move |model| (*family, *model))
      })
      .collect()
}

/// Classify `model_id` into its provider family. Exact,
/// case-sensitive match.
pub fn resolve(model_id: &str)
  -> Result<ProviderFamily, crate::error::Error>
{   match ProviderFamily::ALL
      .into_iter()
      .find(|family| supported_models(*family).contains(&model_id))
    {   Some(family) => {
          debug!("Model {} routed to {}", model_id, family);
          Ok(family)
        }
      , None => {
          warn!("No provider for model {}", model_id);
          Err(crate::error::Error::UnsupportedModel(
            model_id.to_string()
          ))
        }
    }
}
