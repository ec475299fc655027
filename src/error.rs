use std::fmt;

/// Error type for every multichat operation.
/// Implements Clone so it can travel through channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Serialized message content is over the byte budget
    InputTooLarge
    {   size_bytes: usize
      , limit_bytes: usize
    }
  , /// Moderation flagged at least one message
    ContentRejected
  , /// Transform asked for a family that needs no rewrite
    InvalidTarget(String)
  , /// Message role the target provider cannot carry
    InvalidRole(String)
  , /// Model id is in none of the routing tables
    UnsupportedModel(String)
  , /// Per-model messages have no entry for a requested model
    MissingModelMessages(String)
  , /// Streaming was requested without a callback
    CallbackRequired
  , /// Remote provider call failed
    ProviderError
    {   provider: String
      , detail: String
    }
  , /// Request is malformed at the top level
    InvalidRequest(String)
  , /// API key is missing for a provider
    MissingApiKey(String)
  , /// HTTP transport error
    HttpError(String)
  , /// API returned an error response
    ApiError(String)
  , /// Failed to parse API response
    ParseError(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generic error
    Other(String)
}

impl Error
{   /// Wrap any failure as attributed to a provider.
    pub fn provider(
      family: crate::ProviderFamily
    , detail: impl fmt::Display
    ) -> Self
    {   Error::ProviderError
        {   provider: family.display_name().to_string()
          , detail: detail.to_string()
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::InputTooLarge { size_bytes, limit_bytes } => {
              // unrounded: 1200 bytes -> 1.171875 KB
              write!(f,
                "Input size of {} KB exceeds the limit of {} KB.",
                *size_bytes as f64 / 1024.0,
                *limit_bytes as f64 / 1024.0
              )
            }
          , Error::ContentRejected => {
              write!(f,
                "Input contains restricted or potentially harmful content."
              )
            }
          , Error::InvalidTarget(target) => {
              write!(f,
                "Invalid target: {}. Supported targets are \"anthropic\" and \"gemini\".",
                target
              )
            }
          , Error::InvalidRole(role) => {
              write!(f,
                "Invalid role \"{}\". Valid roles are: [\"user\", \"model\", \"function\", \"system\"].",
                role
              )
            }
          , Error::UnsupportedModel(model) => {
              write!(f, "Unsupported model: {}", model)
            }
          , Error::MissingModelMessages(model) => {
              write!(f, "No messages provided for model: {}", model)
            }
          , Error::CallbackRequired => {
              write!(f,
                "onResponse callback function is required for streaming."
              )
            }
          , Error::ProviderError { provider, detail } => {
              write!(f,
                "Error processing request with {}: {}",
                provider, detail
              )
            }
          , Error::InvalidRequest(msg) => {
              write!(f, "{}", msg)
            }
          , Error::MissingApiKey(provider) => {
              write!(f, "Missing API key for: {}", provider)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError(msg) => {
              write!(f, "API error: {}", msg)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn input_too_large_reports_unrounded_kilobytes()
    {   let err = Error::InputTooLarge
        {   size_bytes: 1200
          , limit_bytes: 1000
        };
        assert_eq!(
          err.to_string()
        , "Input size of 1.171875 KB exceeds the limit of 0.9765625 KB."
        );

        let err = Error::InputTooLarge
        {   size_bytes: 4096
          , limit_bytes: 2048
        };
        assert_eq!(
          err.to_string()
        , "Input size of 4 KB exceeds the limit of 2 KB."
        );
    }

    #[test]
    fn provider_error_is_attributed()
    {   let err = Error::provider(
          crate::ProviderFamily::Anthropic
        , "API quota exceeded"
        );
        assert_eq!(
          err.to_string()
        , "Error processing request with Claude: API quota exceeded"
        );
    }

    #[test]
    fn unsupported_model_message()
    {   let err = Error::UnsupportedModel("made-up-model".into());
        assert_eq!(err.to_string(), "Unsupported model: made-up-model");
    }
}
