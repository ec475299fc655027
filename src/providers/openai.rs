use serde::{Deserialize, Serialize};
use log::{debug, error, trace};

// ===== Message Types =====

/// OpenAI chat completions request. Perplexity speaks the same
/// format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<crate::Message>
  , pub max_tokens: usize
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChoiceMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage
{   #[serde(default)]
    pub role: Option<String>
  , #[serde(default)]
    pub content: Option<String>
}

pub fn build_request(call: &super::ProviderCall) -> ChatCompletionRequest
{   ChatCompletionRequest
    {   model: call.model.clone()
      , messages: call.messages.clone()
      , max_tokens: call.max_output_tokens
    }
}

/// Reply text from the first choice.
pub fn parse_response(
  family: crate::ProviderFamily
, body: &str
) -> Result<String, crate::error::Error>
{   let response: ChatCompletionResponse
      = serde_json::from_str(body).map_err(|e| {
        error!("{} parse error: {}", family, e);
        crate::error::Error::provider(family, e)
      })?;

    response.choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| {
        error!("No choices in {} response", family);
        crate::error::Error::provider(
          family
        , "API response contained no choices"
        )
      })
}

/// One chat completion against an OpenAI-compatible endpoint.
pub(crate) async fn chat_completion(
  family: crate::ProviderFamily
, base_url: &str
, timeout: Option<std::time::Duration>
, credential: &str
, call: &super::ProviderCall
) -> Result<String, crate::error::Error>
{   debug!("{} chat for model {}", family, call.model);
    let request = build_request(call);
    trace!("{} request: {:?}", family, request);

    let http_client = super::http_client(family, timeout)?;
    let body = super::send_json(
      family
    , http_client
        .post(format!("{}/chat/completions", base_url))
        .header("Authorization", format!("Bearer {}", credential))
        .header("Content-Type", "application/json")
        .json(&request)
    ).await?;

    parse_response(family, &body)
}

// ===== OpenAI Adapter =====

#[derive(Debug, Clone)]
pub struct OpenAiProvider
{   base_url: String
  , timeout: Option<std::time::Duration>
}

impl OpenAiProvider
{   pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Self
    {   OpenAiProvider
        {   base_url: base_url.trim_end_matches('/').to_string()
          , timeout: timeout_secs.map(std::time::Duration::from_secs)
        }
    }
}

#[async_trait::async_trait]
impl super::ChatProvider for OpenAiProvider
{   fn family(&self) -> crate::ProviderFamily
    {   crate::ProviderFamily::OpenAICompatible
    }

    async fn chat(
      &self
    , credential: &str
    , call: &super::ProviderCall
    ) -> Result<String, crate::error::Error>
    {   chat_completion(
          self.family()
        , &self.base_url
        , self.timeout
        , credential
        , call
        ).await
    }
}
