use serde::{Deserialize, Serialize};
use log::{debug, error, trace};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest
{   pub model: String
  , pub max_tokens: usize
  , pub messages: Vec<crate::Message>
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse
{   pub content: Vec<ContentBlock>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock
{   #[serde(rename = "type")]
    pub kind: String
  , #[serde(default)]
    pub text: Option<String>
}

/// Build the messages request. System messages are rewritten first;
/// the messages API has no inline system role.
pub fn build_request(call: &super::ProviderCall)
  -> Result<MessagesRequest, crate::error::Error>
{   let messages = crate::transform::transform_messages(
      &call.messages
    , crate::ProviderFamily::Anthropic
    )?;
    Ok(MessagesRequest
    {   model: call.model.clone()
      , max_tokens: call.max_output_tokens
      , messages
    })
}

/// Text of the first `text` content block.
pub fn parse_response(body: &str)
  -> Result<String, crate::error::Error>
{   let family = crate::ProviderFamily::Anthropic;
    let response: MessagesResponse
      = serde_json::from_str(body).map_err(|e| {
        error!("Claude parse error: {}", e);
        crate::error::Error::provider(family, e)
      })?;

    response.content
      .into_iter()
      .find(|block| block.kind == "text")
      .and_then(|block| block.text)
      .ok_or_else(|| {
        error!("No text block in Claude response");
        crate::error::Error::provider(
          family
        , "API response contained no text content"
        )
      })
}

#[derive(Debug, Clone)]
pub struct AnthropicProvider
{   base_url: String
  , timeout: Option<std::time::Duration>
}

impl AnthropicProvider
{   pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Self
    {   AnthropicProvider
        {   base_url: base_url.trim_end_matches('/').to_string()
          , timeout: timeout_secs.map(std::time::Duration::from_secs)
        }
    }
}

#[async_trait::async_trait]
impl super::ChatProvider for AnthropicProvider
{   fn family(&self) -> crate::ProviderFamily
    {   crate::ProviderFamily::Anthropic
    }

    async fn chat(
      &self
    , credential: &str
    , call: &super::ProviderCall
    ) -> Result<String, crate::error::Error>
    {   debug!("Claude chat for model {}", call.model);
        let request = build_request(call)?;
        trace!("Claude request: {:?}", request);

        let http_client = super::http_client(self.family(), self.timeout)?;
        let body = super::send_json(
          self.family()
        , http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", credential)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
        ).await?;

        parse_response(&body)
    }
}
