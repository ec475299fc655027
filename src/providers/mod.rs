//! LLM provider adapters, one per provider family

pub mod openai;
pub mod anthropic;
pub mod gemini;
pub mod perplexity;

use async_trait::async_trait;
use log::error;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;

/// What an adapter needs for one chat call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall
{   pub model: String
  , pub messages: Vec<crate::Message>
  , pub max_output_tokens: usize
}

/// Uniform one-shot chat call against a provider.
///
/// Implementations own their wire format, never retry, and report
/// remote failures as `ProviderError`.
#[async_trait]
pub trait ChatProvider: Send + Sync
{   fn family(&self) -> crate::ProviderFamily;

    async fn chat(
      &self
    , credential: &str
    , call: &ProviderCall
    ) -> Result<String, crate::error::Error>;
}

/// HTTP adapter for `family`, pointed at `base_url`.
pub fn http_provider(
  family: crate::ProviderFamily
, base_url: &str
, timeout_secs: Option<u64>
) -> Box<dyn ChatProvider>
{   match family
    {   crate::ProviderFamily::OpenAICompatible => Box::new(
          OpenAiProvider::new(base_url, timeout_secs)
        )
      , crate::ProviderFamily::Anthropic => Box::new(
          AnthropicProvider::new(base_url, timeout_secs)
        )
      , crate::ProviderFamily::Gemini => Box::new(
          GeminiProvider::new(base_url, timeout_secs)
        )
      , crate::ProviderFamily::PerplexityCompatible => Box::new(
          PerplexityProvider::new(base_url, timeout_secs)
        )
    }
}

/// Fresh client for a single call.
pub(crate) fn http_client(
  family: crate::ProviderFamily
, timeout: Option<std::time::Duration>
) -> Result<reqwest::Client, crate::error::Error>
{   let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout
    {   builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| {
      error!("Failed to build {} client: {}", family, e);
      crate::error::Error::provider(family, e)
    })
}

/// Send a prepared request and hand back the body of a 2xx reply.
/// Every failure is attributed to `family`.
pub(crate) async fn send_json(
  family: crate::ProviderFamily
, request: reqwest::RequestBuilder
) -> Result<String, crate::error::Error>
{   let response = request
      .send()
      .await
      .map_err(|e| {
        let e = e.without_url();
        error!("{} HTTP error: {}", family, e);
        crate::error::Error::provider(family, e)
      })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
      let e = e.without_url();
      error!("{} body read error: {}", family, e);
      crate::error::Error::provider(family, e)
    })?;

    if !status.is_success()
    {   let detail = extract_error_message(&body);
        error!("{} API error {}: {}", family, status, detail);
        return Err(crate::error::Error::provider(
          family
        , format!("{} {}", status.as_u16(), detail)
        ));
    }
    Ok(body)
}

/// Pull `error.message` out of a JSON error body, else the raw text.
pub(crate) fn extract_error_message(body: &str) -> String
{   serde_json::from_str::<serde_json::Value>(body)
      .ok()
      .and_then(|v| {
        v["error"]["message"].as_str().map(str::to_string)
      })
      .unwrap_or_else(|| body.to_string())
}
