//! Perplexity adapter. Same wire format as OpenAI, different host.

use log::debug;

#[derive(Debug, Clone)]
pub struct PerplexityProvider
{   base_url: String
  , timeout: Option<std::time::Duration>
}

impl PerplexityProvider
{   pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Self
    {   debug!("Creating PerplexityProvider for {}", base_url);
        PerplexityProvider
        {   base_url: base_url.trim_end_matches('/').to_string()
          , timeout: timeout_secs.map(std::time::Duration::from_secs)
        }
    }
}

#[async_trait::async_trait]
impl super::ChatProvider for PerplexityProvider
{   fn family(&self) -> crate::ProviderFamily
    {   crate::ProviderFamily::PerplexityCompatible
    }

    async fn chat(
      &self
    , credential: &str
    , call: &super::ProviderCall
    ) -> Result<String, crate::error::Error>
    {   super::openai::chat_completion(
          self.family()
        , &self.base_url
        , self.timeout
        , credential
        , call
        ).await
    }
}
