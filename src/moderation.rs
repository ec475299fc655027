//! Content-safety gate run before dispatch

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, error, trace, warn};

/// All-or-nothing content check over a batch of messages.
#[async_trait]
pub trait ModerationGate: Send + Sync
{   /// `Ok(())` when nothing is flagged; `ContentRejected` when any
    /// message is.
    async fn check(
      &self
    , credential: &str
    , messages: &[crate::Message]
    ) -> Result<(), crate::error::Error>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationRequest
{   pub input: Vec<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationResponse
{   pub results: Vec<ModerationResult>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationResult
{   pub flagged: bool
}

impl ModerationResponse
{   pub fn any_flagged(&self) -> bool
    {   self.results.iter().any(|r| r.flagged)
    }
}

/// Moderation through the OpenAI moderations endpoint
#[derive(Debug, Clone)]
pub struct OpenAiModeration
{   url: String
  , timeout: Option<std::time::Duration>
}

impl OpenAiModeration
{   pub fn new(url: &str, timeout_secs: Option<u64>) -> Self
    {   OpenAiModeration
        {   url: url.to_string()
          , timeout: timeout_secs.map(std::time::Duration::from_secs)
        }
    }

    fn http_client(&self) -> Result<reqwest::Client, crate::error::Error>
    {   let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout
        {   builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| {
          crate::error::Error::HttpError(e.to_string())
        })
    }
}

#[async_trait]
impl ModerationGate for OpenAiModeration
{   async fn check(
      &self
    , credential: &str
    , messages: &[crate::Message]
    ) -> Result<(), crate::error::Error>
    {   if messages.is_empty()
        {   debug!("Nothing to moderate");
            return Ok(());
        }

        let request = ModerationRequest
        {   input: messages.iter()
              .map(|m| m.content.clone())
              .collect()
        };
        trace!("Moderating {} messages", request.input.len());

        let response = self.http_client()?
          .post(&self.url)
          .header("Authorization", format!("Bearer {}", credential))
          .json(&request)
          .send()
          .await
          .map_err(|e| {
            error!("Moderation HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Moderation API error {}: {}", status, error_text);
            return Err(crate::error::Error::ApiError(error_text));
        }

        let moderation: ModerationResponse
          = response.json().await.map_err(|e| {
            error!("Moderation parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        if moderation.any_flagged()
        {   warn!("Moderation flagged request content");
            return Err(crate::error::Error::ContentRejected);
        }
        Ok(())
    }
}
