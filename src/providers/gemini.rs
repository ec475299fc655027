use serde::{Deserialize, Serialize};
use log::{debug, error, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part
{   pub text: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content
{   pub role: String
  , pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub max_output_tokens: usize
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<CandidateContent>
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent
{   #[serde(default)]
    pub parts: Vec<CandidatePart>
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart
{   #[serde(default)]
    pub text: Option<String>
}

/// Build the request body: system rewrite, then Gemini's role names.
///
/// Role errors come back as `InvalidRole`, not as a provider error.
pub fn build_request(call: &super::ProviderCall)
  -> Result<GenerateContentRequest, crate::error::Error>
{   let transformed = crate::transform::transform_messages(
      &call.messages
    , crate::ProviderFamily::Gemini
    )?;
    let contents = crate::transform::to_gemini_roles(transformed)?
      .into_iter()
      .map(|m| Content
      {   role: m.role
        , parts: vec![Part { text: m.content }]
      })
      .collect();

    Ok(GenerateContentRequest
    {   contents
      , generation_config: GenerationConfig
        {   max_output_tokens: call.max_output_tokens
        }
    })
}

/// Concatenated text parts of the first candidate.
pub fn parse_response(body: &str)
  -> Result<String, crate::error::Error>
{   let family = crate::ProviderFamily::Gemini;
    let response: GenerateContentResponse
      = serde_json::from_str(body).map_err(|e| {
        error!("Gemini parse error: {}", e);
        crate::error::Error::provider(family, e)
      })?;

    let parts = response.candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts)
      .ok_or_else(|| {
        error!("No candidates in Gemini response");
        crate::error::Error::provider(
          family
        , "API response contained no candidates"
        )
      })?;

    Ok(parts.into_iter().filter_map(|p| p.text).collect())
}

#[derive(Debug, Clone)]
pub struct GeminiProvider
{   base_url: String
  , timeout: Option<std::time::Duration>
}

impl GeminiProvider
{   pub fn new(base_url: &str, timeout_secs: Option<u64>) -> Self
    {   GeminiProvider
        {   base_url: base_url.trim_end_matches('/').to_string()
          , timeout: timeout_secs.map(std::time::Duration::from_secs)
        }
    }
}

#[async_trait::async_trait]
impl super::ChatProvider for GeminiProvider
{   fn family(&self) -> crate::ProviderFamily
    {   crate::ProviderFamily::Gemini
    }

    async fn chat(
      &self
    , credential: &str
    , call: &super::ProviderCall
    ) -> Result<String, crate::error::Error>
    {   debug!("Gemini chat for model {}", call.model);
        let request = build_request(call)?;
        trace!("Gemini request: {:?}", request);

        let http_client = super::http_client(self.family(), self.timeout)?;
        let body = super::send_json(
          self.family()
        , http_client
            .post(format!(
              "{}/models/{}:generateContent",
              self.base_url, call.model
            ))
            .header("x-goog-api-key", credential)
            .header("Content-Type", "application/json")
            .json(&request)
        ).await?;

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::providers::{ChatProvider, ProviderCall};
    use crate::Message;

    fn call(messages: Vec<Message>) -> ProviderCall
    {   ProviderCall
        {   model: "gemini-1.5-pro".into()
          , messages
          , max_output_tokens: 50
        }
    }

    #[test]
    fn request_maps_roles_and_generation_config()
    {   let request = build_request(&call(vec![
          Message::system("Be brief")
        , Message::user("Hello")
        , Message::assistant("Hi there!")
        , Message::user("How are you?")
        ])).unwrap();

        let roles: Vec<&str> = request.contents.iter()
          .map(|c| c.role.as_str())
          .collect();
        assert_eq!(roles, vec!["user", "model", "user", "model", "user"]);
        assert_eq!(request.contents[1].parts[0].text, "Okay");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 50);
        assert_eq!(body["contents"][4]["parts"][0]["text"], "How are you?");
    }

    #[tokio::test]
    async fn invalid_role_fails_before_any_request()
    {   let provider = GeminiProvider::new("http://127.0.0.1:9", Some(2));
        let err = provider
          .chat("g-test", &call(vec![Message::new("invalid", "Hello")]))
          .await
          .unwrap_err();
        assert_eq!(err, crate::error::Error::InvalidRole("invalid".into()));
    }

    #[tokio::test]
    async fn transport_failure_keeps_the_key_out_of_the_error()
    {   let provider = GeminiProvider::new("http://127.0.0.1:9", Some(2));
        let err = provider
          .chat("SUPERSECRETKEY", &call(vec![Message::user("Hello")]))
          .await
          .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("Error processing request with Gemini: "));
        assert!(!text.contains("SUPERSECRETKEY"));
    }

    #[test]
    fn parses_candidate_text()
    {   let text = parse_response(
          r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"I am "},{"text":"well"}]},"finishReason":"STOP"}]}"#
        ).unwrap();
        assert_eq!(text, "I am well");

        let err = parse_response(r#"{"candidates":[]}"#).unwrap_err();
        assert!(err.to_string().starts_with(
          "Error processing request with Gemini: "
        ));
    }
}
