//! Rewrites provider-agnostic messages for providers that cannot
//! carry a system role inline.

use log::{debug, error};

/// Acknowledgment inserted after each rewritten system message.
pub const ACKNOWLEDGMENT: &str = "Okay";

/// Expand every system message into a user message with the same
/// content followed by an acknowledgment from the assistant side.
///
/// Only `Anthropic` and `Gemini` are valid targets; the other
/// families take system messages natively.
pub fn transform_messages(
  messages: &[crate::Message]
, target: crate::ProviderFamily
) -> Result<Vec<crate::Message>, crate::error::Error>
{   let ack_role = match target
    {   crate::ProviderFamily::Anthropic => crate::ROLE_ASSISTANT
      , crate::ProviderFamily::Gemini => crate::ROLE_MODEL
      , other => {
          error!("No message transform for {}", other);
          return Err(crate::error::Error::InvalidTarget(
            other.target_name().to_string()
          ));
        }
    };

    let mut transformed = Vec::with_capacity(messages.len());
    for message in messages
    {   if message.role == crate::ROLE_SYSTEM
        {   transformed.push(crate::Message::new(
              crate::ROLE_USER
            , &message.content
            ));
            transformed.push(crate::Message::new(
              ack_role
            , ACKNOWLEDGMENT
            ));
        } else
        {   transformed.push(message.clone());
        }
    }
    debug!(
      "Transformed {} messages into {} for {}",
      messages.len(), transformed.len(), target.target_name()
    );
    Ok(transformed)
}

/// Map roles onto Gemini's vocabulary: `assistant` becomes `model`,
/// anything outside user/model/function/system is an error.
pub fn to_gemini_roles(
  messages: Vec<crate::Message>
) -> Result<Vec<crate::Message>, crate::error::Error>
{   messages.into_iter()
      .map(|mut message| {
        match message.role.as_str()
        {   crate::ROLE_ASSISTANT => {
              message.role = crate::ROLE_MODEL.to_string();
              Ok(message)
            }
          , crate::ROLE_USER
          | crate::ROLE_MODEL
          | crate::ROLE_FUNCTION
          | crate::ROLE_SYSTEM => Ok(message)
          , other => {
              error!("Invalid role for Gemini: {}", other);
              Err(crate::error::Error::InvalidRole(other.to_string()))
            }
        }
      })
      .collect()
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::{Message, ProviderFamily};

    #[test]
    fn rejects_families_without_transform()
    {   let messages = vec![Message::user("Hello")];
        let err = transform_messages(
          &messages
        , ProviderFamily::OpenAICompatible
        ).unwrap_err();
        assert_eq!(
          err.to_string()
        , "Invalid target: openai. Supported targets are \"anthropic\" and \"gemini\"."
        );
        assert!(transform_messages(
          &messages
        , ProviderFamily::PerplexityCompatible
        ).is_err());
    }

    #[test]
    fn empty_and_system_free_input_is_unchanged()
    {   let messages = vec![
          Message::user("Hello")
        , Message::assistant("Hi there!")
        ];
        for target in [ProviderFamily::Anthropic, ProviderFamily::Gemini]
        {   assert!(transform_messages(&[], target).unwrap().is_empty());
            assert_eq!(
              transform_messages(&messages, target).unwrap()
            , messages
            );
        }
    }

    #[test]
    fn system_message_expands_for_anthropic()
    {   let messages = vec![
          Message::system("You are a helpful assistant")
        , Message::user("Hello")
        ];
        let result = transform_messages(
          &messages
        , ProviderFamily::Anthropic
        ).unwrap();
        assert_eq!(result, vec![
          Message::user("You are a helpful assistant")
        , Message::assistant("Okay")
        , Message::user("Hello")
        ]);
    }

    #[test]
    fn each_system_message_expands_in_place_for_gemini()
    {   let messages = vec![
          Message::user("first")
        , Message::system("rule one")
        , Message::assistant("reply")
        , Message::system("rule two")
        ];
        let result = transform_messages(
          &messages
        , ProviderFamily::Gemini
        ).unwrap();
        assert_eq!(result.len(), messages.len() + 2);
        assert_eq!(result[0], Message::user("first"));
        assert_eq!(result[1], Message::user("rule one"));
        assert_eq!(result[2], Message::new("model", "Okay"));
        assert_eq!(result[3], Message::assistant("reply"));
        assert_eq!(result[4], Message::user("rule two"));
        assert_eq!(result[5], Message::new("model", "Okay"));
        // input untouched
        assert_eq!(messages[1].role, "system");
    }

    #[test]
    fn gemini_roles_remap_assistant()
    {   let result = to_gemini_roles(vec![
          Message::user("Hello")
        , Message::assistant("Hi there!")
        , Message::new("function", "{}")
        ]).unwrap();
        assert_eq!(result[1].role, "model");
        assert_eq!(result[2].role, "function");
    }

    #[test]
    fn gemini_rejects_unknown_role()
    {   let err = to_gemini_roles(vec![
          Message::new("invalid", "Hello")
        ]).unwrap_err();
        assert_eq!(
          err.to_string()
        , "Invalid role \"invalid\". Valid roles are: [\"user\", \"model\", \"function\", \"system\"]."
        );
    }
}
