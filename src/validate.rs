//! Input size budget

use log::{trace, warn};

/// Summed UTF-8 byte length of every message's content. Roles are
/// not counted.
pub fn input_size(messages: &[crate::Message]) -> usize
{   messages.iter().map(|m| m.content.len()).sum()
}

/// Reject `messages` when their content is over `max_input_bytes`.
pub fn validate_input_size(
  messages: &[crate::Message]
, max_input_bytes: usize
) -> Result<(), crate::error::Error>
{   let size = input_size(messages);
    trace!("Input size {} bytes, limit {}", size, max_input_bytes);
    if size > max_input_bytes
    {   warn!(
          "Input of {} bytes rejected, limit {}",
          size, max_input_bytes
        );
        return Err(crate::error::Error::InputTooLarge
        {   size_bytes: size
          , limit_bytes: max_input_bytes
        });
    }
    Ok(())
}
