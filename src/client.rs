use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use log::{debug, error, info, trace, warn};

/// Receives one `StreamEvent` per requested model.
pub type StreamCallback
  = Arc<dyn Fn(crate::StreamEvent) + Send + Sync>;

/// Limits and switches that travel with every model task.
#[derive(Debug, Clone, Copy)]
struct TaskLimits
{   max_input_bytes: usize
  , max_output_tokens: usize
  , moderation_enabled: bool
  , /// size and moderation already ran for the whole batch
    preflight_done: bool
}

/// Fan-out / fan-in front end over all provider adapters.
#[derive(Clone)]
pub struct ChatClient
{   api_keys: crate::ApiKeys
  , providers: HashMap<
      crate::ProviderFamily,
      Arc<dyn crate::providers::ChatProvider>
    >
  , moderation: Arc<dyn crate::moderation::ModerationGate>
}

impl ChatClient
{   /// Client with the HTTP adapters and OpenAI moderation.
    pub fn new(
      config: crate::ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   config.validate()?;
        debug!("Creating ChatClient with keys {:?}", config.api_keys);

        let providers = crate::ProviderFamily::ALL
          .iter()
          .map(|family| {
            let provider: Arc<dyn crate::providers::ChatProvider>
              = Arc::from(crate::providers::http_provider(
                  *family
                , config.endpoints.for_family(*family)
                , config.timeout_secs
                ));
            (*family, provider)
          })
          .collect();

        let moderation = Arc::new(
          crate::moderation::OpenAiModeration::new(
            &config.endpoints.moderation
          , config.timeout_secs
          )
        );

        Ok(ChatClient
        {   api_keys: config.api_keys
          , providers
          , moderation
        })
    }

    /// Replace the adapter for the provider's family.
    pub fn with_provider(
      mut self
    , provider: impl crate::providers::ChatProvider + 'static
    ) -> Self
    {   debug!("Overriding adapter for {}", provider.family());
        self.providers.insert(provider.family(), Arc::new(provider));
        self
    }

    pub fn with_moderation(
      mut self
    , gate: impl crate::moderation::ModerationGate + 'static
    ) -> Self
    {   self.moderation = Arc::new(gate);
        self
    }

    /// Every routable model id with its family.
    pub fn supported_models(&self)
      -> Vec<(crate::ProviderFamily, &'static str)>
    {   crate::router::all_supported_models()
    }

    /// Batch mode. Waits for every model and returns one outcome per
    /// model id.
    ///
    /// With shared messages, size and moderation failures abort the
    /// call. Per-model messages are handed to `create_chat_messages`.
    pub async fn create_chat(
      &self
    , request: &crate::ChatRequest
    ) -> Result<crate::AggregatedResult, crate::error::Error>
    {   let shared = match &request.messages
        {   crate::MessageSet::Shared(messages) => messages
          , crate::MessageSet::PerModel(_) => {
              return self.create_chat_messages(request).await;
            }
        };
        request.validate_shape()?;
        self.preflight(request, shared).await?;

        info!("Dispatching chat to {} models", request.models.len());
        let handles = request.models
          .iter()
          .map(|model| {
            let handle = self.spawn_model(
              model.clone()
            , shared.clone()
            , TaskLimits::from_request(request, true)
            );
            (model.clone(), handle)
          })
          .collect();

        Ok(collect_outcomes(handles).await)
    }

    /// Batch mode with one conversation per model. Size and
    /// moderation run inside each model's task, so their failures
    /// only mark that model.
    pub async fn create_chat_messages(
      &self
    , request: &crate::ChatRequest
    ) -> Result<crate::AggregatedResult, crate::error::Error>
    {   if !matches!(request.messages, crate::MessageSet::PerModel(_))
        {   error!("create_chat_messages given shared messages");
            return Err(crate::error::Error::InvalidRequest(
              "Messages must be an object with model-specific messages."
                .to_string()
            ));
        }
        request.validate_shape()?;
        let conversations = per_model_conversations(request)?;

        info!(
          "Dispatching per-model chat to {} models",
          request.models.len()
        );
        let handles = conversations
          .into_iter()
          .map(|(model, messages)| {
            let handle = self.spawn_model(
              model.clone()
            , messages
            , TaskLimits::from_request(request, false)
            );
            (model, handle)
          })
          .collect();

        Ok(collect_outcomes(handles).await)
    }

    /// Stream mode. Returns as soon as every model task is spawned;
    /// `on_response` then fires once per model, in completion order.
    pub async fn create_chat_streaming(
      &self
    , request: &crate::ChatRequest
    , on_response: Option<StreamCallback>
    ) -> Result<StreamHandle, crate::error::Error>
    {   let on_response = on_response.ok_or_else(|| {
          error!("Streaming requested without a callback");
          crate::error::Error::CallbackRequired
        })?;
        request.validate_shape()?;

        let jobs: Vec<(String, Vec<crate::Message>, TaskLimits)>
          = match &request.messages
          {   crate::MessageSet::Shared(shared) => {
                self.preflight(request, shared).await?;
                request.models
                  .iter()
                  .map(|model| (
                    model.clone()
                  , shared.clone()
                  , TaskLimits::from_request(request, true)
                  ))
                  .collect()
              }
            , crate::MessageSet::PerModel(_) => {
                per_model_conversations(request)?
                  .into_iter()
                  .map(|(model, messages)| (
                    model
                  , messages
                  , TaskLimits::from_request(request, false)
                  ))
                  .collect()
              }
          };

        info!("Streaming chat to {} models", jobs.len());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let expected = jobs.len();

        for (model, messages, limits) in jobs
        {   let handle = self.spawn_model(model.clone(), messages, limits);
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
              let result = settle(&model, handle).await;
              let event = crate::StreamEvent::from_result(model, result);
              trace!("Model {} settled at {}", event.model, event.timestamp);
              if let Err(unsent) = event_tx.send(event)
              {   error!(
                    "Stream collector gone, dropping event for {}",
                    unsent.0.model
                  );
              }
            });
        }
        drop(event_tx);

        let collector = tokio::spawn(
          run_stream_collector(event_rx, on_response)
        );

        Ok(StreamHandle
        {   expected
          , collector
        })
    }

    /// Size check and optional moderation over a shared conversation.
    async fn preflight(
      &self
    , request: &crate::ChatRequest
    , messages: &[crate::Message]
    ) -> Result<(), crate::error::Error>
    {   crate::validate::validate_input_size(
          messages
        , request.max_input_bytes
        )?;
        if request.moderation_enabled
        {   self.moderate(messages).await?;
        }
        Ok(())
    }

    async fn moderate(
      &self
    , messages: &[crate::Message]
    ) -> Result<(), crate::error::Error>
    {   if messages.is_empty()
        {   trace!("Nothing to moderate");
            return Ok(());
        }
        let credential = self.api_keys
          .require(crate::ProviderFamily::OpenAICompatible)?;
        self.moderation.check(credential, messages).await
    }

    fn spawn_model(
      &self
    , model: String
    , messages: Vec<crate::Message>
    , limits: TaskLimits
    ) -> tokio::task::JoinHandle<Result<String, crate::error::Error>>
    {   let client = self.clone();
        tokio::spawn(async move {
          client.run_model(&model, messages, limits).await
        })
    }

    /// Everything one model needs, from validation to reply text.
    async fn run_model(
      &self
    , model: &str
    , messages: Vec<crate::Message>
    , limits: TaskLimits
    ) -> Result<String, crate::error::Error>
    {   if !limits.preflight_done
        {   crate::validate::validate_input_size(
              &messages
            , limits.max_input_bytes
            )?;
            if limits.moderation_enabled
            {   self.moderate(&messages).await?;
            }
        }

        let family = crate::router::resolve(model)?;
        let credential = self.api_keys.require(family)?;
        let provider = self.providers
          .get(&family)
          .ok_or_else(|| {
            crate::error::Error::UnsupportedModel(model.to_string())
          })?;

        debug!("Calling {} for model {}", family, model);
        let call = crate::providers::ProviderCall
        {   model: model.to_string()
          , messages
          , max_output_tokens: limits.max_output_tokens
        };
        let reply = provider.chat(credential, &call).await;
        match &reply
        {   Ok(text) => debug!("{} replied with {} bytes", model, text.len())
          , Err(e) => warn!("{} failed: {}", model, e)
        }
        reply
    }
}

impl TaskLimits
{   fn from_request(
      request: &crate::ChatRequest
    , preflight_done: bool
    ) -> Self
    {   TaskLimits
        {   max_input_bytes: request.max_input_bytes
          , max_output_tokens: request.max_output_tokens
          , moderation_enabled: request.moderation_enabled
          , preflight_done
        }
    }
}

/// Pair every requested model with its own conversation, failing
/// before any dispatch if one is missing.
fn per_model_conversations(
  request: &crate::ChatRequest
) -> Result<Vec<(String, Vec<crate::Message>)>, crate::error::Error>
{   request.models
      .iter()
      .map(|model| {
        let messages = request.messages.for_model(model).map_err(|e| {
          error!("{}", e);
          e
        })?;
        Ok((model.clone(), messages.to_vec()))
      })
      .collect()
}

/// Join a model task, turning a panic or abort into a failure for
/// that model alone.
async fn settle(
  model: &str
, handle: tokio::task::JoinHandle<Result<String, crate::error::Error>>
) -> Result<String, crate::error::Error>
{   match handle.await
    {   Ok(result) => result
      , Err(e) => {
          error!("Task for {} did not complete: {}", model, e);
          Err(crate::error::Error::Other(
            crate::request::UNKNOWN_ERROR.to_string()
          ))
        }
    }
}

/// Wait for every task; outcomes are keyed by model in request order.
async fn collect_outcomes(
  handles: Vec<(
    String,
    tokio::task::JoinHandle<Result<String, crate::error::Error>>
  )>
) -> crate::AggregatedResult
{   let mut result = crate::AggregatedResult::new();
    for (model, handle) in handles
    {   let outcome: crate::ChatOutcome
          = settle(&model, handle).await.into();
        result.insert(model, outcome);
    }
    debug!("Collected {} outcomes", result.len());
    result
}

/// Deliver events to the callback as they arrive; ends once every
/// model task has dropped its sender.
async fn run_stream_collector(
  mut event_rx: mpsc::UnboundedReceiver<crate::StreamEvent>
, on_response: StreamCallback
) -> usize
{   let mut delivered = 0;
    while let Some(event) = event_rx.recv().await
    {   debug!("Delivering {:?} event for {}", event.status, event.model);
        let model = event.model.clone();
        let callback = on_response.clone();
        let outcome = std::panic::catch_unwind(
          std::panic::AssertUnwindSafe(move || callback(event))
        );
        if outcome.is_err()
        {   error!("Stream callback panicked for {}", model);
        }
        delivered += 1;
    }
    debug!("Stream finished after {} events", delivered);
    delivered
}

/// Handle to a running stream. Dropping it does not cancel anything.
pub struct StreamHandle
{   expected: usize
  , collector: tokio::task::JoinHandle<usize>
}

impl StreamHandle
{   /// Number of events that will be delivered.
    pub fn expected(&self) -> usize
    {   self.expected
    }

    /// Wait until every event has been handed to the callback.
    /// Returns how many were delivered.
    pub async fn finished(self) -> Result<usize, crate::error::Error>
    {   self.collector.await.map_err(|e| {
          error!("Stream collector failed: {}", e);
          crate::error::Error::Other(e.to_string())
        })
    }
}
