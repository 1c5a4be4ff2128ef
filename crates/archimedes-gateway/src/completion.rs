//! Text-completion gateway.

use std::sync::Arc;

use archimedes_config::CompletionSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::http::{build_client, read_success_body, transport_error};

const PROVIDER: &str = "Mistral";

/// One system + user instruction in, generated text out.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
  async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError>;
}

/// Connect the completion gateway described by `settings`.
///
/// Never fails: if the credential is missing or the client cannot be built,
/// the returned gateway reports that error on every call.
pub fn connect_completion(settings: &CompletionSettings) -> Arc<dyn CompletionGateway> {
  match MistralGateway::new(settings) {
    Ok(gateway) => {
      debug!(model = gateway.model(), "completion gateway ready");
      Arc::new(gateway)
    }
    Err(error) => {
      warn!(error = %error, "completion gateway unavailable");
      Arc::new(UnavailableCompletion::new(error))
    }
  }
}

/// Chat completions against the Mistral API.
pub struct MistralGateway {
  client: Client,
  endpoint: String,
  api_key: String,
  model: String,
  temperature: f32,
}

impl MistralGateway {
  pub fn new(settings: &CompletionSettings) -> Result<Self, GatewayError> {
    let api_key = settings
      .api_key
      .clone()
      .ok_or(GatewayError::MissingCredential {
        provider: PROVIDER,
        env_var: settings.api_key_env,
      })?;

    Ok(Self {
      client: build_client(PROVIDER, settings.timeout)?,
      endpoint: format!("{}/v1/chat/completions", settings.base_url),
      api_key,
      model: settings.model.clone(),
      temperature: settings.temperature,
    })
  }

  pub fn model(&self) -> &str {
    &self.model
  }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: [ChatMessage<'a>; 2],
  temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role: &'static str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  #[serde(default)]
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

#[async_trait]
impl CompletionGateway for MistralGateway {
  async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError> {
    let request = ChatRequest {
      model: &self.model,
      messages: [
        ChatMessage {
          role: "system",
          content: system,
        },
        ChatMessage {
          role: "user",
          content: user,
        },
      ],
      temperature: self.temperature,
    };

    debug!(model = %self.model, endpoint = %self.endpoint, "sending chat completion");

    let response = self
      .client
      .post(&self.endpoint)
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| transport_error(PROVIDER, e))?;

    let body = read_success_body(PROVIDER, response).await?;
    parse_chat_response(&body)
  }
}

/// Extract the first choice's text from a chat completion body.
fn parse_chat_response(body: &str) -> Result<String, GatewayError> {
  let response: ChatResponse =
    serde_json::from_str(body).map_err(|e| GatewayError::InvalidResponse {
      provider: PROVIDER,
      message: e.to_string(),
    })?;

  response
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .filter(|text| !text.trim().is_empty())
    .ok_or_else(|| GatewayError::InvalidResponse {
      provider: PROVIDER,
      message: "response contained no completion text".to_string(),
    })
}

/// Stand-in for a gateway that could not be constructed.
#[derive(Debug, Clone)]
pub struct UnavailableCompletion {
  error: GatewayError,
}

impl UnavailableCompletion {
  pub fn new(error: GatewayError) -> Self {
    Self { error }
  }
}

#[async_trait]
impl CompletionGateway for UnavailableCompletion {
  async fn complete(&self, _system: &str, _user: &str) -> Result<String, GatewayError> {
    Err(self.error.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use archimedes_config::Settings;

  #[test]
  fn test_parse_chat_response() {
    let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hello there"}}]}"#;
    assert_eq!(parse_chat_response(body).unwrap(), "Hello there");
  }

  #[test]
  fn test_parse_chat_response_without_choices() {
    let err = parse_chat_response(r#"{"choices":[]}"#).unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse { .. }));

    let err = parse_chat_response(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
  }

  #[test]
  fn test_parse_chat_response_rejects_garbage() {
    let err = parse_chat_response("<html>bad gateway</html>").unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
  }

  #[test]
  fn test_missing_credential_detected_at_construction() {
    let settings = Settings::default().completion;
    let err = MistralGateway::new(&settings).err().unwrap();
    assert_eq!(
      err,
      GatewayError::MissingCredential {
        provider: "Mistral",
        env_var: "MISTRAL_API_KEY",
      }
    );
    assert!(err.is_configuration());
  }

  #[tokio::test]
  async fn test_connect_without_credential_fails_every_call() {
    let gateway = connect_completion(&Settings::default().completion);

    for _ in 0..2 {
      let err = gateway.complete("system", "user").await.unwrap_err();
      assert!(err.to_string().contains("MISTRAL_API_KEY"));
    }
  }
}
