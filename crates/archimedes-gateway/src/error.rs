use thiserror::Error;

/// Errors produced at a gateway boundary.
///
/// Messages are meant to be shown to a user in place of generated content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
  #[error("{provider} is not configured: {env_var} is not set")]
  MissingCredential {
    provider: &'static str,
    env_var: &'static str,
  },

  #[error("failed to initialize {provider} client: {message}")]
  ClientInit {
    provider: &'static str,
    message: String,
  },

  #[error("{provider} request failed: {message}")]
  Transport {
    provider: &'static str,
    message: String,
    timed_out: bool,
  },

  #[error("{provider} returned HTTP {status}: {body}")]
  Status {
    provider: &'static str,
    status: u16,
    body: String,
  },

  #[error("{provider} returned an unexpected response: {message}")]
  InvalidResponse {
    provider: &'static str,
    message: String,
  },
}

impl GatewayError {
  /// Whether this error comes from configuration rather than the network.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      GatewayError::MissingCredential { .. } | GatewayError::ClientInit { .. }
    )
  }
}
