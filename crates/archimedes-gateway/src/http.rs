//! Shared reqwest plumbing.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::GatewayError;

/// Longest error body kept in a diagnostic.
const MAX_ERROR_BODY: usize = 300;

pub(crate) fn build_client(provider: &'static str, timeout: Duration) -> Result<Client, GatewayError> {
  Client::builder()
    .timeout(timeout)
    .build()
    .map_err(|e| GatewayError::ClientInit {
      provider,
      message: error_chain(&e),
    })
}

pub(crate) fn transport_error(provider: &'static str, e: reqwest::Error) -> GatewayError {
  GatewayError::Transport {
    provider,
    timed_out: e.is_timeout(),
    message: error_chain(&e),
  }
}

/// Read the body of a response, failing on any status outside 200-299.
pub(crate) async fn read_success_body(
  provider: &'static str,
  response: Response,
) -> Result<String, GatewayError> {
  let status = response.status();
  let body = response
    .text()
    .await
    .map_err(|e| transport_error(provider, e))?;

  if !status.is_success() {
    return Err(GatewayError::Status {
      provider,
      status: status.as_u16(),
      body: truncate(body.trim(), MAX_ERROR_BODY),
    });
  }

  Ok(body)
}

/// Render an error with its source chain, e.g. "error sending request: connection refused".
fn error_chain(e: &dyn std::error::Error) -> String {
  let mut message = e.to_string();
  let mut source = e.source();
  while let Some(inner) = source {
    let text = inner.to_string();
    if !message.contains(&text) {
      message.push_str(": ");
      message.push_str(&text);
    }
    source = inner.source();
  }
  message
}

fn truncate(text: &str, max: usize) -> String {
  if text.chars().count() <= max {
    return text.to_string();
  }
  let cut: String = text.chars().take(max).collect();
  format!("{}…", cut)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("abcdef", 3), "abc…");
  }

  #[test]
  fn test_error_chain_includes_sources() {
    let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    let outer = std::io::Error::other(inner);
    assert!(error_chain(&outer).contains("connection refused"));
  }
}
