//! Gateway tests against a local stub HTTP server.

use std::time::Duration;

use archimedes_config::{CompletionSettings, SearchSettings, Settings};
use archimedes_gateway::{
  CompletionGateway, GatewayError, MistralGateway, SearchGateway, SerperGateway,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A server that answers exactly one request and hands back what it received.
struct Stub {
  base_url: String,
  request: JoinHandle<String>,
}

async fn serve_once(status: u16, body: &'static str) -> Stub {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();

  let request = tokio::spawn(async move {
    let (mut socket, _) = listener.accept().await.unwrap();
    let request = read_request(&mut socket).await;
    let response = format!(
      "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
      status,
      body.len(),
      body
    );
    socket.write_all(response.as_bytes()).await.unwrap();
    let _ = socket.shutdown().await;
    request
  });

  Stub {
    base_url: format!("http://{}", addr),
    request,
  }
}

/// A server that accepts a connection and never answers.
async fn serve_silence() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    let (_socket, _) = listener.accept().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
  });
  format!("http://{}", addr)
}

/// An address nothing is listening on.
async fn closed_port() -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{}", addr)
}

async fn read_request(socket: &mut TcpStream) -> String {
  let mut buf = Vec::new();
  let mut chunk = [0u8; 4096];
  loop {
    let n = socket.read(&mut chunk).await.unwrap();
    if n == 0 {
      break;
    }
    buf.extend_from_slice(&chunk[..n]);

    if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
      let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
      let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
      if buf.len() >= end + 4 + content_length {
        break;
      }
    }
  }
  String::from_utf8_lossy(&buf).to_string()
}

fn completion_settings(base_url: String) -> CompletionSettings {
  let mut settings = Settings::default().completion;
  settings.api_key = Some("test-key".to_string());
  settings.base_url = base_url;
  settings.timeout = Duration::from_secs(5);
  settings
}

fn search_settings(base_url: String) -> SearchSettings {
  let mut settings = Settings::default().search;
  settings.api_key = Some("search-key".to_string());
  settings.base_url = base_url;
  settings.timeout = Duration::from_secs(5);
  settings
}

#[tokio::test]
async fn test_completion_success() {
  let stub = serve_once(
    200,
    r###"{"choices":[{"message":{"role":"assistant","content":"## Market Research\nLots of users."}}]}"###,
  )
  .await;
  let gateway = MistralGateway::new(&completion_settings(stub.base_url.clone())).unwrap();

  let text = gateway
    .complete("You are an analyst.", "Project Idea: gym app")
    .await
    .unwrap();
  assert_eq!(text, "## Market Research\nLots of users.");

  let request = stub.request.await.unwrap();
  let lowered = request.to_lowercase();
  assert!(request.starts_with("POST /v1/chat/completions"));
  assert!(lowered.contains("authorization: bearer test-key"));
  assert!(request.contains(r#""model":"mistral-small-latest""#));
  assert!(request.contains(r#""role":"system","content":"You are an analyst.""#));
  assert!(request.contains(r#""role":"user","content":"Project Idea: gym app""#));
}

#[tokio::test]
async fn test_completion_http_error_is_a_value() {
  let stub = serve_once(401, r#"{"message":"Unauthorized"}"#).await;
  let gateway = MistralGateway::new(&completion_settings(stub.base_url.clone())).unwrap();

  let err = gateway.complete("s", "u").await.unwrap_err();
  match &err {
    GatewayError::Status { status, body, .. } => {
      assert_eq!(*status, 401);
      assert!(body.contains("Unauthorized"));
    }
    other => panic!("expected status error, got {:?}", other),
  }
  assert!(err.to_string().starts_with("Mistral returned HTTP 401"));
}

#[tokio::test]
async fn test_completion_transport_error_is_a_value() {
  let gateway = MistralGateway::new(&completion_settings(closed_port().await)).unwrap();

  let err = gateway.complete("s", "u").await.unwrap_err();
  assert!(matches!(
    err,
    GatewayError::Transport {
      timed_out: false,
      ..
    }
  ));
  assert!(!err.is_configuration());
}

#[tokio::test]
async fn test_completion_timeout_is_a_value() {
  let mut settings = completion_settings(serve_silence().await);
  settings.timeout = Duration::from_millis(200);
  let gateway = MistralGateway::new(&settings).unwrap();

  let err = gateway.complete("s", "u").await.unwrap_err();
  assert!(matches!(
    err,
    GatewayError::Transport {
      timed_out: true,
      ..
    }
  ));
}

#[tokio::test]
async fn test_search_success() {
  let stub = serve_once(
    200,
    r#"{"organic":[{"title":"Workout apps 2024","link":"https://example.com","snippet":"Market grew 20%."}]}"#,
  )
  .await;
  let gateway = SerperGateway::new(&search_settings(stub.base_url.clone())).unwrap();

  let results = gateway.search("fitness apps").await.unwrap();
  assert_eq!(results.query, "fitness apps");
  assert_eq!(results.hits().len(), 1);
  assert!(results.to_context().contains("Workout apps 2024"));

  let request = stub.request.await.unwrap();
  assert!(request.starts_with("POST /search"));
  assert!(request.to_lowercase().contains("x-api-key: search-key"));
  assert!(request.contains(r#""q":"fitness apps""#));
}

#[tokio::test]
async fn test_search_non_2xx_is_a_value() {
  let stub = serve_once(503, r#"{"error":"overloaded"}"#).await;
  let gateway = SerperGateway::new(&search_settings(stub.base_url.clone())).unwrap();

  let err = gateway.search("anything").await.unwrap_err();
  assert!(matches!(err, GatewayError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_search_transport_error_is_a_value() {
  let gateway = SerperGateway::new(&search_settings(closed_port().await)).unwrap();

  let err = gateway.search("anything").await.unwrap_err();
  assert!(matches!(err, GatewayError::Transport { .. }));
}

#[tokio::test]
async fn test_search_without_credential() {
  let err = SerperGateway::new(&Settings::default().search).err().unwrap();
  assert_eq!(err.to_string(), "Serper is not configured: SERPER_API_KEY is not set");
}
