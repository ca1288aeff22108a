//! Tests for the text generation client against a local stub server

use royal_reading_quest::{
    config::GenTextConfig,
    gentext::{GeminiClient, HelperChat, CHAT_EMPTY_FALLBACK, CHAT_ERROR_FALLBACK},
    quest::Mood,
};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

fn reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

fn config(endpoint: &str) -> GenTextConfig {
    GenTextConfig {
        endpoint: endpoint.to_string(),
        timeout_secs: 5,
        ..GenTextConfig::default()
    }
}

fn client(endpoint: &str) -> GeminiClient {
    GeminiClient::with_api_key(&config(endpoint), Some("test-key".to_string())).unwrap()
}

/// Serve the given JSON bodies to consecutive requests; yields the request heads and bodies
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<(String, Value)>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for body in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        requests
    });

    (endpoint, handle)
}

async fn read_request(socket: &mut TcpStream) -> (String, Value) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let length = head
                .lines()
                .find_map(|line| line.to_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);

            let body_start = end + 4;
            if buf.len() >= body_start + length {
                let body = serde_json::from_slice(&buf[body_start..body_start + length]).unwrap_or(Value::Null);
                return (head, body);
            }
        }
    }

    (String::new(), Value::Null)
}

#[tokio::test]
async fn test_motivational_message_uses_reply() {
    let (endpoint, server) = serve(vec![reply("  You read like a true princess! 👑  ")]).await;

    let message = client(&endpoint).motivational_message(Mood::Tired).await;
    assert_eq!(message, "You read like a true princess! 👑");

    let requests = server.await.unwrap();
    let (head, body) = &requests[0];
    let request_line = head.lines().next().unwrap();
    assert!(request_line.starts_with("POST /v1beta/models/gemini-2.5-flash:generateContent "));
    assert!(!request_line.contains("test-key"));
    assert!(head.lines().any(|line| line.to_lowercase() == "x-goog-api-key: test-key"));

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Celine"));
    assert!(prompt.contains("tired"));
    assert!(prompt.contains("under 15 words"));
}

#[tokio::test]
async fn test_empty_reply_uses_encouragement() {
    let (endpoint, server) = serve(vec![r#"{"candidates":[]}"#.to_string()]).await;

    let message = client(&endpoint).motivational_message(Mood::Happy).await;
    assert_eq!(message, "You are doing great, Princess Celine!");
    server.await.unwrap();
}

#[tokio::test]
async fn test_api_error_uses_fallback() {
    let (endpoint, server) = serve(vec![r#"{"error":{"code":400,"message":"API key not valid"}}"#.to_string()]).await;

    let message = client(&endpoint).motivational_message(Mood::Okay).await;
    assert_eq!(message, "Keep shining, Princess Celine!");
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_service_uses_fallback() {
    // Nothing listens on the discard port
    let message = client("http://127.0.0.1:9").motivational_message(Mood::Happy).await;
    assert_eq!(message, "Keep shining, Princess Celine!");
}

#[tokio::test]
async fn test_chat_keeps_conversation() {
    let (endpoint, server) = serve(vec![
        reply("Dragons are big and friendly! 🐉"),
        reply("Yes, they love stories too! ✨"),
    ])
    .await;

    let mut chat = HelperChat::new(client(&endpoint));
    assert_eq!(chat.send("What is a dragon?").await, "Dragons are big and friendly! 🐉");
    assert_eq!(chat.send("Do they read?").await, "Yes, they love stories too! ✨");
    assert_eq!(chat.len(), 4);

    let requests = server.await.unwrap();
    let (_, second) = &requests[1];
    let contents = second["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "Do they read?");

    let instruction = second["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(instruction.contains("Fairy Godmother"));
}

#[tokio::test]
async fn test_chat_fallbacks_leave_conversation_unchanged() {
    let (endpoint, server) = serve(vec![
        r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#.to_string(),
        r#"{"error":{"code":503,"message":"overloaded"}}"#.to_string(),
    ])
    .await;

    let mut chat = HelperChat::new(client(&endpoint));
    assert_eq!(chat.send("Hello?").await, CHAT_EMPTY_FALLBACK);
    assert_eq!(chat.send("Hello again?").await, CHAT_ERROR_FALLBACK);
    assert!(chat.is_empty());

    let requests = server.await.unwrap();
    // The failed first turn is not resent
    assert_eq!(requests[1].1["contents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_api_key_is_a_failure() {
    let config = GenTextConfig {
        api_key_env: "ROYAL_QUEST_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
        ..config("http://127.0.0.1:9")
    };
    let client = GeminiClient::new(&config).unwrap();

    assert_eq!(client.motivational_message(Mood::Happy).await, "Keep shining, Princess Celine!");
    assert_eq!(HelperChat::new(client).send("Hi").await, CHAT_ERROR_FALLBACK);
}

#[tokio::test]
async fn test_chat_uses_configured_child_name() {
    let (endpoint, server) = serve(vec![reply("Hello Aurora! ✨")]).await;
    let config = GenTextConfig {
        child_name: "Aurora".to_string(),
        ..config(&endpoint)
    };
    let mut chat = HelperChat::new(GeminiClient::with_api_key(&config, Some("test-key".to_string())).unwrap());

    let welcome = chat.welcome();
    assert!(welcome.starts_with("Hello Princess Aurora!"));
    assert!(!welcome.contains("Celine"));

    assert_eq!(chat.send("Hi!").await, "Hello Aurora! ✨");

    let requests = server.await.unwrap();
    let instruction = requests[0].1["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(instruction.contains("princess named Aurora"));
    assert!(!instruction.contains("Celine"));
}
