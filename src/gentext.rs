//! Generated encouragement and the Fairy Godmother chat helper.
//!
//! Both talk to the Gemini `generateContent` REST endpoint. Callers never see
//! an error from this module: every failure is logged and replaced by a fixed
//! friendly message.

use crate::config::GenTextConfig;
use crate::quest::{Message, Mood, Sender};
use crate::{Error, Result};
use log::{debug, warn};
use serde_json::{json, Value};
use std::time::Duration;

/// Chat reply used when the service answers with no text
pub const CHAT_EMPTY_FALLBACK: &str = "Magic is everywhere! ✨";

/// Chat reply used when the request fails
pub const CHAT_ERROR_FALLBACK: &str = "Oh my! The magic dust settled... try again? ✨";

fn fairy_godmother_instruction(child_name: &str) -> String {
    format!(
        "You are a kind, magical Fairy Godmother helping a young princess named {child_name} \
         with her reading. Be warm, encouraging and use simple words. Use emojis like ✨, 🦋, 👑. \
         Keep answers under 2 sentences."
    )
}

/// Motivational message used when the service cannot be reached
#[must_use]
pub fn motivation_fallback(child_name: &str) -> String {
    format!("Keep shining, Princess {child_name}!")
}

/// Motivational message for `mood`, falling back when no client can be built
pub async fn motivate(config: &GenTextConfig, mood: Mood) -> String {
    match GeminiClient::new(config) {
        Ok(client) => client.motivational_message(mood).await,
        Err(e) => {
            warn!("Text generation unavailable: {}", e);
            motivation_fallback(&config.child_name)
        }
    }
}

/// Pull the first candidate's text out of a `generateContent` response
#[must_use]
pub fn extract_text(response: &Value) -> Option<String> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
}

/// Client for the Gemini text generation API
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    child_name: String,
}

impl GeminiClient {
    /// Create a client, reading the API key from the configured environment variable
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &GenTextConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("{} is not set, generated messages will use fallbacks", config.api_key_env);
        }
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn with_api_key(config: &GenTextConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            child_name: config.child_name.clone(),
        })
    }

    /// Name used in prompts and fallbacks
    #[must_use]
    pub fn child_name(&self) -> &str {
        &self.child_name
    }

    /// Send one `generateContent` request and return the reply text.
    ///
    /// A reply without text yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured, the request fails or the
    /// service reports an error
    pub async fn generate(&self, contents: Value, system_instruction: Option<&str>) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::TextGeneration("API key not set".to_string()))?;

        let mut body = json!({ "contents": contents });
        if let Some(instruction) = system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
        }

        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);
        debug!("POST {}", url);

        // Keep the key out of the URL and out of request errors
        let response: Value = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        if let Some(error) = response.get("error") {
            return Err(Error::TextGeneration(format!("Gemini API error: {error}")));
        }

        Ok(extract_text(&response).unwrap_or_default())
    }

    /// A short encouraging message for a reader who just caught a butterfly
    pub async fn motivational_message(&self, mood: Mood) -> String {
        let prompt = format!(
            "Generate a very short, sweet, princess-themed motivational message (under 15 words) \
             for a little girl named {} who just finished a reading task and feels {}. \
             Do not use quotes.",
            self.child_name,
            mood.to_string().to_lowercase()
        );
        let contents = json!([{ "role": "user", "parts": [{ "text": prompt }] }]);

        match self.generate(contents, None).await {
            Ok(text) if text.trim().is_empty() => format!("You are doing great, Princess {}!", self.child_name),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Motivational message failed: {}", e);
                motivation_fallback(&self.child_name)
            }
        }
    }
}

fn is_fallback(text: &str) -> bool {
    text == CHAT_EMPTY_FALLBACK || text == CHAT_ERROR_FALLBACK
}

/// Speaker of a chat turn as the API names it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    User,
    Model,
}

impl Role {
    const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// Running conversation with the Fairy Godmother
pub struct HelperChat {
    client: GeminiClient,
    history: Vec<(Role, String)>,
}

impl HelperChat {
    /// Start a fresh conversation
    #[must_use]
    pub const fn new(client: GeminiClient) -> Self {
        Self {
            client,
            history: Vec::new(),
        }
    }

    /// Resume a conversation from stored chat messages.
    ///
    /// Helper messages before the reader's first message (the welcome) are not
    /// sent back to the service, nor are exchanges answered with a fallback.
    #[must_use]
    pub fn with_history(client: GeminiClient, messages: &[Message]) -> Self {
        let mut history: Vec<(Role, String)> = Vec::new();
        for message in messages {
            match message.sender {
                Sender::User => history.push((Role::User, message.text.clone())),
                Sender::Helper if history.is_empty() => {}
                Sender::Helper if is_fallback(&message.text) => {
                    if history.last().is_some_and(|(role, _)| *role == Role::User) {
                        history.pop();
                    }
                }
                Sender::Helper => history.push((Role::Model, message.text.clone())),
                Sender::System => {}
            }
        }

        Self { client, history }
    }

    /// Greeting shown when the chat opens
    #[must_use]
    pub fn welcome(&self) -> String {
        format!(
            "Hello Princess {}! I am your Fairy Godmother. How can I help you with your reading quest today? ✨",
            self.client.child_name()
        )
    }

    /// Number of turns in the conversation
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether nothing has been said yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Say something to the Fairy Godmother and get her reply.
    ///
    /// Only a successful, non-empty exchange is added to the conversation.
    pub async fn send(&mut self, text: &str) -> String {
        let mut contents: Vec<Value> = self
            .history
            .iter()
            .map(|(role, text)| json!({ "role": role.as_str(), "parts": [{ "text": text }] }))
            .collect();
        contents.push(json!({ "role": Role::User.as_str(), "parts": [{ "text": text }] }));

        let instruction = fairy_godmother_instruction(self.client.child_name());
        match self.client.generate(Value::Array(contents), Some(&instruction)).await
        {
            Ok(reply) if reply.trim().is_empty() => CHAT_EMPTY_FALLBACK.to_string(),
            Ok(reply) => {
                let reply = reply.trim().to_string();
                self.history.push((Role::User, text.to_string()));
                self.history.push((Role::Model, reply.clone()));
                reply
            }
            Err(e) => {
                warn!("Helper chat failed: {}", e);
                CHAT_ERROR_FALLBACK.to_string()
            }
        }
    }
}
