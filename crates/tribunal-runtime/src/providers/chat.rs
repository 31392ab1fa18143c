//! Chat-completions adapter (OpenAI, Groq, DeepSeek).

use serde::{Deserialize, Serialize};

use super::{ApiCredential, ChatMessage, ProviderError};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Send one prompt and return `choices[0].message.content`.
pub(super) async fn complete(
    client: &reqwest::Client,
    base_url: &str,
    credential: &ApiCredential,
    model: &str,
    prompt: &str,
    system_prompt: Option<&str>,
) -> Result<String, ProviderError> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    let request = ChatRequest { model, messages };

    // SECURITY: Only expose the credential here, at the point of use
    let response = client
        .post(format!("{}/chat/completions", base_url.trim_end_matches('/')))
        .bearer_auth(credential.expose())
        .json(&request)
        .send()
        .await
        .map_err(|e| ProviderError::HttpError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message: truncate(&message, 200),
        });
    }

    let body: ChatResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            ProviderError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

pub(super) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
