//! Generate-content adapter (Google Gemini).
//!
//! Gemini takes a single text part; a system prompt is folded in front of
//! the user prompt. The key travels in the query string, so reqwest errors
//! are stripped of their URL before they reach a log line.

use serde::{Deserialize, Serialize};

use super::chat::truncate;
use super::{ApiCredential, ProviderError};

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Fold the optional system prompt into the single text part.
fn request_text(prompt: &str, system_prompt: Option<&str>) -> String {
    match system_prompt.filter(|s| !s.is_empty()) {
        Some(system) => format!("{system}\n\n{prompt}"),
        None => prompt.to_string(),
    }
}

/// Send one prompt and return `candidates[0].content.parts[0].text`.
pub(super) async fn generate(
    client: &reqwest::Client,
    base_url: &str,
    credential: &ApiCredential,
    model: &str,
    prompt: &str,
    system_prompt: Option<&str>,
) -> Result<String, ProviderError> {
    let request = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: request_text(prompt, system_prompt),
            }],
        }],
    };

    let url = format!("{}/{}:generateContent", base_url.trim_end_matches('/'), model);

    // SECURITY: Only expose the credential here, at the point of use
    let response = client
        .post(url)
        .query(&[("key", credential.expose())])
        .json(&request)
        .send()
        .await
        .map_err(|e| ProviderError::HttpError(e.without_url().to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message: truncate(&message, 200),
        });
    }

    let body: GenerateResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::MalformedResponse(e.without_url().to_string()))?;

    body.candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            ProviderError::MalformedResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
}
