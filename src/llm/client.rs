//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::Completion;
use super::LanguageModel;
use super::StreamingResponse;
use crate::config::LlmConfig;
use crate::errors::AskRagError;
use crate::errors::Result;
use crate::models::ChatMessage;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Delta,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Client for `POST {endpoint}/chat/completions`
pub struct OpenAiChatClient {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AskRagError::HttpError(e.to_string()))?;

        info!(
            "LLM client using model {} at {}",
            config.llm_model, config.llm_endpoint
        );

        Ok(Self {
            endpoint: config.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: config.llm_key.clone().filter(|key| !key.is_empty()),
            model: config.llm_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!(
            "Calling chat completions API: {} messages, stream={}",
            messages.len(),
            stream
        );

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AskRagError::GenerationService(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AskRagError::GenerationService(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion> {
        let response = self.send(messages, false).await?;

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AskRagError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let text = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AskRagError::InvalidResponse("No answer in response".to_string()))?;

        Ok(Completion {
            text,
            total_tokens: result.usage.and_then(|usage| usage.total_tokens),
        })
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<StreamingResponse> {
        let response = self.send(messages, true).await?;
        let mut events = response.bytes_stream().eventsource();

        let stream = async_stream::stream! {
            let mut terminated = false;
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(AskRagError::GenerationService(format!("stream interrupted: {e}")));
                        terminated = true;
                        break;
                    }
                };

                if event.data.trim() == "[DONE]" {
                    terminated = true;
                    break;
                }

                match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
                    Ok(chunk) => {
                        let content = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content);
                        if let Some(text) = content.filter(|text| !text.is_empty()) {
                            yield Ok(text);
                        }
                    }
                    Err(e) => {
                        yield Err(AskRagError::InvalidResponse(format!("bad stream chunk: {e}")));
                        terminated = true;
                        break;
                    }
                }
            }
            if !terminated {
                yield Err(AskRagError::GenerationService(
                    "stream ended before [DONE]".to_string(),
                ));
            }
        };

        Ok(StreamingResponse::new(Box::pin(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: String) -> OpenAiChatClient {
        OpenAiChatClient::new(&LlmConfig {
            llm_endpoint: endpoint,
            llm_key: Some("sk-test".to_string()),
            llm_model: "gpt-test".to_string(),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_extracts_answer_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model":"gpt-test","stream":false}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"Ashish knows Rust."}}],"usage":{"total_tokens":42}}"#,
            )
            .create_async()
            .await;

        let completion = client(server.url())
            .complete(&[ChatMessage::user("What does Ashish know?")])
            .await
            .unwrap();

        assert_eq!(completion.text, "Ashish knows Rust.");
        assert_eq!(completion.total_tokens, Some(42));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_generation_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client(server.url())
            .complete(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AskRagError::GenerationService(_)));
    }

    #[tokio::test]
    async fn test_stream_yields_deltas_until_done() {
        let mut server = mockito::Server::new_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let response = client(server.url())
            .complete_stream(&[ChatMessage::user("hi")])
            .await
            .unwrap();
        let fragments: Vec<String> = response
            .into_stream()
            .map(|fragment| fragment.unwrap())
            .collect()
            .await;

        assert_eq!(fragments, vec!["Hello".to_string(), " there".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_closed_without_done_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" th\"}}]}\n\n",
        );
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let response = client(server.url())
            .complete_stream(&[ChatMessage::user("hi")])
            .await
            .unwrap();
        let items: Vec<Result<String>> = response.into_stream().collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_deref().unwrap(), "Hello");
        assert!(matches!(
            items.last(),
            Some(Err(AskRagError::GenerationService(ref msg))) if msg.contains("[DONE]")
        ));

        let response = client(server.url())
            .complete_stream(&[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert!(response.collect_all().await.is_err());
    }
}
