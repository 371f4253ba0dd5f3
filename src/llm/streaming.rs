//! Streaming response handling

use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;

use crate::errors::Result;

pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: TextStream,
}

impl StreamingResponse {
    pub fn new(stream: TextStream) -> Self {
        Self { stream }
    }

    /// A response that yields the given fragments in order
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        Self::new(Box::pin(futures::stream::iter(fragments.into_iter().map(Ok))))
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> TextStream {
        self.stream
    }
}
