use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::ToolCall;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Chat stubs only answer chat calls; the other provider surfaces refuse.
macro_rules! chat_only_provider {
    ($name:ty) => {
        #[async_trait]
        impl CompletionProvider for $name {
            async fn complete(
                &self,
                _req: &CompletionRequest,
                _json_schema: Option<StructuredOutputFormat>,
            ) -> Result<CompletionResponse, LLMError> {
                Err(LLMError::ProviderError("completion not supported".to_string()))
            }
        }

        #[async_trait]
        impl EmbeddingProvider for $name {
            async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
                Err(LLMError::ProviderError("embedding not supported".to_string()))
            }
        }

        #[async_trait]
        impl ModelsProvider for $name {}

        impl LLMProvider for $name {}
    };
}

#[derive(Debug, Clone)]
pub struct TextResponse {
    text: String,
}

impl TextResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl std::fmt::Display for TextResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl ChatResponse for TextResponse {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Always answers with the same text.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    response: String,
}

impl FixedLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FixedLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(TextResponse::new(self.response.clone())))
    }
}

chat_only_provider!(FixedLLM);

/// Answers with fixed text and keeps every prompt it received.
#[derive(Debug, Clone)]
pub struct RecordingChatLLM {
    response: String,
    pub last_messages: Arc<Mutex<Vec<ChatMessage>>>,
    pub calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl RecordingChatLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            last_messages: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ChatProvider for RecordingChatLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        *self.last_messages.lock() = messages.to_vec();
        self.calls.lock().push(messages.to_vec());
        Ok(Box::new(TextResponse::new(self.response.clone())))
    }
}

chat_only_provider!(RecordingChatLLM);

/// Fails every call with a provider error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

chat_only_provider!(FailingLLM);

/// Plays back a fixed sequence of answers and errors, one per call.
///
/// Every prompt is recorded when the call starts; `with_delay` holds each
/// answer back so concurrent callers overlap.
#[derive(Debug, Clone)]
pub struct ScriptedLLM {
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    delay: Duration,
}

impl ScriptedLLM {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        self.prompts.lock().push(messages.to_vec());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(text)) => Ok(Box::new(TextResponse::new(text))),
            Some(Err(message)) => Err(LLMError::ProviderError(message)),
            None => Err(LLMError::ProviderError("script exhausted".to_string())),
        }
    }
}

chat_only_provider!(ScriptedLLM);

/// Answers after a fixed delay.
#[derive(Debug, Clone)]
pub struct SlowLLM {
    response: String,
    delay: Duration,
}

impl SlowLLM {
    pub fn new(response: impl Into<String>, delay: Duration) -> Self {
        Self {
            response: response.into(),
            delay,
        }
    }
}

#[async_trait]
impl ChatProvider for SlowLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        tokio::time::sleep(self.delay).await;
        Ok(Box::new(TextResponse::new(self.response.clone())))
    }
}

chat_only_provider!(SlowLLM);
